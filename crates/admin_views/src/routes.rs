/// Console destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Sessions,
    Nodes,
    NotFound(String),
}

impl Route {
    /// Query strings, fragments and a trailing slash are ignored; matching is
    /// case-insensitive.
    pub fn parse(path: &str) -> Self {
        let trimmed = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        match trimmed.to_ascii_lowercase().as_str() {
            "" => Self::Home,
            "/sessions" => Self::Sessions,
            "/nodes" => Self::Nodes,
            _ => Self::NotFound(path.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Home => "/",
            Self::Sessions => "/sessions",
            Self::Nodes => "/nodes",
            Self::NotFound(path) => path,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Sessions => "Sessions",
            Self::Nodes => "Nodes",
            Self::NotFound(_) => "Not found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_paths() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/Sessions/"), Route::Sessions);
        assert_eq!(Route::parse("/nodes?page=2"), Route::Nodes);
    }

    #[test]
    fn anything_else_is_not_found() {
        let route = Route::parse("/settings");
        assert_eq!(route, Route::NotFound("/settings".into()));
        assert_eq!(route.path(), "/settings");
        assert_eq!(route.title(), "Not found");
    }
}
