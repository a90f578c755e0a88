use shared::domain::Session;

/// Case-insensitive substring match over title, description, key and speakers.
/// An empty filter matches every session.
pub fn session_matches(session: &Session, filter_text: &str) -> bool {
    if filter_text.is_empty() {
        return true;
    }

    let haystack = format!(
        "{} {} {} {}",
        session.title,
        session.description,
        session.key,
        session.speakers_display()
    )
    .to_lowercase();
    haystack.contains(&filter_text.to_lowercase())
}

pub fn apply_filter<'a>(rows: Vec<&'a Session>, filter_text: &str) -> Vec<&'a Session> {
    if filter_text.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|session| session_matches(session, filter_text))
        .collect()
}

#[cfg(test)]
mod tests {
    use shared::domain::SessionKey;

    use super::*;

    fn session(key: &str, title: &str, speakers: &[&str]) -> Session {
        Session {
            key: SessionKey::from(key),
            title: title.to_string(),
            description: "Deep dive into Teams live events".to_string(),
            speakers: speakers.iter().map(|s| s.to_string()).collect(),
            starts_at: None,
            ends_at: None,
            redirect: None,
        }
    }

    #[test]
    fn empty_filter_keeps_rows_unchanged() {
        let a = session("2", "Beta", &[]);
        let b = session("1", "Alpha", &[]);
        let rows = vec![&a, &b];
        let filtered = apply_filter(rows.clone(), "");
        assert_eq!(filtered, rows);
    }

    #[test]
    fn matches_each_field_case_insensitively() {
        let s = session("SES-42", "Power Apps Basics", &["Ada Lovelace", "Alan Turing"]);
        assert!(session_matches(&s, "power apps"));
        assert!(session_matches(&s, "TEAMS LIVE"));
        assert!(session_matches(&s, "ses-42"));
        assert!(session_matches(&s, "lovelace, alan"));
        assert!(!session_matches(&s, "grace hopper"));
    }

    #[test]
    fn filter_preserves_relative_order() {
        let a = session("1", "Intro to Rust", &[]);
        let b = session("2", "Intro to Go", &[]);
        let c = session("3", "Rust async", &[]);
        let filtered = apply_filter(vec![&c, &b, &a], "rust");
        let keys = filtered.iter().map(|s| s.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["3", "1"]);
    }
}
