use client_core::ConsoleApi;
use shared::protocol::CurrentUser;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Granted(CurrentUser),
    Denied { login_name: Option<String> },
}

impl AccessDecision {
    pub fn from_user(user: Option<CurrentUser>) -> Self {
        match user {
            Some(user) if user.is_administrator() => Self::Granted(user),
            Some(user) => Self::Denied {
                login_name: user.login_name,
            },
            None => Self::Denied { login_name: None },
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        match self {
            Self::Granted(user) => Some(user),
            Self::Denied { .. } => None,
        }
    }

    /// Text shown instead of the console when access is denied.
    pub fn denial_message(&self) -> Option<String> {
        match self {
            Self::Granted(_) => None,
            Self::Denied {
                login_name: Some(login),
            } => Some(format!(
                "{login} does not have access to this console. Ask an administrator for the Session Administrator role."
            )),
            Self::Denied { login_name: None } => {
                Some("You are not signed in or have no access to this console.".to_string())
            }
        }
    }
}

/// Fetches the current user and applies the administrator check.
/// A failed lookup counts as no user.
pub async fn check_access(api: &dyn ConsoleApi) -> AccessDecision {
    let user = match api.current_user().await {
        Ok(user) => Some(user),
        Err(err) => {
            warn!("failed to fetch current user: {err}");
            None
        }
    };

    let decision = AccessDecision::from_user(user);
    match &decision {
        AccessDecision::Granted(user) => info!(login = ?user.login_name, "console access granted"),
        AccessDecision::Denied { login_name } => info!(login = ?login_name, "console access denied"),
    }
    decision
}
