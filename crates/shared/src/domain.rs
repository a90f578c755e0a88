use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::timestamp;

macro_rules! key_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

key_newtype!(SessionKey);
key_newtype!(NodeKey);

pub const SESSION_ADMINISTRATOR: &str = "/Session/Administrator";
pub const USER_ADMINISTRATOR: &str = "/User/Administrator";

/// Backend-maintained click counters; read-only to the console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickCounters {
    pub total: Option<u64>,
    pub calendar: Option<u64>,
    pub video: Option<u64>,
}

/// Redirect fields merged onto a calendar session when a redirect exists for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectDetails {
    pub redirect_to: Option<String>,
    pub video_link: Option<String>,
    pub start_redirecting_minutes: Option<i64>,
    pub counters: ClickCounters,
}

/// One row of the sessions list: a calendar session plus its redirect, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub key: SessionKey,
    pub title: String,
    pub description: String,
    pub speakers: Vec<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub redirect: Option<RedirectDetails>,
}

impl Session {
    pub fn redirect_to(&self) -> Option<&str> {
        self.redirect.as_ref()?.redirect_to.as_deref()
    }

    pub fn video_link(&self) -> Option<&str> {
        self.redirect.as_ref()?.video_link.as_deref()
    }

    pub fn start_redirecting_minutes(&self) -> Option<i64> {
        self.redirect.as_ref()?.start_redirecting_minutes
    }

    pub fn counters(&self) -> ClickCounters {
        self.redirect
            .as_ref()
            .map(|redirect| redirect.counters)
            .unwrap_or_default()
    }

    pub fn speakers_display(&self) -> String {
        self.speakers.join(", ")
    }
}

/// A managed node domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(rename = "rowKey")]
    pub key: NodeKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub configured: bool,
    #[serde(default)]
    pub ssl_configured: bool,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}
