use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ClickCounters, NodeKey, RedirectDetails, SessionKey, SESSION_ADMINISTRATOR,
    USER_ADMINISTRATOR,
};

/// Redirect record as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectRecord {
    pub row_key: SessionKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_redirecting_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_click_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_click_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycled: Option<bool>,
}

impl RedirectRecord {
    pub fn details(&self) -> RedirectDetails {
        RedirectDetails {
            redirect_to: self.redirect_to.clone(),
            video_link: self.video_link.clone(),
            start_redirecting_minutes: self.start_redirecting_minutes,
            counters: ClickCounters {
                total: self.click_count,
                calendar: self.calendar_click_count,
                video: self.video_click_count,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSpeaker {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

/// One entry of the calendar feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSession {
    pub id: SessionKey,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub speakers: Vec<CalendarSpeaker>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub ends_at: Option<DateTime<Utc>>,
}

impl CalendarSession {
    pub fn speaker_names(&self) -> Vec<String> {
        self.speakers
            .iter()
            .map(|speaker| speaker.name.clone())
            .collect()
    }
}

/// The calendar feed is an array of groups, each holding sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default)]
    pub sessions: Vec<CalendarSession>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoStat {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub click_count: u64,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

/// `GET /_api/v1/redirect/{key}/geo` payload, keyed by city.
pub type GeoStats = BTreeMap<String, GeoStat>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl CurrentUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn is_administrator(&self) -> bool {
        self.has_permission(SESSION_ADMINISTRATOR) || self.has_permission(USER_ADMINISTRATOR)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRedirectRequest {
    pub redirect_to: String,
    pub video_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_key: Option<SessionKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRedirectRequest {
    pub redirect_to: String,
    pub video_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_redirecting_minutes: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreRedirectRequest {
    pub recycled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeRequest {
    pub row_key: NodeKey,
}

/// Backend timestamps arrive either as RFC 3339 or as offset-less ISO-8601
/// (calendar feed); the latter are read as UTC. Unparseable values become `None`.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }
}
