//! Create/edit form for a single redirect.

use std::sync::Arc;

use client_core::{ClientError, ConsoleApi};
use shared::{
    domain::SessionKey,
    protocol::{CalendarSession, CreateRedirectRequest, GeoStats, UpdateRedirectRequest},
};
use tracing::{debug, error, info, warn};

use crate::{url_check::is_valid_url, RefreshTarget};

pub const DEFAULT_START_REDIRECTING_MINUTES: i64 = -10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormVariant {
    /// Target and video URL only.
    Redirect,
    /// Also shows the calendar session and edits the activation offset.
    SessionRedirect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub label: String,
    pub longitude: f64,
    pub latitude: f64,
}

pub fn geo_markers(stats: &GeoStats) -> Vec<MapMarker> {
    stats
        .values()
        .map(|stat| MapMarker {
            label: format!("{}: {}", stat.city, stat.click_count),
            longitude: stat.longitude,
            latitude: stat.latitude,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Invalid input, still loading, or already closed; nothing was sent.
    NotReady,
    Saved,
    Failed,
}

pub struct RedirectForm {
    api: Arc<dyn ConsoleApi>,
    variant: FormVariant,
    key: Option<SessionKey>,
    redirect_to: String,
    video_link: String,
    start_redirecting_minutes: i64,
    session: Option<CalendarSession>,
    has_generated: bool,
    edit_mode: bool,
    loading: bool,
    error: bool,
    open: bool,
    stats_expanded: bool,
    markers: Option<Vec<MapMarker>>,
}

impl RedirectForm {
    pub fn new(api: Arc<dyn ConsoleApi>, variant: FormVariant, key: Option<SessionKey>) -> Self {
        Self {
            api,
            variant,
            key,
            redirect_to: String::new(),
            video_link: String::new(),
            start_redirecting_minutes: DEFAULT_START_REDIRECTING_MINUTES,
            session: None,
            has_generated: false,
            edit_mode: false,
            loading: false,
            error: false,
            open: true,
            stats_expanded: false,
            markers: None,
        }
    }

    /// Loads the existing redirect (and session details for the newer variant).
    /// A key with no redirect yet leaves the form in add mode for that key.
    pub async fn load(&mut self) {
        let Some(key) = self.key.clone() else {
            return;
        };
        self.loading = true;

        let (redirect, session) = match self.variant {
            FormVariant::Redirect => (self.api.get_redirect(&key).await, None),
            FormVariant::SessionRedirect => {
                let (redirect, session) =
                    futures::join!(self.api.get_redirect(&key), self.api.calendar_session(&key));
                (redirect, Some(session))
            }
        };

        match session {
            Some(Ok(session)) => self.session = Some(session),
            Some(Err(err)) => warn!(key = %key, "failed to load session details: {err}"),
            None => {}
        }

        match redirect {
            Ok(record) => {
                debug!(key = %key, "loaded redirect for editing");
                self.redirect_to = record.redirect_to.unwrap_or_default();
                self.video_link = record.video_link.unwrap_or_default();
                self.start_redirecting_minutes = record
                    .start_redirecting_minutes
                    .unwrap_or(DEFAULT_START_REDIRECTING_MINUTES);
                self.has_generated = true;
                self.edit_mode = true;
            }
            Err(err) if err.is_not_found() => {
                debug!(key = %key, "no redirect yet, form stays in add mode");
            }
            Err(err) => {
                error!(key = %key, "failed to load redirect: {err}");
                self.error = true;
            }
        }
        self.loading = false;
    }

    pub fn variant(&self) -> FormVariant {
        self.variant
    }

    pub fn key(&self) -> Option<&SessionKey> {
        self.key.as_ref()
    }

    pub fn heading(&self) -> &'static str {
        if self.loading {
            "Loading..."
        } else if self.edit_mode {
            "Edit a redirect"
        } else {
            "Add a redirect"
        }
    }

    pub fn redirect_to(&self) -> &str {
        &self.redirect_to
    }

    pub fn set_redirect_to(&mut self, value: impl Into<String>) {
        self.redirect_to = value.into();
    }

    pub fn video_link(&self) -> &str {
        &self.video_link
    }

    pub fn set_video_link(&mut self, value: impl Into<String>) {
        self.video_link = value.into();
    }

    pub fn start_redirecting_minutes(&self) -> i64 {
        self.start_redirecting_minutes
    }

    pub fn set_start_redirecting_minutes(&mut self, minutes: i64) {
        self.start_redirecting_minutes = minutes;
    }

    pub fn session(&self) -> Option<&CalendarSession> {
        self.session.as_ref()
    }

    pub fn is_edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn stats_expanded(&self) -> bool {
        self.stats_expanded
    }

    pub fn markers(&self) -> Option<&[MapMarker]> {
        self.markers.as_deref()
    }

    /// Target URL must be valid; the video URL is checked only when filled in.
    pub fn can_submit(&self) -> bool {
        is_valid_url(&self.redirect_to) && (self.video_link.is_empty() || is_valid_url(&self.video_link))
    }

    pub fn cancel(&mut self) {
        info!("redirect form cancelled");
        self.open = false;
    }

    /// Sends the create or update, then refreshes `parent` and closes.
    pub async fn submit<R>(&mut self, parent: &mut R) -> SubmitOutcome
    where
        R: RefreshTarget + ?Sized,
    {
        if !self.open || self.loading || !self.can_submit() {
            return SubmitOutcome::NotReady;
        }
        self.loading = true;
        self.error = false;

        match self.save().await {
            Ok(()) => {
                self.has_generated = true;
                self.loading = false;
                parent.refresh().await;
                self.open = false;
                SubmitOutcome::Saved
            }
            Err(err) => {
                error!("failed to save redirect: {err}");
                self.error = true;
                self.loading = false;
                SubmitOutcome::Failed
            }
        }
    }

    async fn save(&self) -> Result<(), ClientError> {
        match (&self.key, self.edit_mode) {
            (Some(key), true) => {
                let start_redirecting_minutes = match self.variant {
                    FormVariant::SessionRedirect => Some(self.start_redirecting_minutes),
                    FormVariant::Redirect => None,
                };
                info!(key = %key, "updating redirect");
                self.api
                    .update_redirect(
                        key,
                        &UpdateRedirectRequest {
                            redirect_to: self.redirect_to.clone(),
                            video_link: self.video_link.clone(),
                            start_redirecting_minutes,
                        },
                    )
                    .await
            }
            _ => {
                info!(key = ?self.key, "creating redirect");
                self.api
                    .create_redirect(&CreateRedirectRequest {
                        redirect_to: self.redirect_to.clone(),
                        video_link: self.video_link.clone(),
                        row_key: self.key.clone(),
                    })
                    .await
            }
        }
    }

    /// Expands or collapses the click map. Expanding fetches fresh geo stats;
    /// only available once the redirect exists.
    pub async fn toggle_stats(&mut self) {
        let Some(key) = self.key.clone().filter(|_| self.has_generated) else {
            return;
        };
        self.stats_expanded = !self.stats_expanded;
        if !self.stats_expanded {
            return;
        }

        match self.api.redirect_geo(&key).await {
            Ok(stats) => {
                debug!(key = %key, cities = stats.len(), "loaded geo stats");
                self.markers = Some(geo_markers(&stats));
            }
            Err(err) => warn!(key = %key, "failed to load geo stats: {err}"),
        }
    }
}

#[cfg(test)]
#[path = "tests/detail_form_tests.rs"]
mod tests;
