use std::{collections::HashMap, str::FromStr, sync::Arc};

use async_trait::async_trait;
use client_core::{ClientError, ConsoleApi};
use shared::{
    domain::{Session, SessionKey},
    protocol::{CalendarGroup, CurrentUser, RedirectRecord},
};
use tracing::{debug, error, info};

use crate::{
    detail_form::{FormVariant, RedirectForm},
    filter::apply_filter,
    selection::{dispatch_bulk_and_refresh, BulkOutcome, Selection},
    sort::{apply_sorting, dedup_rules, toggle_sort, SortRule, SortValue, Sortable},
    RefreshTarget, UnknownField,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionField {
    Key,
    Title,
    Speakers,
    RedirectTo,
    StartsAt,
    EndsAt,
    CalendarClickCount,
    ClickCount,
    VideoClickCount,
}

impl SessionField {
    pub const ALL: [SessionField; 9] = [
        Self::Key,
        Self::Title,
        Self::Speakers,
        Self::RedirectTo,
        Self::StartsAt,
        Self::EndsAt,
        Self::CalendarClickCount,
        Self::ClickCount,
        Self::VideoClickCount,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Key => "rowKey",
            Self::Title => "title",
            Self::Speakers => "speakers",
            Self::RedirectTo => "redirectTo",
            Self::StartsAt => "startsAt",
            Self::EndsAt => "endsAt",
            Self::CalendarClickCount => "calendarClickCount",
            Self::ClickCount => "clickCount",
            Self::VideoClickCount => "videoClickCount",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            Self::Key => "Sessionize ID",
            Self::Title => "Title",
            Self::Speakers => "Speaker(s)",
            Self::RedirectTo => "Redirect to",
            Self::StartsAt => "Start",
            Self::EndsAt => "End",
            Self::CalendarClickCount => "Calendar",
            Self::ClickCount => "Clicks",
            Self::VideoClickCount => "Video",
        }
    }
}

impl FromStr for SessionField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

impl Sortable for Session {
    type Field = SessionField;

    fn sort_value(&self, field: SessionField) -> SortValue<'_> {
        let counters = self.counters();
        match field {
            SessionField::Key => Some(self.key.as_str()).into(),
            SessionField::Title => Some(self.title.as_str()).into(),
            SessionField::Speakers => SortValue::Text(self.speakers_display().into()),
            SessionField::RedirectTo => self.redirect_to().into(),
            SessionField::StartsAt => self.starts_at.into(),
            SessionField::EndsAt => self.ends_at.into(),
            SessionField::CalendarClickCount => counters.calendar.into(),
            SessionField::ClickCount => counters.total.into(),
            SessionField::VideoClickCount => counters.video.into(),
        }
    }
}

/// Joins calendar sessions with redirect records on session id == redirect key.
/// The first redirect wins when keys repeat.
pub fn merge_sessions(redirects: &[RedirectRecord], groups: &[CalendarGroup]) -> Vec<Session> {
    let mut by_key: HashMap<&SessionKey, &RedirectRecord> = HashMap::with_capacity(redirects.len());
    for record in redirects {
        by_key.entry(&record.row_key).or_insert(record);
    }

    groups
        .iter()
        .flat_map(|group| group.sessions.iter())
        .map(|session| Session {
            key: session.id.clone(),
            title: session.title.clone(),
            description: session.description.clone().unwrap_or_default(),
            speakers: session.speaker_names(),
            starts_at: session.starts_at,
            ends_at: session.ends_at,
            redirect: by_key.get(&session.id).map(|record| record.details()),
        })
        .collect()
}

pub async fn fetch_sessions(api: &dyn ConsoleApi) -> Result<Vec<Session>, ClientError> {
    let (redirects, groups) = futures::try_join!(api.list_redirects(), api.calendar_sessions())?;
    Ok(merge_sessions(&redirects, &groups))
}

/// Soft-failing load: no user or any fetch error yields an empty list.
pub async fn load_sessions(api: &dyn ConsoleApi, user: Option<&CurrentUser>) -> Vec<Session> {
    if user.is_none() {
        debug!("user not logged in, sessions list left empty");
        return Vec::new();
    }

    match fetch_sessions(api).await {
        Ok(sessions) => sessions,
        Err(err) => {
            error!("failed to load sessions: {err}");
            Vec::new()
        }
    }
}

pub struct SessionsView {
    api: Arc<dyn ConsoleApi>,
    user: Option<CurrentUser>,
    loading: bool,
    source: Vec<Session>,
    sorting: Vec<SortRule<SessionField>>,
    filter_text: String,
    selection: Selection<SessionKey>,
}

impl SessionsView {
    pub fn new(api: Arc<dyn ConsoleApi>, user: Option<CurrentUser>) -> Self {
        Self {
            api,
            user,
            loading: true,
            source: Vec::new(),
            sorting: vec![SortRule::ascending(SessionField::StartsAt)],
            filter_text: String::new(),
            selection: Selection::default(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn source(&self) -> &[Session] {
        &self.source
    }

    pub fn sorting(&self) -> &[SortRule<SessionField>] {
        &self.sorting
    }

    pub fn set_sorting(&mut self, rules: Vec<SortRule<SessionField>>) {
        self.sorting = dedup_rules(rules);
    }

    pub fn column_click(&mut self, field: SessionField) {
        debug!(column = field.name(), "sessions column clicked");
        self.sorting = toggle_sort(&self.sorting, field);
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter_text = text.into();
    }

    /// Displayed rows: sorted first, then filtered.
    pub fn rows(&self) -> Vec<&Session> {
        apply_filter(apply_sorting(&self.source, &self.sorting), &self.filter_text)
    }

    pub fn selection(&self) -> &Selection<SessionKey> {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection<SessionKey> {
        &mut self.selection
    }

    /// Toggles the displayed row at `index`; out-of-range indices are ignored.
    pub fn toggle_row(&mut self, index: usize) {
        let key = self.rows().get(index).map(|session| session.key.clone());
        if let Some(key) = key {
            self.selection.toggle(key);
        }
    }

    pub async fn reload(&mut self) {
        self.loading = true;
        self.source = load_sessions(self.api.as_ref(), self.user.as_ref()).await;
        self.selection.clear();
        self.loading = false;
        info!(rows = self.source.len(), "sessions loaded");
    }

    pub async fn delete_selected(&mut self) -> Option<BulkOutcome> {
        let keys = self.selection.keys();
        let api = Arc::clone(&self.api);
        dispatch_bulk_and_refresh(self, "delete_redirect", keys, move |key| {
            let api = Arc::clone(&api);
            async move { api.delete_redirect(&key).await }
        })
        .await
    }

    pub async fn restore_selected(&mut self) -> Option<BulkOutcome> {
        let keys = self.selection.keys();
        let api = Arc::clone(&self.api);
        dispatch_bulk_and_refresh(self, "restore_redirect", keys, move |key| {
            let api = Arc::clone(&api);
            async move { api.restore_redirect(&key).await }
        })
        .await
    }

    /// Row double-click opens the editor for that session; `None` opens an empty form.
    pub fn open_editor(&self, key: Option<SessionKey>) -> RedirectForm {
        RedirectForm::new(Arc::clone(&self.api), FormVariant::SessionRedirect, key)
    }
}

#[async_trait]
impl RefreshTarget for SessionsView {
    async fn refresh(&mut self) {
        self.reload().await;
    }
}

#[cfg(test)]
#[path = "tests/sessions_tests.rs"]
mod tests;
