//! In-memory `ConsoleApi` used by the view-model tests.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use client_core::{ClientError, ConsoleApi};
use shared::{
    domain::{Node, NodeKey, SessionKey},
    error::{ApiException, ErrorCode},
    protocol::{
        CalendarGroup, CalendarSession, CalendarSpeaker, CreateNodeRequest,
        CreateRedirectRequest, CurrentUser, GeoStats, RedirectRecord, UpdateRedirectRequest,
    },
};

#[derive(Default)]
pub(crate) struct FakeApi {
    pub user: Option<CurrentUser>,
    pub redirects: Vec<RedirectRecord>,
    pub calendar: Vec<CalendarGroup>,
    pub nodes: Vec<Node>,
    pub geo: GeoStats,
    pub fail_redirects: bool,
    pub fail_feed: bool,
    pub fail_nodes: bool,
    pub fail_calendar_detail: bool,
    pub fail_keys: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
    pub created: Mutex<Vec<CreateRedirectRequest>>,
    pub updated: Mutex<Vec<(SessionKey, UpdateRedirectRequest)>>,
    pub created_nodes: Mutex<Vec<CreateNodeRequest>>,
}

impl FakeApi {
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls
            .lock()
            .expect("calls")
            .iter()
            .filter(|recorded| recorded.starts_with(call))
            .count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().expect("calls").push(call.into());
    }

    fn mutation(&self, call: String, key: &str) -> Result<(), ClientError> {
        self.record(call);
        if self.fail_keys.contains(key) {
            return Err(failure(ErrorCode::Internal));
        }
        Ok(())
    }

    fn list<T: Clone>(
        &self,
        call: &str,
        fail: bool,
        items: &[T],
    ) -> Result<Vec<T>, ClientError> {
        self.record(call);
        if fail {
            return Err(failure(ErrorCode::Internal));
        }
        Ok(items.to_vec())
    }
}

pub(crate) fn failure(code: ErrorCode) -> ClientError {
    ApiException::new(code, "scripted failure").into()
}

pub(crate) fn admin() -> CurrentUser {
    CurrentUser {
        login_name: Some("ops@example.com".into()),
        display_name: Some("Ops".into()),
        permissions: vec!["/Session/Administrator".into()],
    }
}

pub(crate) fn calendar_session(id: &str, title: &str, speakers: &[&str]) -> CalendarSession {
    CalendarSession {
        id: SessionKey::from(id),
        title: title.to_string(),
        description: Some(format!("About {title}")),
        speakers: speakers
            .iter()
            .map(|name| CalendarSpeaker {
                id: None,
                name: name.to_string(),
            })
            .collect(),
        starts_at: None,
        ends_at: None,
    }
}

pub(crate) fn redirect(key: &str, target: &str) -> RedirectRecord {
    RedirectRecord {
        row_key: SessionKey::from(key),
        redirect_to: Some(target.to_string()),
        video_link: Some(format!("{target}/video")),
        start_redirecting_minutes: Some(-5),
        click_count: Some(10),
        calendar_click_count: Some(4),
        video_click_count: Some(2),
        ..RedirectRecord::default()
    }
}

pub(crate) fn node(key: &str, account: &str) -> Node {
    Node {
        key: NodeKey::from(key),
        partition_key: None,
        account: account.to_string(),
        configured: true,
        ssl_configured: false,
        timestamp: None,
    }
}

#[async_trait]
impl ConsoleApi for FakeApi {
    async fn current_user(&self) -> Result<CurrentUser, ClientError> {
        self.record("GET user/me");
        self.user.clone().ok_or_else(|| failure(ErrorCode::Unauthorized))
    }

    async fn list_redirects(&self) -> Result<Vec<RedirectRecord>, ClientError> {
        self.list("GET redirects", self.fail_redirects, &self.redirects)
    }

    async fn get_redirect(&self, key: &SessionKey) -> Result<RedirectRecord, ClientError> {
        self.record(format!("GET redirect {key}"));
        self.redirects
            .iter()
            .find(|record| &record.row_key == key)
            .cloned()
            .ok_or_else(|| failure(ErrorCode::NotFound))
    }

    async fn create_redirect(&self, request: &CreateRedirectRequest) -> Result<(), ClientError> {
        let key = request
            .row_key
            .as_ref()
            .map(|key| key.to_string())
            .unwrap_or_default();
        self.mutation("POST redirect".to_string(), &key)?;
        self.created.lock().expect("created").push(request.clone());
        Ok(())
    }

    async fn update_redirect(
        &self,
        key: &SessionKey,
        request: &UpdateRedirectRequest,
    ) -> Result<(), ClientError> {
        self.mutation(format!("PATCH redirect {key}"), key.as_str())?;
        self.updated
            .lock()
            .expect("updated")
            .push((key.clone(), request.clone()));
        Ok(())
    }

    async fn delete_redirect(&self, key: &SessionKey) -> Result<(), ClientError> {
        self.mutation(format!("DELETE redirect {key}"), key.as_str())
    }

    async fn restore_redirect(&self, key: &SessionKey) -> Result<(), ClientError> {
        self.mutation(format!("RESTORE redirect {key}"), key.as_str())
    }

    async fn redirect_geo(&self, key: &SessionKey) -> Result<GeoStats, ClientError> {
        self.record(format!("GET geo {key}"));
        Ok(self.geo.clone())
    }

    async fn calendar_sessions(&self) -> Result<Vec<CalendarGroup>, ClientError> {
        self.list("GET feed", self.fail_feed, &self.calendar)
    }

    async fn calendar_session(&self, key: &SessionKey) -> Result<CalendarSession, ClientError> {
        self.record(format!("GET calendar {key}"));
        if self.fail_calendar_detail {
            return Err(failure(ErrorCode::Internal));
        }
        self.calendar
            .iter()
            .flat_map(|group| group.sessions.iter())
            .find(|session| &session.id == key)
            .cloned()
            .ok_or_else(|| failure(ErrorCode::NotFound))
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, ClientError> {
        self.list("GET nodes", self.fail_nodes, &self.nodes)
    }

    async fn create_node(&self, request: &CreateNodeRequest) -> Result<(), ClientError> {
        self.mutation("POST node".to_string(), request.row_key.as_str())?;
        self.created_nodes
            .lock()
            .expect("created nodes")
            .push(request.clone());
        Ok(())
    }

    async fn delete_node(&self, key: &NodeKey) -> Result<(), ClientError> {
        self.mutation(format!("DELETE node {key}"), key.as_str())
    }
}
