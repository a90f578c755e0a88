use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Node, NodeKey, SessionKey},
    error::{ApiException, ErrorCode},
    protocol::{
        CalendarGroup, CalendarSession, CreateNodeRequest, CreateRedirectRequest, CurrentUser,
        GeoStats, RedirectRecord, RestoreRedirectRequest, UpdateRedirectRequest,
    },
};
use tracing::{debug, warn};
use url::Url;

pub mod error;

pub use error::ClientError;

const API_PREFIX: [&str; 2] = ["_api", "v1"];
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend operations the console views depend on.
#[async_trait]
pub trait ConsoleApi: Send + Sync {
    async fn current_user(&self) -> Result<CurrentUser, ClientError>;
    async fn list_redirects(&self) -> Result<Vec<RedirectRecord>, ClientError>;
    async fn get_redirect(&self, key: &SessionKey) -> Result<RedirectRecord, ClientError>;
    async fn create_redirect(&self, request: &CreateRedirectRequest) -> Result<(), ClientError>;
    async fn update_redirect(
        &self,
        key: &SessionKey,
        request: &UpdateRedirectRequest,
    ) -> Result<(), ClientError>;
    async fn delete_redirect(&self, key: &SessionKey) -> Result<(), ClientError>;
    async fn restore_redirect(&self, key: &SessionKey) -> Result<(), ClientError>;
    async fn redirect_geo(&self, key: &SessionKey) -> Result<GeoStats, ClientError>;
    async fn calendar_sessions(&self) -> Result<Vec<CalendarGroup>, ClientError>;
    async fn calendar_session(&self, key: &SessionKey) -> Result<CalendarSession, ClientError>;
    async fn list_nodes(&self) -> Result<Vec<Node>, ClientError>;
    async fn create_node(&self, request: &CreateNodeRequest) -> Result<(), ClientError>;
    async fn delete_node(&self, key: &NodeKey) -> Result<(), ClientError>;
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub api_base_url: String,
    /// Origin of the calendar feed; defaults to the API origin.
    pub calendar_base_url: Option<String>,
    pub access_token: Option<String>,
    pub request_timeout: Duration,
}

impl ClientOptions {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            calendar_base_url: None,
            access_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub struct HttpConsoleClient {
    http: Client,
    api_base: Url,
    calendar_base: Url,
    access_token: Option<String>,
}

impl HttpConsoleClient {
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        let api_base = parse_base(&options.api_base_url)?;
        let calendar_base = match options.calendar_base_url.as_deref() {
            Some(raw) => parse_base(raw)?,
            None => api_base.clone(),
        };
        let http = Client::builder().timeout(options.request_timeout).build()?;
        Ok(Self {
            http,
            api_base,
            calendar_base,
            access_token: options.access_token.filter(|token| !token.trim().is_empty()),
        })
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut all = API_PREFIX.to_vec();
        all.extend_from_slice(segments);
        endpoint(&self.api_base, &all)
    }

    /// Requests under `/_api` carry the bearer token when one is configured.
    fn authorized(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "console api request");
        let request = self.http.request(method, url);
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn anonymous(&self, url: Url) -> RequestBuilder {
        debug!(method = "GET", %url, "calendar request");
        self.http.get(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let url = self.api_url(segments)?;
        send_json(self.authorized(Method::GET, url.clone()), &url).await
    }

    async fn send_body<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<(), ClientError> {
        let url = self.api_url(segments)?;
        send_empty(self.authorized(method, url.clone()).json(body), &url).await
    }
}

#[async_trait]
impl ConsoleApi for HttpConsoleClient {
    async fn current_user(&self) -> Result<CurrentUser, ClientError> {
        self.get_json(&["user", "me"]).await
    }

    async fn list_redirects(&self) -> Result<Vec<RedirectRecord>, ClientError> {
        self.get_json(&["redirects"]).await
    }

    async fn get_redirect(&self, key: &SessionKey) -> Result<RedirectRecord, ClientError> {
        self.get_json(&["redirect", key.as_str()]).await
    }

    async fn create_redirect(&self, request: &CreateRedirectRequest) -> Result<(), ClientError> {
        self.send_body(Method::POST, &["redirect"], request).await
    }

    async fn update_redirect(
        &self,
        key: &SessionKey,
        request: &UpdateRedirectRequest,
    ) -> Result<(), ClientError> {
        self.send_body(Method::PATCH, &["redirect", key.as_str()], request)
            .await
    }

    async fn delete_redirect(&self, key: &SessionKey) -> Result<(), ClientError> {
        let url = self.api_url(&["redirect", key.as_str()])?;
        send_empty(self.authorized(Method::DELETE, url.clone()), &url).await
    }

    async fn restore_redirect(&self, key: &SessionKey) -> Result<(), ClientError> {
        self.send_body(
            Method::PATCH,
            &["redirect", key.as_str()],
            &RestoreRedirectRequest { recycled: false },
        )
        .await
    }

    async fn redirect_geo(&self, key: &SessionKey) -> Result<GeoStats, ClientError> {
        let stats: Option<GeoStats> = self.get_json(&["redirect", key.as_str(), "geo"]).await?;
        Ok(stats.unwrap_or_default())
    }

    async fn calendar_sessions(&self) -> Result<Vec<CalendarGroup>, ClientError> {
        let url = endpoint(&self.calendar_base, &["data", "sessions"])?;
        send_json(self.anonymous(url.clone()), &url).await
    }

    async fn calendar_session(&self, key: &SessionKey) -> Result<CalendarSession, ClientError> {
        let mut url = endpoint(&self.calendar_base, &["calendar", "session", key.as_str()])?;
        url.set_query(Some("noTrack"));
        send_json(self.anonymous(url.clone()), &url).await
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, ClientError> {
        self.get_json(&["Nodes"]).await
    }

    async fn create_node(&self, request: &CreateNodeRequest) -> Result<(), ClientError> {
        self.send_body(Method::POST, &["Nodes"], request).await
    }

    // Nodes are removed through the redirect collection; there is no node delete route.
    async fn delete_node(&self, key: &NodeKey) -> Result<(), ClientError> {
        let url = self.api_url(&["redirect", key.as_str()])?;
        send_empty(self.authorized(Method::DELETE, url.clone()), &url).await
    }
}

fn parse_base(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw.trim()).map_err(|source| ClientError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ClientError::CannotBeABase(raw.to_string()));
    }
    Ok(url)
}

/// Appends percent-encoded path segments to `base`, keeping any base path prefix.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| ClientError::CannotBeABase(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn checked(request: RequestBuilder, url: &Url) -> Result<reqwest::Response, ClientError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), %url, "console api returned an error status");
    Err(ApiException::new(
        ErrorCode::from_status(status.as_u16()),
        format!("{url} returned {status}: {}", body.trim()),
    )
    .into())
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder, url: &Url) -> Result<T, ClientError> {
    let body = checked(request, url).await?.text().await?;
    serde_json::from_str(&body).map_err(|source| ClientError::Decode {
        url: url.to_string(),
        source,
    })
}

async fn send_empty(request: RequestBuilder, url: &Url) -> Result<(), ClientError> {
    checked(request, url).await?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
