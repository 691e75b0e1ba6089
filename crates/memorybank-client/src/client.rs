//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use url::Url;

use crate::api::{AuthApi, GraphApi, NotesApi};
use crate::error::{Error, Result, error_message};
use memorybank_core::session::SessionContext;

/// Default timeout for requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header that keeps tunnelling proxies from serving an interstitial page.
const SKIP_BROWSER_WARNING: HeaderName = HeaderName::from_static("ngrok-skip-browser-warning");

/// Memory Bank API client.
///
/// Every request carries the bearer token of the current session, if any.
/// A 401 response clears the session through [`SessionContext::on_unauthorized`]
/// before the call returns [`Error::Unauthorized`].
///
/// # Example
///
/// ```no_run
/// use memorybank_client::MemoryBankClient;
///
/// # async fn example() -> memorybank_client::Result<()> {
/// let client = MemoryBankClient::builder()
///     .base_url("http://localhost:8000")
///     .build()?;
///
/// let notes = client.notes().list().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MemoryBankClient {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    session: Option<Arc<dyn SessionContext>>,
}

impl MemoryBankClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn session(&self) -> Option<&Arc<dyn SessionContext>> {
        self.inner.session.as_ref()
    }

    pub fn notes(&self) -> NotesApi {
        NotesApi::new(self.clone())
    }

    pub fn graph(&self) -> GraphApi {
        GraphApi::new(self.clone())
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a URL from path segments. Each segment is percent-encoded.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Base URL cannot take a path: {}", self.inner.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        log::debug!("{} {}", method, url.path());
        let mut request = self
            .inner
            .http
            .request(method, url)
            .timeout(self.inner.timeout);
        if let Some(token) = self.inner.session.as_ref().and_then(|s| s.access_token()) {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        request
    }

    /// Send a request, applying the 401 and error-status policy.
    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            log::warn!("401 from {}", response.url().path());
            if let Some(session) = &self.inner.session {
                session.on_unauthorized();
            }
            return Err(Error::Unauthorized);
        }

        let path = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        let message = error_message(status.as_u16(), &body);
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("{}: {}", path, message)));
        }
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub(crate) async fn get<T: serde::de::DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.url(segments)?;
        let response = self.send(self.request(Method::GET, url)).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn get_bytes(&self, segments: &[&str]) -> Result<Vec<u8>> {
        let url = self.url(segments)?;
        let response = self.send(self.request(Method::GET, url)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub(crate) async fn post<T, B>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        let response = self.send(self.request(Method::POST, url).json(body)).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn put<T, B>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        let response = self.send(self.request(Method::PUT, url).json(body)).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn delete<T: serde::de::DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.url(segments)?;
        let response = self.send(self.request(Method::DELETE, url)).await?;
        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for MemoryBankClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBankClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .field("session", &self.inner.session.is_some())
            .finish()
    }
}

/// Builder for creating a [`MemoryBankClient`].
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
    session: Option<Arc<dyn SessionContext>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            session: None,
        }
    }

    /// Set the API base URL, e.g. `https://api.example.com/`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Session supplying the bearer token and receiving 401 notifications.
    pub fn session(mut self, session: Arc<dyn SessionContext>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn build(self) -> Result<MemoryBankClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;
        let base_url = Url::parse(&base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("Base URL cannot take a path: {}", base_url)));
        }

        let mut headers = HeaderMap::new();
        headers.insert(SKIP_BROWSER_WARNING, HeaderValue::from_static("true"));

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("memorybank-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        Ok(MemoryBankClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout: self.timeout,
                session: self.session,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
