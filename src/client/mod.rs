//! Authenticated HTTP client with bearer injection, single-flight refresh
//! and retry-once semantics.

pub mod body;
pub mod query;
pub mod response;
pub mod transport;

pub use body::{FilePart, RequestBody, UploadForm};
pub use query::QueryParams;
pub use response::ApiResponse;
pub use transport::{ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse};

use std::sync::Arc;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::auth::{
    AuthResponse, CredentialBundle, FileStorage, ListenerId, LoginRequest, LogoutRequest,
    RefreshCoordinator, RefreshFailure, RefreshOutcome, RefreshTokenRequest, RegisterRequest,
    SessionEvents, SessionExpired, TokenStore,
};
use crate::config::ClientConfig;
use crate::error::{status_message, ClientError, Result};
use response::{decode_body, error_from_response};

/// Description of one logical API call.
///
/// # Example
/// ```
/// use jobmatch_client::client::{ApiRequest, QueryParams};
///
/// let request = ApiRequest::get("/jobs")
///     .with_query(&QueryParams::new().push("page", 0).push("size", 20));
/// assert_eq!(request.path, "/jobs?page=0&size=20");
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Relative to the configured base URL.
    pub path: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = RequestBody::json(body)?;
        Ok(self)
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_upload(self, form: UploadForm) -> Self {
        self.with_body(RequestBody::Multipart(form))
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_query(mut self, query: &QueryParams) -> Self {
        self.path = query.apply(&self.path);
        self
    }
}

/// Per-call state carried through the send/refresh/retry cycle.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request: ApiRequest,
    /// Set once the request has been replayed after a token refresh.
    pub retried: bool,
}

impl RequestContext {
    pub fn new(request: ApiRequest) -> Self {
        Self {
            request,
            retried: false,
        }
    }
}

/// Authenticated JobMatch API client.
///
/// Cheap to clone; clones share the token store, the refresh guard and the
/// session listeners.
///
/// # Example
/// ```no_run
/// use jobmatch_client::auth::LoginRequest;
/// use jobmatch_client::client::ApiClient;
/// use jobmatch_client::config::ClientConfig;
///
/// # async fn example() -> jobmatch_client::error::Result<()> {
/// let client = ApiClient::new(ClientConfig::from_env()?)?;
/// client.on_session_expired(|event| eprintln!("please log in again: {}", event.reason));
/// client.login(&LoginRequest::new("ada@example.com", "hunter22")).await?;
/// let profile: serde_json::Value = client.get("/me/profile").await?;
/// println!("{profile}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    store: TokenStore,
    events: SessionEvents,
    refresh: RefreshCoordinator,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.inner.config)
            .field("store", &self.inner.store)
            .field("events", &self.inner.events)
            .field("refresh", &self.inner.refresh)
            .finish()
    }
}

impl ApiClient {
    /// Client with file-backed credentials at `config.token_path` and the reqwest transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout)?);
        let store = TokenStore::new(
            Arc::new(FileStorage::new(config.token_path.clone())),
            config.refresh_skew,
        );
        Ok(Self::with_parts(config, transport, store))
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Assemble a client from explicit collaborators.
    pub fn with_parts(config: ClientConfig, transport: Arc<dyn Transport>, store: TokenStore) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                store,
                events: SessionEvents::new(),
                refresh: RefreshCoordinator::new(),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &TokenStore {
        &self.inner.store
    }

    pub fn session_events(&self) -> &SessionEvents {
        &self.inner.events
    }

    /// Register a listener for session expiry; see [`SessionEvents`].
    pub fn on_session_expired<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SessionExpired) + Send + Sync + 'static,
    {
        self.inner.events.register(listener)
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.store.get().is_some()
    }

    // -----------------------------------------------------------------------
    // Generic calls
    // -----------------------------------------------------------------------

    /// Untyped entry point: method, relative path, optional JSON body and headers.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        headers: Option<HeaderMap>,
    ) -> Result<serde_json::Value> {
        let mut request = ApiRequest::new(method, path);
        if let Some(body) = body {
            request = request.with_body(RequestBody::Json(body));
        }
        if let Some(headers) = headers {
            request = request.with_headers(headers);
        }
        self.send(request).await
    }

    /// Send and decode the body as JSON (`null` when empty).
    pub async fn send(&self, request: ApiRequest) -> Result<serde_json::Value> {
        let response = self.execute(RequestContext::new(request), None).await?;
        decode_body(&response)
    }

    /// Like [`ApiClient::send`], aborting when `cancel` fires. A cancelled call
    /// never starts its retry.
    pub async fn send_with_cancel(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value> {
        let response = self.execute(RequestContext::new(request), Some(cancel)).await?;
        decode_body(&response)
    }

    /// Send and deserialize the body into `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let value = self.send(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Send and return the raw successful response.
    pub async fn send_raw(&self, request: ApiRequest) -> Result<TransportResponse> {
        self.execute(RequestContext::new(request), None).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(ApiRequest::put(path).json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(ApiRequest::delete(path)).await
    }

    /// Multipart POST; the bearer token is attached like any other call.
    pub async fn upload_file<T: DeserializeOwned>(&self, path: &str, form: UploadForm) -> Result<T> {
        self.send_json(ApiRequest::post(path).with_upload(form)).await
    }

    /// GET returning the raw body bytes (file downloads).
    pub async fn download(&self, path: &str) -> Result<Vec<u8>> {
        Ok(self.send_raw(ApiRequest::get(path)).await?.body)
    }

    // -----------------------------------------------------------------------
    // Auth endpoints
    // -----------------------------------------------------------------------

    /// Log in and store the returned credential bundle.
    ///
    /// Nothing is stored unless the response carries both tokens.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse> {
        let path = self.inner.config.endpoints.login.clone();
        let body = self.send(ApiRequest::post(path).json(credentials)?).await?;
        let response = AuthResponse::from_body(body)?;
        let bundle = response.to_bundle()?;
        self.inner.store.set(&bundle);
        tracing::info!(expires_in = bundle.expires_in_secs(), "logged in");
        Ok(response)
    }

    /// Create an account. Never stores tokens and never enters the refresh flow.
    pub async fn register(&self, registration: &RegisterRequest) -> Result<serde_json::Value> {
        let path = self.inner.config.endpoints.register.clone();
        let request = ApiRequest::post(path).json(registration)?;
        self.send(request).await.map_err(|err| match err {
            ClientError::Http {
                status: 409,
                message,
                code,
                errors,
            } if message == status_message(409) => ClientError::Http {
                status: 409,
                message: "Email is already registered".to_string(),
                code,
                errors,
            },
            other => other,
        })
    }

    /// Refresh now, joining any refresh already in flight.
    pub async fn refresh(&self) -> Result<CredentialBundle> {
        self.inner
            .refresh()
            .await
            .map_err(|failure| ClientError::Authentication(failure.reason))
    }

    /// Best-effort server logout, then clear local credentials. Never fails.
    pub async fn logout(&self) {
        if let Some(bundle) = self.inner.store.get() {
            let payload = LogoutRequest {
                access_token: bundle.access_token().to_string(),
                refresh_token: bundle.refresh_token().to_string(),
            };
            let path = self.inner.config.endpoints.logout.clone();
            let result = match ApiRequest::post(path).json(&payload) {
                Ok(request) => self.send(request).await.map(|_| ()),
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                tracing::warn!(error = %err, "logout request failed, clearing local credentials anyway");
            }
        }
        self.inner.store.clear();
        tracing::info!("logged out");
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    async fn execute(
        &self,
        mut ctx: RequestContext,
        cancel: Option<&CancellationToken>,
    ) -> Result<TransportResponse> {
        let endpoints = &self.inner.config.endpoints;
        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(ClientError::Cancelled);
            }

            let token = self.token_for(&ctx, cancel).await?;
            let response = self.send_once(&ctx, token.as_deref(), cancel).await?;
            let status = response.status;
            tracing::debug!(
                method = %ctx.request.method,
                path = %ctx.request.path,
                status = status.as_u16(),
                retried = ctx.retried,
                "response received"
            );

            if status == StatusCode::UNAUTHORIZED && !endpoints.skips_refresh(&ctx.request.path) {
                if ctx.retried {
                    return Err(self
                        .inner
                        .expire_session("request still unauthorized after token refresh"));
                }
                self.recover_unauthorized(token.as_deref(), cancel).await?;
                if cancel.is_some_and(CancellationToken::is_cancelled) {
                    return Err(ClientError::Cancelled);
                }
                ctx.retried = true;
                continue;
            }

            if status.is_success() {
                return Ok(response);
            }
            return Err(error_from_response(&response));
        }
    }

    /// Token to attach, read from the store at send time.
    async fn token_for(
        &self,
        ctx: &RequestContext,
        cancel: Option<&CancellationToken>,
    ) -> Result<Option<String>> {
        let endpoints = &self.inner.config.endpoints;
        if endpoints.is_anonymous(&ctx.request.path) {
            return Ok(None);
        }
        let Some(bundle) = self.inner.store.get() else {
            return Ok(None);
        };
        if ctx.retried || endpoints.skips_refresh(&ctx.request.path) {
            return Ok(Some(bundle.access_token().to_string()));
        }

        let now = Utc::now();
        if bundle.is_expired_at(now) {
            tracing::debug!(path = %ctx.request.path, "access token expired, refreshing before send");
            self.await_refresh(cancel).await?;
            return Ok(self
                .inner
                .store
                .get()
                .map(|fresh| fresh.access_token().to_string()));
        }
        if bundle.is_near_expiry_at(now, self.inner.store.skew()) {
            self.inner.spawn_proactive_refresh();
        }
        Ok(Some(bundle.access_token().to_string()))
    }

    /// Handle a 401: refresh unless another task already rotated the token.
    async fn recover_unauthorized(
        &self,
        sent_token: Option<&str>,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        if let Some(current) = self.inner.store.get() {
            if Some(current.access_token()) != sent_token {
                tracing::debug!("token rotated while request was in flight, retrying without refresh");
                return Ok(());
            }
        }
        self.await_refresh(cancel).await.map(|_| ())
    }

    async fn await_refresh(&self, cancel: Option<&CancellationToken>) -> Result<CredentialBundle> {
        let refresh = self.inner.refresh();
        let outcome = match cancel {
            Some(cancel) => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                outcome = refresh => outcome,
            },
            None => refresh.await,
        };
        outcome.map_err(|failure| ClientError::Authentication(failure.reason))
    }

    async fn send_once(
        &self,
        ctx: &RequestContext,
        token: Option<&str>,
        cancel: Option<&CancellationToken>,
    ) -> Result<TransportResponse> {
        let mut headers = ctx.request.headers.clone();
        headers
            .entry(ACCEPT)
            .or_insert(HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                ClientError::Authentication("stored access token is not a valid header value".to_string())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let request = TransportRequest {
            method: ctx.request.method.clone(),
            url: self.inner.config.url(&ctx.request.path),
            headers,
            body: ctx.request.body.clone(),
        };
        let send = self.inner.transport.send(request);
        let result = match cancel {
            Some(cancel) => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                result = send => result,
            },
            None => send.await,
        };
        result.map_err(|err| {
            tracing::debug!(path = %ctx.request.path, error = %err, "transport failure");
            ClientError::from(err)
        })
    }
}

impl ClientInner {
    /// Join or lead the single-flight refresh.
    async fn refresh(self: &Arc<Self>) -> RefreshOutcome {
        let inner = Arc::clone(self);
        self.refresh.run(move || async move { inner.perform_refresh().await }).await
    }

    /// Leader-only body of the refresh.
    async fn perform_refresh(&self) -> RefreshOutcome {
        // Nothing stored means there is no session left to expire.
        let Some(current) = self.store.get() else {
            tracing::debug!("refresh requested without stored credentials");
            return Err(RefreshFailure::new("no refresh token available"));
        };

        let payload = RefreshTokenRequest {
            refresh_token: current.refresh_token().to_string(),
        };
        let body = match RequestBody::json(&payload) {
            Ok(body) => body,
            Err(err) => return Err(self.fail_refresh(&format!("could not encode refresh request: {err}"))),
        };
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let request = TransportRequest {
            method: Method::POST,
            url: self.config.url(&self.config.endpoints.refresh),
            headers,
            body,
        };

        tracing::debug!("refreshing access token");
        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => return Err(self.fail_refresh(&format!("refresh request failed: {err}"))),
        };
        if !response.status.is_success() {
            return Err(self.fail_refresh(&format!(
                "refresh rejected with status {}",
                response.status.as_u16()
            )));
        }

        let bundle = decode_body(&response)
            .and_then(AuthResponse::from_body)
            .and_then(|auth| auth.to_bundle_keeping(Some(current.refresh_token())));
        match bundle {
            Ok(bundle) => {
                self.store.set(&bundle);
                tracing::info!(expires_in = bundle.expires_in_secs(), "access token refreshed");
                Ok(bundle)
            }
            Err(err) => Err(self.fail_refresh(&format!("invalid refresh response: {err}"))),
        }
    }

    fn fail_refresh(&self, reason: &str) -> RefreshFailure {
        tracing::warn!(reason, "token refresh failed");
        self.store.clear();
        self.events.emit(reason);
        RefreshFailure::new(reason)
    }

    /// Terminal auth failure: clear credentials, notify, and build the error.
    fn expire_session(&self, reason: &str) -> ClientError {
        tracing::warn!(reason, "session expired");
        self.store.clear();
        self.events.emit(reason);
        ClientError::Authentication(reason.to_string())
    }

    fn spawn_proactive_refresh(self: &Arc<Self>) {
        if self.refresh.is_in_flight() {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        tracing::debug!("access token near expiry, scheduling background refresh");
        let inner = Arc::clone(self);
        handle.spawn(async move {
            if let Err(failure) = inner.refresh().await {
                tracing::debug!(reason = %failure, "background refresh failed");
            }
        });
    }
}
