use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::domain::{ApiError, Navigator};
use crate::interface_adapters::protocol::ErrorBody;
use crate::interface_adapters::session::SessionStore;

// What the gateway does with the session when the backend answers 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnauthorizedPolicy {
    // Drop the token and send the user to the login entry point.
    #[default]
    RedirectToLogin,
    // Drop the token but let the caller decide what to show.
    ClearSession,
    // Leave the session alone; only the error is returned.
    Propagate,
}

pub enum RequestBody {
    Json(Value),
    // Content type (with boundary) is left to reqwest.
    Multipart(Form),
}

// Per-call knobs. Defaults: credential attached, redirect on 401.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub require_auth: bool,
    pub on_unauthorized: UnauthorizedPolicy,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            require_auth: true,
            on_unauthorized: UnauthorizedPolicy::default(),
            headers: Vec::new(),
            query: Vec::new(),
        }
    }
}

impl RequestOptions {
    // Options for endpoints that never take a credential.
    pub fn public() -> Self {
        Self {
            require_auth: false,
            ..Self::default()
        }
    }

    pub fn unauthorized(mut self, policy: UnauthorizedPolicy) -> Self {
        self.on_unauthorized = policy;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }
}

// One outgoing call: method, path relative to the base URL, optional body, options.
// Caller-supplied identifiers go in `segments` and are percent-encoded onto the path.
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub segments: Vec<String>,
    pub body: Option<RequestBody>,
    pub options: RequestOptions,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            segments: Vec::new(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|error| ApiError::InvalidRequest {
            message: error.to_string(),
        })?;
        self.body = Some(RequestBody::Json(value));
        Ok(self)
    }

    pub fn multipart(mut self, form: Form) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub base_url: Url,
    // Where the navigator is sent after a forced logout.
    pub login_path: String,
    // None keeps requests unbounded.
    pub timeout: Option<Duration>,
}

// Single chokepoint for backend calls: credentials, error shape, 401 handling.
pub struct ApiGateway {
    http: Client,
    base_url: String,
    login_path: String,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl ApiGateway {
    pub fn new(
        settings: GatewaySettings,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: settings.base_url.as_str().trim_end_matches('/').to_string(),
            login_path: settings.login_path,
            session,
            navigator,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    fn url_for(
        &self,
        path: &str,
        segments: &[String],
        query: &[(String, String)],
    ) -> Result<Url, ApiError> {
        let joined = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut url = Url::parse(&joined).map_err(|error| ApiError::InvalidRequest {
            message: format!("{joined}: {error}"),
        })?;
        if !segments.is_empty() {
            url.path_segments_mut()
                .map_err(|()| ApiError::InvalidRequest {
                    message: format!("{joined}: cannot carry path segments"),
                })?
                .pop_if_empty()
                .extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }

    #[tracing::instrument(
        name = "api_request",
        skip_all,
        fields(method = %request.method, path = %request.path)
    )]
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let ApiRequest {
            method,
            path,
            segments,
            body,
            options,
        } = request;
        let url = self.url_for(&path, &segments, &options.query)?;
        let mut builder = self.http.request(method, url);

        // A missing token is not pre-empted; the backend decides.
        if options.require_auth {
            match self.session.token() {
                Some(token) => builder = builder.bearer_auth(token),
                None => tracing::debug!("no session token; sending without credential"),
            }
        }

        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match body {
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::Multipart(form)) => builder.multipart(form),
            None => builder,
        };

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            // The status line arrived, so this is an HTTP error even if the body is lost.
            let message = match response.bytes().await {
                Ok(bytes) => serde_json::from_slice::<ErrorBody>(&bytes)
                    .ok()
                    .and_then(|body| body.message),
                Err(error) => {
                    tracing::warn!(%error, "error body unreadable");
                    None
                }
            };
            let error = ApiError::from_status(status, message);
            tracing::info!(status = status.as_u16(), %error, "request rejected");

            if status == StatusCode::UNAUTHORIZED {
                self.handle_unauthorized(options.on_unauthorized);
            }
            return Err(error);
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        tracing::debug!(status = status.as_u16(), "request succeeded");
        decode(status, &bytes)
    }

    fn handle_unauthorized(&self, policy: UnauthorizedPolicy) {
        if policy == UnauthorizedPolicy::Propagate {
            return;
        }

        if let Err(error) = self.session.remove_token() {
            tracing::error!(%error, "failed to clear rejected session token");
        }

        if policy == UnauthorizedPolicy::RedirectToLogin {
            tracing::info!(login = %self.login_path, "session rejected; redirecting to login");
            self.navigator.redirect(&self.login_path);
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.send(ApiRequest::new(Method::GET, path).options(options))
            .await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::new(Method::POST, path).json(body)?.options(options))
            .await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::new(Method::PUT, path).json(body)?.options(options))
            .await
    }

    pub async fn patch<B, T>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::new(Method::PATCH, path).json(body)?.options(options))
            .await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.send(ApiRequest::new(Method::DELETE, path).options(options))
            .await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.send(
            ApiRequest::new(Method::POST, path)
                .multipart(form)
                .options(options),
        )
        .await
    }
}

fn transport_error(error: reqwest::Error) -> ApiError {
    if error.is_builder() {
        return ApiError::InvalidRequest {
            message: error.to_string(),
        };
    }
    tracing::warn!(%error, "no response from backend");
    ApiError::NetworkUnreachable
}

// Bodies are returned as-is; an empty body reads as JSON null.
fn decode<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> Result<T, ApiError> {
    let parsed = if bytes.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_slice(bytes)
    };

    parsed.map_err(|error| ApiError::MalformedResponse {
        status,
        message: error.to_string(),
    })
}
