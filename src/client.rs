//! Transport client and error types.
//!
//! [`ApiClient`] owns the base URL, the credential and the underlying HTTP
//! client. Its capabilities are split into three traits so resources can
//! ask only for what they use and tests can supply in-memory transports:
//!
//! - [`Gettable`]: `GET` and `DELETE`
//! - [`Postable`]: JSON `POST`, streamed or not, and raw-bytes `POST`
//! - [`FormPostable`]: multipart `POST`

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use std::collections::HashMap;
use std::path::PathBuf;
use std::pin::pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::form::FormData;
use crate::http::{add_extra_headers, build_http_client};
use crate::model::{ApiErrorResponse, Params};
use crate::options::{ClientOptions, SecretString};
use crate::sse::FrameResponseExt;

const ROUTE_PREFIX: &str = "/v1/";
const CONTEXT_LENGTH_EXCEEDED: &str = "context_length_exceeded";

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("API error (HTTP {status}): {body}")]
    Remote { status: StatusCode, body: String },

    #[error("Context length exceeded (HTTP {status}): {body}")]
    ContextLengthExceeded { status: StatusCode, body: String },

    #[error("Stream interrupted: {0}")]
    Stream(String),

    #[error("Stream closed before the [DONE] sentinel")]
    StreamTruncated,

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("File error for {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Classify a non-success response.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let code = serde_json::from_str::<ApiErrorResponse>(&body)
            .ok()
            .and_then(|resp| resp.error.code);

        if code.as_deref() == Some(CONTEXT_LENGTH_EXCEEDED) {
            ClientError::ContextLengthExceeded { status, body }
        } else {
            ClientError::Remote { status, body }
        }
    }

    /// HTTP status of a remote rejection.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Remote { status, .. }
            | ClientError::ContextLengthExceeded { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw body of a remote rejection.
    pub fn body(&self) -> Option<&str> {
        match self {
            ClientError::Remote { body, .. } | ClientError::ContextLengthExceeded { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }

    pub fn is_context_length_exceeded(&self) -> bool {
        matches!(self, ClientError::ContextLengthExceeded { .. })
    }
}

/// Callback receiving each raw JSON frame of a streamed response.
///
/// Returning an error stops reading and propagates the error to the caller.
pub type FrameHandler<'a> = dyn FnMut(&str) -> Result<(), ClientError> + Send + 'a;

/// Transport capability: `GET` and `DELETE` requests.
#[async_trait]
pub trait Gettable: Send + Sync {
    /// `GET` the route and return the raw body.
    async fn get(&self, route: &str) -> Result<String, ClientError>;

    /// `DELETE` the route and return the raw body.
    async fn delete(&self, route: &str) -> Result<String, ClientError>;
}

/// Transport capability: JSON `POST` requests.
#[async_trait]
pub trait Postable: Send + Sync {
    /// `POST` a JSON body and return the raw response body.
    async fn post(&self, route: &str, body: &Params) -> Result<String, ClientError>;

    /// `POST` a JSON body and hand every frame of the streamed response to
    /// `on_frame`, in arrival order. No aggregate is returned.
    async fn post_streaming(
        &self,
        route: &str,
        body: &Params,
        on_frame: &mut FrameHandler<'_>,
    ) -> Result<(), ClientError>;

    /// `POST` a JSON body and return the response as raw bytes.
    async fn post_raw(&self, route: &str, body: &Params) -> Result<Bytes, ClientError>;
}

/// Transport capability: multipart form `POST` requests.
#[async_trait]
pub trait FormPostable: Send + Sync {
    /// `POST` a multipart form and return the raw body.
    async fn post_form_multipart(&self, route: &str, form: FormData)
        -> Result<String, ClientError>;
}

/// HTTP transport bound to one credential and base URL.
///
/// Cheap to clone; clones share the connection pool.
///
/// # Example
/// ```no_run
/// use openai_session::client::{ApiClient, Gettable};
///
/// # async fn run() -> Result<(), openai_session::ClientError> {
/// let client = ApiClient::new("sk-...")?;
/// let models = client.get("/v1/models").await?;
/// println!("{}", models);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    extra_headers: Arc<Option<HashMap<String, String>>>,
}

impl ApiClient {
    /// Create a client for the default endpoint.
    pub fn new(api_key: impl Into<SecretString>) -> Result<Self, ClientError> {
        Self::with_options(ClientOptions::new(api_key))
    }

    /// Create a client from explicit options.
    pub fn with_options(options: ClientOptions) -> Result<Self, ClientError> {
        let base_url = Url::parse(&options.base_url).map_err(|e| {
            ClientError::Config(format!("invalid base URL {:?}: {}", options.base_url, e))
        })?;
        if base_url.cannot_be_a_base() || base_url.host().is_none() {
            return Err(ClientError::Config(format!(
                "base URL {:?} has no host",
                options.base_url
            )));
        }

        let root = base_url.path().trim_end_matches('/');
        if !root.is_empty() && root != ROUTE_PREFIX.trim_end_matches('/') {
            return Err(ClientError::Config(format!(
                "base URL {:?} must be the host root or end in /v1",
                options.base_url
            )));
        }

        let http = build_http_client(&options)?;

        Ok(Self {
            http,
            base_url,
            api_key: options.api_key,
            extra_headers: Arc::new(options.extra_headers),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a `/v1/...` route against the base URL.
    ///
    /// The result always stays on the configured origin.
    pub fn url_for(&self, route: &str) -> Result<Url, ClientError> {
        if !route.starts_with(ROUTE_PREFIX) {
            return Err(ClientError::Precondition(format!(
                "route {:?} must start with {}",
                route, ROUTE_PREFIX
            )));
        }

        let url = self
            .base_url
            .join(route)
            .map_err(|e| ClientError::Precondition(format!("invalid route {:?}: {}", route, e)))?;

        if url.origin() != self.base_url.origin() || !url.path().starts_with(ROUTE_PREFIX) {
            return Err(ClientError::Precondition(format!(
                "route {:?} escapes the API root",
                route
            )));
        }
        Ok(url)
    }

    /// Request with the bearer header and any configured extra headers.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "Sending request");

        let req = add_extra_headers(self.http.request(method, url), &self.extra_headers);
        req.header(
            AUTHORIZATION,
            format!("Bearer {}", self.api_key.expose_secret()),
        )
    }

    /// Same as [`request`](Self::request), declaring a JSON body.
    fn json_request(&self, method: Method, route: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.url_for(route)?;
        Ok(self
            .request(method, url)
            .header(CONTENT_TYPE, "application/json"))
    }

    /// Fail on non-success status, otherwise hand back the response.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        warn!(status = status.as_u16(), "Request failed");
        let body = response.text().await?;
        Err(ClientError::from_status(status, body))
    }

    async fn unwrap_response(response: reqwest::Response) -> Result<String, ClientError> {
        let response = Self::check_status(response).await?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Gettable for ApiClient {
    async fn get(&self, route: &str) -> Result<String, ClientError> {
        let response = self.json_request(Method::GET, route)?.send().await?;
        Self::unwrap_response(response).await
    }

    async fn delete(&self, route: &str) -> Result<String, ClientError> {
        let response = self.json_request(Method::DELETE, route)?.send().await?;
        Self::unwrap_response(response).await
    }
}

#[async_trait]
impl Postable for ApiClient {
    async fn post(&self, route: &str, body: &Params) -> Result<String, ClientError> {
        let response = self
            .json_request(Method::POST, route)?
            .json(body)
            .send()
            .await?;
        Self::unwrap_response(response).await
    }

    async fn post_streaming(
        &self,
        route: &str,
        body: &Params,
        on_frame: &mut FrameHandler<'_>,
    ) -> Result<(), ClientError> {
        let response = self
            .json_request(Method::POST, route)?
            .json(body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let mut frames = pin!(response.frames());
        let mut delivered = 0usize;
        while let Some(frame) = frames.next().await {
            on_frame(&frame?)?;
            delivered += 1;
        }

        debug!(frames = delivered, "Stream complete");
        Ok(())
    }

    async fn post_raw(&self, route: &str, body: &Params) -> Result<Bytes, ClientError> {
        let response = self
            .json_request(Method::POST, route)?
            .json(body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl FormPostable for ApiClient {
    async fn post_form_multipart(
        &self,
        route: &str,
        form: FormData,
    ) -> Result<String, ClientError> {
        let url = self.url_for(route)?;
        let form = form.into_multipart().await?;

        let response = self.request(Method::POST, url).multipart(form).send().await?;
        Self::unwrap_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_options(ClientOptions::new("sk-123").with_base_url(base.to_string()))
            .unwrap()
    }

    #[test]
    fn test_url_for_joins_onto_base() {
        let client = client("https://api.openai.com/v1");
        assert_eq!(
            client.url_for("/v1/chat/completions").unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            client.url_for("/v1/files/file-1/content").unwrap().as_str(),
            "https://api.openai.com/v1/files/file-1/content"
        );
    }

    #[test]
    fn test_url_for_keeps_port() {
        let client = client("http://127.0.0.1:8080/v1");
        assert_eq!(
            client.url_for("/v1/models").unwrap().as_str(),
            "http://127.0.0.1:8080/v1/models"
        );
    }

    #[test]
    fn test_url_for_rejects_foreign_routes() {
        let client = client("https://api.openai.com/v1");
        assert!(matches!(
            client.url_for("https://evil.example.com/v1/models"),
            Err(ClientError::Precondition(_))
        ));
        assert!(matches!(
            client.url_for("//evil.example.com/v1/models"),
            Err(ClientError::Precondition(_))
        ));
        assert!(matches!(
            client.url_for("/v1/../admin"),
            Err(ClientError::Precondition(_))
        ));
        assert!(matches!(
            client.url_for("models"),
            Err(ClientError::Precondition(_))
        ));
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let result =
            ApiClient::with_options(ClientOptions::new("sk").with_base_url("not a url".into()));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_base_url_path_must_be_api_root() {
        for base in [
            "https://proxy.example/openai/v1",
            "https://proxy.example/v2",
            "https://proxy.example/v1/models",
        ] {
            let result =
                ApiClient::with_options(ClientOptions::new("sk").with_base_url(base.to_string()));
            assert!(matches!(result, Err(ClientError::Config(_))), "{}", base);
        }

        for base in ["https://proxy.example", "https://proxy.example/v1/"] {
            assert_eq!(
                client(base).url_for("/v1/models").unwrap().as_str(),
                "https://proxy.example/v1/models"
            );
        }
    }

    #[test]
    fn test_context_length_is_classified() {
        let body = r#"{"error":{"message":"too long","type":"invalid_request_error","param":"messages","code":"context_length_exceeded"}}"#;
        let err = ClientError::from_status(StatusCode::BAD_REQUEST, body.to_string());
        assert!(err.is_context_length_exceeded());
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(err.body(), Some(body));
    }

    #[test]
    fn test_other_errors_are_remote() {
        let err = ClientError::from_status(StatusCode::UNAUTHORIZED, "nope".to_string());
        assert!(matches!(
            &err,
            ClientError::Remote { status, body } if *status == StatusCode::UNAUTHORIZED && body == "nope"
        ));
        assert!(!err.is_context_length_exceeded());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = client("https://api.openai.com/v1");
        assert!(!format!("{:?}", client).contains("sk-123"));
    }
}
