use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use snafu::{ResultExt, Snafu};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{
    config::{Config, Credential, DEFAULT_BASE_URL, DEFAULT_MODEL},
    generation::{ContentBuilder, GenerateContentRequest, GenerationResponse},
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("failed to build HTTP client"))]
    BuildHttpClient { source: reqwest::Error },

    #[snafu(display("failed to construct request URL for '{model}'"))]
    InvalidUrl {
        source: url::ParseError,
        model: String,
    },

    #[snafu(display("failed to perform request to '{endpoint}'"))]
    PerformRequest {
        source: reqwest::Error,
        endpoint: String,
    },

    #[snafu(display("API key rejected; code {code}; description: {description}"))]
    Unauthorized { code: u16, description: String },

    #[snafu(display("rate limit or quota exceeded; description: {description}"))]
    RateLimited { description: String },

    #[snafu(display("bad response from server; code {code}; description: {description}"))]
    BadResponse { code: u16, description: String },

    #[snafu(display("failed to read response body from '{endpoint}'"))]
    ReadBody {
        source: reqwest::Error,
        endpoint: String,
    },

    #[snafu(display("failed to decode response from '{endpoint}'"))]
    Decode {
        source: serde_json::Error,
        endpoint: String,
    },
}

/// Sends a generation request and returns the decoded response.
///
/// [`GeminiClient`] is the HTTP implementation; anything else implementing
/// this trait can stand in for it through [`Gemini::with_transport`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, Error>;
}

/// HTTP client for the Gemini REST API
#[derive(Debug)]
pub struct GeminiClient {
    http_client: Client,
    credential: Credential,
    model: String,
    base_url: Url,
}

impl GeminiClient {
    /// Create a new client with custom base URL
    pub fn new(credential: Credential, model: String, base_url: Url) -> Result<Self, Error> {
        let http_client = Client::builder().build().context(BuildHttpClientSnafu)?;
        Ok(Self {
            http_client,
            credential,
            model,
            base_url,
        })
    }

    /// Endpoint URL without the key, safe to log and put in errors
    fn endpoint(&self, method: &str) -> Result<Url, Error> {
        self.base_url
            .join(&format!("{}:{method}", self.model))
            .context(InvalidUrlSnafu {
                model: self.model.clone(),
            })
    }

    fn build_url(&self, method: &str) -> Result<Url, Error> {
        let mut url = self.endpoint(method)?;
        url.query_pairs_mut()
            .append_pair("key", self.credential.expose());
        Ok(url)
    }
}

#[async_trait]
impl Transport for GeminiClient {
    #[instrument(skip_all)]
    async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        let endpoint = self.endpoint("generateContent")?.to_string();
        let url = self.build_url("generateContent")?;

        let response = self
            .http_client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context(PerformRequestSnafu {
                endpoint: endpoint.clone(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context(ReadBodySnafu {
                endpoint: endpoint.clone(),
            })?;

        if !status.is_success() {
            warn!(model = %self.model, status = status.as_u16(), "request rejected");
            return Err(status_error(status, body));
        }

        debug!(
            model = %self.model,
            status = status.as_u16(),
            bytes = body.len(),
            "response received"
        );
        serde_json::from_str(&body).context(DecodeSnafu { endpoint })
    }
}

/// Maps a non-success status to the matching error kind.
fn status_error(status: StatusCode, description: String) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized {
            code: status.as_u16(),
            description,
        },
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited { description },
        _ => Error::BadResponse {
            code: status.as_u16(),
            description,
        },
    }
}

/// Client for the Gemini API
#[derive(Clone)]
pub struct Gemini {
    transport: Arc<dyn Transport>,
}

impl Gemini {
    /// Create a new client with the specified API key and the default model
    pub fn new(credential: Credential) -> Result<Self, Error> {
        let base_url = Url::parse(DEFAULT_BASE_URL).context(InvalidUrlSnafu {
            model: DEFAULT_MODEL,
        })?;
        Self::with_model_and_base_url(credential, DEFAULT_MODEL.to_string(), base_url)
    }

    /// Create a new client with the specified API key, model, and base URL
    pub fn with_model_and_base_url(
        credential: Credential,
        model: String,
        base_url: Url,
    ) -> Result<Self, Error> {
        let client = GeminiClient::new(credential, model, base_url)?;
        Ok(Self::with_transport(client))
    }

    /// Create a new client from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Self::with_model_and_base_url(
            config.credential.clone(),
            config.model.clone(),
            config.base_url.clone(),
        )
    }

    /// Create a client over any transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Start building a content generation request
    pub fn generate_content(&self) -> ContentBuilder {
        ContentBuilder::new(self.transport.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use display_error_chain::DisplayErrorChain;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        sync::oneshot,
    };

    const KEY: &str = "test-key-123";

    /// Serves exactly one HTTP exchange and hands back the raw request.
    async fn serve_once(status_line: &str, body: &str) -> (Url, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let read = socket.read(&mut chunk).await.unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..read]);
                if request_complete(&request) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
        });

        let base_url = Url::parse(&format!("http://{addr}/v1beta/")).unwrap();
        (base_url, rx)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(head_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..head_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= head_end + 4 + content_length
    }

    fn client(base_url: Url) -> Gemini {
        Gemini::with_model_and_base_url(
            Credential::new(KEY).unwrap(),
            "models/gemini-test".to_string(),
            base_url,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn posts_prompt_and_decodes_answer() {
        let (base_url, request) = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"parts":[{"text":"42"}],"role":"model"},"finishReason":"STOP"}]}"#,
        )
        .await;

        let response = client(base_url)
            .generate_content()
            .with_user_message("What is the best movie of 2022?")
            .execute()
            .await
            .unwrap();
        assert_eq!(response.text(), "42");

        let raw = request.await.unwrap();
        assert!(raw.starts_with(&format!(
            "POST /v1beta/models/gemini-test:generateContent?key={KEY} HTTP/1.1"
        )));
        assert!(raw.contains(r#""text":"What is the best movie of 2022?""#));
        assert!(raw.contains(r#""role":"user""#));
    }

    #[tokio::test]
    async fn unauthorized_status_maps_to_unauthorized() {
        let (base_url, _request) = serve_once(
            "403 Forbidden",
            r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#,
        )
        .await;

        let error = client(base_url)
            .generate_content()
            .with_user_message("hi")
            .execute()
            .await
            .unwrap_err();
        match error {
            Error::Unauthorized { code, description } => {
                assert_eq!(code, 403);
                assert!(description.contains("API key not valid"));
            }
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn too_many_requests_maps_to_rate_limited() {
        let (base_url, _request) = serve_once(
            "429 Too Many Requests",
            r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .await;

        let error = client(base_url)
            .generate_content()
            .with_user_message("hi")
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(error, Error::RateLimited { .. }), "{error:?}");
    }

    #[tokio::test]
    async fn other_failures_map_to_bad_response() {
        let (base_url, _request) = serve_once("500 Internal Server Error", "{}").await;

        let error = client(base_url)
            .generate_content()
            .with_user_message("hi")
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(error, Error::BadResponse { code: 500, .. }), "{error:?}");
    }

    #[tokio::test]
    async fn malformed_body_maps_to_decode() {
        let (base_url, _request) = serve_once("200 OK", "<html>oops</html>").await;

        let error = client(base_url)
            .generate_content()
            .with_user_message("hi")
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Decode { .. }), "{error:?}");
    }

    #[tokio::test]
    async fn connection_failure_maps_to_perform_request_without_leaking_key() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base_url = Url::parse(&format!("http://{addr}/v1beta/")).unwrap();
        let error = client(base_url)
            .generate_content()
            .with_user_message("hi")
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(error, Error::PerformRequest { .. }), "{error:?}");

        let rendered = DisplayErrorChain::new(&error).to_string();
        assert!(!rendered.contains(KEY), "{rendered}");
    }

    #[test]
    fn default_client_targets_public_endpoint() {
        let client = GeminiClient::new(
            Credential::new(KEY).unwrap(),
            DEFAULT_MODEL.to_string(),
            Url::parse(DEFAULT_BASE_URL).unwrap(),
        )
        .unwrap();
        assert_eq!(
            client.endpoint("generateContent").unwrap().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert!(Gemini::new(Credential::new(KEY).unwrap()).is_ok());
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new()),
            Error::Unauthorized { code: 401, .. }
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, String::new()),
            Error::RateLimited { .. }
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, String::new()),
            Error::BadResponse { code: 400, .. }
        ));
    }
}
