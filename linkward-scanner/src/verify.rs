// Reachability probes for external links

use crate::error::Result;
use crate::link::Status;
use reqwest::{Client, Method, header};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Same ceiling a browser fetch applies
const MAX_REDIRECTS: usize = 20;

#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Deadline applied to each probe independently
    pub timeout: Duration,
    pub follow_redirects: bool,
    pub user_agent: String,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            follow_redirects: true,
            user_agent: format!(
                "linkward/{} (https://github.com/trapdoorsec/linkward)",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeMethod {
    Head,
    Get,
}

impl ProbeMethod {
    fn as_method(&self) -> Method {
        match self {
            ProbeMethod::Head => Method::HEAD,
            ProbeMethod::Get => Method::GET,
        }
    }
}

/// Origin of a `NetworkError` outcome. Kept for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Both probe methods failed against the target
    Network,
    /// The call carrying the request never reached the verifier
    Transport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    pub url: String,
    pub status: Status,
    /// Methods tried, in order
    pub methods: Vec<ProbeMethod>,
    pub elapsed: Duration,
    #[serde(skip)]
    pub fault: Option<Fault>,
}

impl VerificationOutcome {
    pub fn failed(url: impl Into<String>, fault: Fault) -> Self {
        Self {
            url: url.into(),
            status: Status::NetworkError,
            methods: Vec::new(),
            elapsed: Duration::ZERO,
            fault: Some(fault),
        }
    }
}

enum ProbeError {
    TimedOut,
    /// The server refused the lightweight method
    Rejected(u16),
    Failed(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::TimedOut => write!(f, "timed out"),
            ProbeError::Rejected(code) => write!(f, "method rejected with {}", code),
            ProbeError::Failed(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Clone)]
pub struct Verifier {
    client: Client,
    timeout: Duration,
}

impl Verifier {
    pub fn new() -> Result<Self> {
        Self::with_config(VerifierConfig::default())
    }

    pub fn with_config(config: VerifierConfig) -> Result<Self> {
        let redirect = if config.follow_redirects {
            reqwest::redirect::Policy::limited(MAX_REDIRECTS)
        } else {
            reqwest::redirect::Policy::none()
        };

        let client = Client::builder()
            .user_agent(config.user_agent)
            .cookie_store(true)
            .redirect(redirect)
            .pool_max_idle_per_host(50) // Connection pooling
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check one address: HEAD first, GET once if HEAD fails for any reason
    /// other than running out of time.
    pub async fn probe(&self, url: &str) -> VerificationOutcome {
        let start = Instant::now();
        let mut methods = vec![ProbeMethod::Head];

        let status = match self.attempt(ProbeMethod::Head, url).await {
            Ok(code) => Status::Http(code),
            Err(ProbeError::TimedOut) => {
                debug!("HEAD {} timed out after {:?}", url, self.timeout);
                Status::Timeout
            }
            Err(err) => {
                debug!("HEAD {} failed ({}), retrying with GET", url, err);
                methods.push(ProbeMethod::Get);
                match self.attempt(ProbeMethod::Get, url).await {
                    Ok(code) => Status::Http(code),
                    Err(err) => {
                        debug!("GET {} failed ({})", url, err);
                        Status::NetworkError
                    }
                }
            }
        };

        debug!("{} -> {:?} via {:?}", url, status, methods);
        VerificationOutcome {
            url: url.to_string(),
            status,
            methods,
            elapsed: start.elapsed(),
            fault: (status == Status::NetworkError).then_some(Fault::Network),
        }
    }

    async fn attempt(&self, method: ProbeMethod, url: &str) -> std::result::Result<u16, ProbeError> {
        let request = self
            .client
            .request(method.as_method(), url)
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::PRAGMA, "no-cache");

        match tokio::time::timeout(self.timeout, request.send()).await {
            Err(_) => Err(ProbeError::TimedOut),
            Ok(Err(e)) if e.is_timeout() => Err(ProbeError::TimedOut),
            Ok(Err(e)) => Err(ProbeError::Failed(e.to_string())),
            Ok(Ok(response)) => {
                let code = response.status().as_u16();
                if method == ProbeMethod::Head && matches!(code, 405 | 501) {
                    Err(ProbeError::Rejected(code))
                } else {
                    Ok(code)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn fast_verifier() -> Verifier {
        Verifier::with_config(VerifierConfig {
            timeout: Duration::from_millis(300),
            ..VerifierConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_head_success() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let outcome = fast_verifier().probe(&format!("{}/ok", server.uri())).await;
        assert_eq!(outcome.status, Status::Http(200));
        assert_eq!(outcome.methods, vec![ProbeMethod::Head]);
        assert_eq!(outcome.fault, None);
    }

    #[tokio::test]
    async fn test_http_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = fast_verifier().probe(&format!("{}/missing", server.uri())).await;
        assert_eq!(outcome.status, Status::Http(404));
        assert_eq!(outcome.methods, vec![ProbeMethod::Head]);
    }

    #[tokio::test]
    async fn test_rejected_head_falls_back_to_get() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/no-head"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/no-head"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = fast_verifier().probe(&format!("{}/no-head", server.uri())).await;
        assert_eq!(outcome.status, Status::Http(200));
        assert_eq!(outcome.methods, vec![ProbeMethod::Head, ProbeMethod::Get]);
    }

    #[tokio::test]
    async fn test_timeout_does_not_fall_back() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = fast_verifier().probe(&format!("{}/slow", server.uri())).await;
        assert_eq!(outcome.status, Status::Timeout);
        assert_eq!(outcome.methods, vec![ProbeMethod::Head]);
        assert_eq!(outcome.fault, None);
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        // Nothing listens on port 1
        let outcome = fast_verifier().probe("http://127.0.0.1:1/").await;
        assert_eq!(outcome.status, Status::NetworkError);
        assert_eq!(outcome.methods, vec![ProbeMethod::Head, ProbeMethod::Get]);
        assert_eq!(outcome.fault, Some(Fault::Network));
    }

    #[tokio::test]
    async fn test_redirects_reported_when_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", format!("{}/new", server.uri())),
            )
            .mount(&server)
            .await;

        let verifier = Verifier::with_config(VerifierConfig {
            timeout: Duration::from_millis(300),
            follow_redirects: false,
            ..VerifierConfig::default()
        })
        .unwrap();

        let outcome = verifier.probe(&format!("{}/old", server.uri())).await;
        assert_eq!(outcome.status, Status::Http(301));
    }
}
