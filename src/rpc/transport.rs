//! One HTTP call: base address, headers, body policy, and failure
//! normalization.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use hadith_wire::{CONTENT_TYPE_JSON, CONTENT_TYPE_PROTOBUF};
use metrics::{counter, histogram};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::auth::{AuthState, TokenSource, token_from_cookies};
use super::error::ApiError;
use super::operations::HttpMethod;
use super::report::{ErrorContext, ErrorReporter};

pub(crate) const METRIC_RPC_REQUESTS: &str = "hadith_rpc_requests_total";
pub(crate) const METRIC_RPC_LATENCY_MS: &str = "hadith_rpc_latency_ms";

/// Internal address used by development deployments without an explicit one.
pub const DEVELOPMENT_INTERNAL_URL: &str = "http://127.0.0.1:8080";

/// Client IP header set by the edge proxy. The only inbound header ever
/// forwarded upstream.
pub static TRUSTED_CLIENT_IP_HEADER: HeaderName = HeaderName::from_static("cf-connecting-ip");

static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Where calls originate. Chosen per deployment, never probed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    /// Inside the rendering server; may use the trusted internal address.
    #[default]
    Server,
    /// Browser-like context; only the public address is reachable.
    Client,
}

/// The two base addresses of the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub internal: Url,
    pub public: Url,
}

impl Endpoints {
    /// Resolves the internal address: explicit value, then the development
    /// default, then the public address.
    pub fn resolve(public: Url, internal: Option<Url>, development: bool) -> Self {
        let internal = internal
            .or_else(|| {
                development
                    .then(|| Url::parse(DEVELOPMENT_INTERNAL_URL).ok())
                    .flatten()
            })
            .unwrap_or_else(|| public.clone());
        Self { internal, public }
    }

    pub fn base_for(&self, context: ExecutionContext) -> &Url {
        match context {
            ExecutionContext::Server => &self.internal,
            ExecutionContext::Client => &self.public,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub context: ExecutionContext,
    pub endpoints: Endpoints,
    pub timeout: Duration,
    pub user_agent: String,
}

impl TransportConfig {
    pub fn new(context: ExecutionContext, endpoints: Endpoints) -> Self {
        Self {
            context,
            endpoints,
            timeout: Duration::from_secs(10),
            user_agent: default_user_agent().to_string(),
        }
    }
}

pub fn default_user_agent() -> &'static str {
    concat!("hadith-reader/", env!("CARGO_PKG_VERSION"))
}

/// Outbound body. The variant decides the `Content-Type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Protobuf bytes, sent verbatim.
    Binary(Bytes),
    /// Serialized JSON text.
    Json(Bytes),
}

impl RequestBody {
    fn content_type(&self) -> &'static str {
        match self {
            Self::Binary(_) => CONTENT_TYPE_PROTOBUF,
            Self::Json(_) => CONTENT_TYPE_JSON,
        }
    }

    fn into_bytes(self) -> Bytes {
        match self {
            Self::Binary(bytes) | Self::Json(bytes) => bytes,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RequestOptions {
    pub query: Vec<(&'static str, String)>,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
    pub accept: Option<&'static str>,
    pub requires_auth: bool,
    /// Headers of the request being served, when calling from the server.
    pub inbound: Option<HeaderMap>,
    /// Catalog name, for logs and error reports.
    pub operation: Option<&'static str>,
}

/// A successful response, body still unread.
#[derive(Debug)]
pub struct TransportResponse {
    pub response: Response,
    pub auth: AuthState,
    pub request_id: String,
}

#[derive(Clone)]
pub struct Transport {
    client: Client,
    base: Url,
    context: ExecutionContext,
    reporter: Arc<dyn ErrorReporter>,
    session: Arc<dyn TokenSource>,
}

impl Transport {
    pub fn new(
        config: &TransportConfig,
        reporter: Arc<dyn ErrorReporter>,
        session: Arc<dyn TokenSource>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base: config.endpoints.base_for(config.context).clone(),
            context: config.context,
            reporter,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    /// Executes one call and returns the raw response on a 2xx status.
    ///
    /// Every failure is reported to the [`ErrorReporter`] before it is
    /// returned.
    #[instrument(
        skip_all,
        fields(method = method.as_str(), path = %path, operation = options.operation.unwrap_or("raw"))
    )]
    pub async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<TransportResponse, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        let operation = options.operation;

        let url = match self.url(path, &options.query) {
            Ok(url) => url,
            Err(err) => {
                let raw = format!("{}{}", self.base, path);
                return Err(self.fail(err, operation, method, &raw, &request_id));
            }
        };

        let (headers, auth) = match self.outbound_headers(&options, &request_id) {
            Ok(prepared) => prepared,
            Err(err) => return Err(self.fail(err, operation, method, url.as_str(), &request_id)),
        };

        let mut request = self
            .client
            .request(method.to_reqwest(), url.clone())
            .headers(headers);
        match options.body {
            Some(body) if method.carries_body() => {
                request = request
                    .header(CONTENT_TYPE, body.content_type())
                    .body(body.into_bytes());
            }
            Some(_) => debug!("dropping request body on GET"),
            None => {}
        }

        let started = Instant::now();
        let result = request.send().await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let label = operation.unwrap_or("raw");
        histogram!(METRIC_RPC_LATENCY_MS, "operation" => label).record(elapsed_ms);

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                counter!(METRIC_RPC_REQUESTS, "operation" => label, "outcome" => "network")
                    .increment(1);
                let err = ApiError::from(err);
                return Err(self.fail(err, operation, method, url.as_str(), &request_id));
            }
        };

        let status = response.status();
        if !status.is_success() {
            counter!(METRIC_RPC_REQUESTS, "operation" => label, "outcome" => "http_error")
                .increment(1);
            let body = response.bytes().await.unwrap_or_default();
            let err = ApiError::from_status(status, &body);
            return Err(self.fail(err, operation, method, url.as_str(), &request_id));
        }

        counter!(METRIC_RPC_REQUESTS, "operation" => label, "outcome" => "ok").increment(1);
        debug!(status = status.as_u16(), elapsed_ms, request_id, "remote call succeeded");

        Ok(TransportResponse {
            response,
            auth,
            request_id,
        })
    }

    /// Hands an error to the reporter and gives it back for returning.
    pub(crate) fn fail(
        &self,
        err: ApiError,
        operation: Option<&'static str>,
        method: HttpMethod,
        url: &str,
        request_id: &str,
    ) -> ApiError {
        self.reporter.report(
            &err,
            &ErrorContext {
                operation,
                method,
                url,
                request_id,
            },
        );
        err
    }

    fn url(&self, path: &str, query: &[(&'static str, String)]) -> Result<Url, ApiError> {
        // Joining would discard a path prefix on the base, so concatenate.
        let base = self.base.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{base}/{path}"))
            .map_err(|err| ApiError::request(format!("invalid request URL: {err}")))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    fn outbound_headers(
        &self,
        options: &RequestOptions,
        request_id: &str,
    ) -> Result<(HeaderMap, AuthState), ApiError> {
        let mut headers = options.headers.clone();

        headers.insert(
            REQUEST_ID_HEADER.clone(),
            header_value(request_id, "x-request-id")?,
        );
        if let Some(accept) = options.accept {
            headers.insert(ACCEPT, HeaderValue::from_static(accept));
        }

        if self.context == ExecutionContext::Server
            && let Some(inbound) = options.inbound.as_ref()
            && let Some(client_ip) = inbound.get(&TRUSTED_CLIENT_IP_HEADER)
        {
            headers.insert(TRUSTED_CLIENT_IP_HEADER.clone(), client_ip.clone());
        }

        let auth = if options.requires_auth {
            match self.bearer_token(options.inbound.as_ref()) {
                Some(token) => {
                    headers.insert(
                        AUTHORIZATION,
                        header_value(&format!("Bearer {token}"), "authorization")?,
                    );
                    AuthState::Attached
                }
                None => {
                    warn!(
                        operation = options.operation.unwrap_or("raw"),
                        "authentication required but no token available; sending anyway"
                    );
                    AuthState::Missing
                }
            }
        } else {
            AuthState::NotRequired
        };

        Ok((headers, auth))
    }

    fn bearer_token(&self, inbound: Option<&HeaderMap>) -> Option<String> {
        inbound
            .and_then(token_from_cookies)
            .or_else(|| self.session.bearer_token())
    }
}

fn header_value(value: &str, name: &'static str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value)
        .map_err(|err| ApiError::request(format!("invalid {name} header: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::auth::{NoSession, SessionToken};
    use crate::rpc::report::TracingReporter;

    fn url(raw: &str) -> Url {
        Url::parse(raw).expect("valid url")
    }

    fn transport(context: ExecutionContext, base: &str, session: Arc<dyn TokenSource>) -> Transport {
        let endpoints = Endpoints {
            internal: url(base),
            public: url(base),
        };
        Transport::new(
            &TransportConfig::new(context, endpoints),
            Arc::new(TracingReporter),
            session,
        )
        .expect("transport")
    }

    #[test]
    fn internal_address_prefers_explicit_value() {
        let endpoints = Endpoints::resolve(
            url("https://hadith.example"),
            Some(url("http://backend.internal:9000")),
            true,
        );
        assert_eq!(endpoints.internal.as_str(), "http://backend.internal:9000/");
    }

    #[test]
    fn internal_address_falls_back_to_development_default() {
        let endpoints = Endpoints::resolve(url("https://hadith.example"), None, true);
        assert_eq!(endpoints.internal.as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn internal_address_falls_back_to_public() {
        let endpoints = Endpoints::resolve(url("https://hadith.example"), None, false);
        assert_eq!(endpoints.internal, endpoints.public);
    }

    #[test]
    fn context_selects_base_address() {
        let endpoints = Endpoints {
            internal: url("http://backend.internal:9000"),
            public: url("https://api.hadith.example"),
        };
        let server = Transport::new(
            &TransportConfig::new(ExecutionContext::Server, endpoints.clone()),
            Arc::new(TracingReporter),
            Arc::new(NoSession),
        )
        .expect("transport");
        let client = Transport::new(
            &TransportConfig::new(ExecutionContext::Client, endpoints),
            Arc::new(TracingReporter),
            Arc::new(NoSession),
        )
        .expect("transport");

        assert_eq!(server.base_url().host_str(), Some("backend.internal"));
        assert_eq!(client.base_url().host_str(), Some("api.hadith.example"));
    }

    #[test]
    fn url_keeps_base_path_prefix_and_encodes_query() {
        let transport = transport(
            ExecutionContext::Server,
            "http://backend.internal/api/",
            Arc::new(NoSession),
        );
        let built = transport
            .url("/v1/collections", &[("language", "en & ar".to_string())])
            .expect("url");
        assert_eq!(
            built.as_str(),
            "http://backend.internal/api/v1/collections?language=en+%26+ar"
        );
    }

    #[test]
    fn only_client_ip_is_forwarded_from_inbound() {
        let transport = transport(
            ExecutionContext::Server,
            "http://backend.internal",
            Arc::new(NoSession),
        );
        let mut inbound = HeaderMap::new();
        inbound.insert("cf-connecting-ip", HeaderValue::from_static("203.0.113.9"));
        inbound.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        inbound.insert("user-agent", HeaderValue::from_static("browser"));

        let options = RequestOptions {
            inbound: Some(inbound),
            ..Default::default()
        };
        let (headers, auth) = transport
            .outbound_headers(&options, "req-1")
            .expect("headers");

        assert_eq!(
            headers.get("cf-connecting-ip").and_then(|v| v.to_str().ok()),
            Some("203.0.113.9")
        );
        assert!(headers.get("x-forwarded-for").is_none());
        assert!(headers.get("user-agent").is_none());
        assert_eq!(auth, AuthState::NotRequired);
    }

    #[test]
    fn client_context_never_forwards_inbound_headers() {
        let transport = transport(
            ExecutionContext::Client,
            "https://api.hadith.example",
            Arc::new(NoSession),
        );
        let mut inbound = HeaderMap::new();
        inbound.insert("cf-connecting-ip", HeaderValue::from_static("203.0.113.9"));

        let options = RequestOptions {
            inbound: Some(inbound),
            ..Default::default()
        };
        let (headers, _) = transport
            .outbound_headers(&options, "req-2")
            .expect("headers");
        assert!(headers.get("cf-connecting-ip").is_none());
    }

    #[test]
    fn inbound_cookie_wins_over_session_token() {
        let session = Arc::new(SessionToken::new());
        session.set("session-token");
        let transport = transport(ExecutionContext::Server, "http://backend.internal", session);

        let mut inbound = HeaderMap::new();
        inbound.insert(
            reqwest::header::COOKIE,
            HeaderValue::from_static("auth_token=cookie-token"),
        );
        let options = RequestOptions {
            requires_auth: true,
            inbound: Some(inbound),
            ..Default::default()
        };
        let (headers, auth) = transport
            .outbound_headers(&options, "req-3")
            .expect("headers");

        assert_eq!(auth, AuthState::Attached);
        assert_eq!(
            headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Bearer cookie-token")
        );
    }

    #[test]
    fn missing_token_is_reported_not_refused() {
        let transport = transport(
            ExecutionContext::Client,
            "https://api.hadith.example",
            Arc::new(NoSession),
        );
        let options = RequestOptions {
            requires_auth: true,
            ..Default::default()
        };
        let (headers, auth) = transport
            .outbound_headers(&options, "req-4")
            .expect("headers");

        assert!(auth.is_missing());
        assert!(headers.get(AUTHORIZATION).is_none());
    }


    #[tokio::test]
    async fn get_drops_body_and_content_type() {
        let server = httpmock::MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/v1/collections")
                    .header_missing("content-type")
                    .is_true(|req: &httpmock::HttpMockRequest| req.body().to_vec().is_empty());
                then.status(200);
            })
            .await;

        let transport = transport(ExecutionContext::Client, &server.base_url(), Arc::new(NoSession));
        let options = RequestOptions {
            body: Some(RequestBody::Binary(Bytes::from_static(&[0x0a, 0x01, b'x']))),
            ..Default::default()
        };
        transport
            .execute(HttpMethod::Get, "/v1/collections", options)
            .await
            .expect("get succeeds");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn post_sends_body_verbatim_with_content_type() {
        let server = httpmock::MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/v1/telemetry")
                    .header("content-type", CONTENT_TYPE_JSON)
                    .is_true(|req: &httpmock::HttpMockRequest| {
                        req.body().to_vec() == br#"{"events":[]}"#.to_vec()
                    });
                then.status(202);
            })
            .await;

        let transport = transport(ExecutionContext::Client, &server.base_url(), Arc::new(NoSession));
        let options = RequestOptions {
            body: Some(RequestBody::Json(Bytes::from_static(br#"{"events":[]}"#))),
            ..Default::default()
        };
        transport
            .execute(HttpMethod::Post, "/v1/telemetry", options)
            .await
            .expect("post succeeds");
        mock.assert_async().await;
    }
}
