use std::sync::{Arc, Mutex};

use hadith_reader::rpc::{
    ApiError, ApiErrorKind, AuthState, CallOptions, Endpoints, ErrorContext, ErrorReporter,
    ExecutionContext, NoSession, RpcClient, Transport, TransportConfig,
};
use hadith_wire::messages::{Book, ListBooksResponse};
use hadith_wire::{ProtobufCodec, WireCodec};
use httpmock::MockServer;
use reqwest::Url;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};

#[derive(Default)]
struct RecordingReporter {
    seen: Mutex<Vec<(Option<&'static str>, u16, String)>>,
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, error: &ApiError, context: &ErrorContext<'_>) {
        self.seen
            .lock()
            .expect("reporter lock")
            .push((context.operation, error.status, error.message.clone()));
    }
}

fn endpoints(internal: &MockServer, public: &MockServer) -> Endpoints {
    Endpoints {
        internal: Url::parse(&internal.base_url()).expect("internal url"),
        public: Url::parse(&public.base_url()).expect("public url"),
    }
}

fn client(
    context: ExecutionContext,
    endpoints: Endpoints,
    reporter: Arc<dyn ErrorReporter>,
) -> RpcClient {
    let transport = Transport::new(
        &TransportConfig::new(context, endpoints),
        reporter,
        Arc::new(NoSession),
    )
    .expect("transport");
    RpcClient::new(transport)
}

fn books_body() -> Vec<u8> {
    ProtobufCodec::<ListBooksResponse>::default()
        .encode(&ListBooksResponse {
            books: vec![Book {
                id: "bukhari-1".to_string(),
                collection_id: "bukhari".to_string(),
                number: "1".to_string(),
                title: "Revelation".to_string(),
                ..Default::default()
            }],
        })
        .expect("encode")
        .to_vec()
}

#[tokio::test]
async fn server_context_calls_internal_address() {
    let internal = MockServer::start_async().await;
    let public = MockServer::start_async().await;
    let internal_mock = internal
        .mock_async(|when, then| {
            when.method("GET").path("/v1/collections/bukhari/books");
            then.status(200).body(books_body());
        })
        .await;
    let public_mock = public
        .mock_async(|when, then| {
            when.method("GET").path("/v1/collections/bukhari/books");
            then.status(200).body(books_body());
        })
        .await;

    let client = client(
        ExecutionContext::Server,
        endpoints(&internal, &public),
        Arc::new(RecordingReporter::default()),
    );
    client.list_books("bukhari", "en").await.expect("books");

    internal_mock.assert_calls_async(1).await;
    public_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn client_context_calls_public_address() {
    let internal = MockServer::start_async().await;
    let public = MockServer::start_async().await;
    let internal_mock = internal
        .mock_async(|when, then| {
            when.method("GET").path("/v1/collections/bukhari/books");
            then.status(200).body(books_body());
        })
        .await;
    let public_mock = public
        .mock_async(|when, then| {
            when.method("GET").path("/v1/collections/bukhari/books");
            then.status(200).body(books_body());
        })
        .await;

    let client = client(
        ExecutionContext::Client,
        endpoints(&internal, &public),
        Arc::new(RecordingReporter::default()),
    );
    let response = client.list_books("bukhari", "en").await.expect("books");

    assert_eq!(response.books[0].title, "Revelation");
    internal_mock.assert_calls_async(0).await;
    public_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn inbound_cookie_and_client_ip_are_forwarded_server_side() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method("GET")
                .path("/v1/auth/me")
                .header("authorization", "Bearer from-cookie")
                .header("cf-connecting-ip", "198.51.100.7");
            then.status(200).body(vec![0x0a, 0x00]);
        })
        .await;

    let client = client(
        ExecutionContext::Server,
        endpoints(&server, &server),
        Arc::new(RecordingReporter::default()),
    );
    let mut inbound = HeaderMap::new();
    inbound.insert(COOKIE, HeaderValue::from_static("lang=en; auth_token=from-cookie"));
    inbound.insert("cf-connecting-ip", HeaderValue::from_static("198.51.100.7"));

    let reply = client
        .current_user(CallOptions::inbound(inbound))
        .await
        .expect("current user");

    mock.assert_async().await;
    assert_eq!(reply.auth, AuthState::Attached);
    assert_eq!(reply.value.user, Some(Default::default()));
}

#[tokio::test]
async fn failures_are_reported_before_they_are_returned() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/v1/collections/bukhari/books");
            then.status(503)
                .header("content-type", "application/json")
                .body(r#"{"error":{"message":"catalog warming up","trace_id":"abc"}}"#);
        })
        .await;

    let reporter = Arc::new(RecordingReporter::default());
    let client = client(
        ExecutionContext::Client,
        endpoints(&server, &server),
        Arc::clone(&reporter) as Arc<dyn ErrorReporter>,
    );

    let err = client
        .list_books("bukhari", "en")
        .await
        .expect_err("unavailable");
    assert_eq!(err.kind, ApiErrorKind::HttpStatus);
    assert_eq!(err.trace_id.as_deref(), Some("abc"));

    let seen = reporter.seen.lock().expect("reporter lock").clone();
    assert_eq!(
        seen,
        vec![(Some("list_books"), 503, "catalog warming up".to_string())]
    );
}

#[tokio::test]
async fn unparsable_error_body_falls_back_to_status_text() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/v1/collections");
            then.status(500).body("<html>oops</html>");
        })
        .await;

    let client = client(
        ExecutionContext::Client,
        endpoints(&server, &server),
        Arc::new(RecordingReporter::default()),
    );
    let err = client.list_collections("en").await.expect_err("500");
    assert_eq!(err.message, "Internal Server Error");
    assert_eq!(err.status, 500);
}
