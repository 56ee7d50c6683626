//! Operation catalog.
//!
//! Each remote operation is declared exactly once: its name, HTTP method,
//! path template, auth requirement, body encoding, and the request and
//! response messages with their codecs. [`RpcClient::invoke`] is the only
//! consumer of these declarations.
//!
//! [`RpcClient::invoke`]: super::RpcClient::invoke

use hadith_wire::json::{TelemetryAck, TelemetryBatch};
use hadith_wire::messages::{
    AuthResponse, CurrentUserRequest, CurrentUserResponse, GetBookRequest, GetBookResponse,
    GetCollectionRequest, GetCollectionResponse, GetHadithRequest, GetHadithResponse,
    GetSettingsRequest, ListBooksRequest, ListBooksResponse, ListChaptersRequest,
    ListChaptersResponse, ListCollectionsRequest, ListCollectionsResponse, ListHadithsRequest,
    ListHadithsResponse, LoginRequest, RegisterRequest, SearchRequest, SearchResponse,
    SettingsResponse, UpdateSettingsRequest,
};
use hadith_wire::{JsonCodec, ProtobufCodec, WireCodec};
use reqwest::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }

    /// GET requests never carry a body.
    pub fn carries_body(self) -> bool {
        !matches!(self, Self::Get)
    }

    pub(crate) fn to_reqwest(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Delete => Method::DELETE,
            Self::Patch => Method::PATCH,
        }
    }
}

/// Body encoding used by an operation for both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Binary,
    Json,
}

/// What an empty success body means for an operation.
///
/// A protobuf message whose fields are all default encodes to zero bytes,
/// so for list and lookup responses an empty body is a legitimate "nothing
/// found". Operations that must always return data reject it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyResponse {
    Default,
    Reject,
}

/// Immutable description of one remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub name: &'static str,
    pub method: HttpMethod,
    /// Path relative to the base address; `{name}` segments are filled
    /// from [`RouteParams::path_params`].
    pub path: &'static str,
    pub requires_auth: bool,
    pub encoding: Encoding,
    pub empty_response: EmptyResponse,
}

/// Path and query parameters a request message contributes to the URL.
pub trait RouteParams {
    fn path_params(&self) -> Vec<(&'static str, &str)> {
        Vec::new()
    }

    /// Query pairs; default-valued fields are left out.
    fn query_params(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

pub trait Operation {
    type Request: RouteParams + Send + Sync;
    type Response: Send;
    type RequestCodec: WireCodec<Self::Request>;
    type ResponseCodec: WireCodec<Self::Response>;

    const DESCRIPTOR: RequestDescriptor;
}

macro_rules! codec_for {
    (Binary, $message:ty) => {
        ProtobufCodec<$message>
    };
    (Json, $message:ty) => {
        JsonCodec<$message>
    };
}

macro_rules! operations {
    ($(
        $(#[$meta:meta])*
        $op:ident {
            name: $name:literal,
            method: $method:ident,
            path: $path:literal,
            auth: $auth:literal,
            encoding: $encoding:ident,
            empty_response: $empty:ident,
            request: $request:ty,
            response: $response:ty $(,)?
        }
    )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $op;

            impl Operation for $op {
                type Request = $request;
                type Response = $response;
                type RequestCodec = codec_for!($encoding, $request);
                type ResponseCodec = codec_for!($encoding, $response);

                const DESCRIPTOR: RequestDescriptor = RequestDescriptor {
                    name: $name,
                    method: HttpMethod::$method,
                    path: $path,
                    requires_auth: $auth,
                    encoding: Encoding::$encoding,
                    empty_response: EmptyResponse::$empty,
                };
            }
        )*

        /// Every declared operation, in declaration order.
        pub const CATALOG: &[RequestDescriptor] = &[$(<$op as Operation>::DESCRIPTOR),*];
    };
}

operations! {
    ListCollections {
        name: "list_collections",
        method: Get,
        path: "/v1/collections",
        auth: false,
        encoding: Binary,
        empty_response: Default,
        request: ListCollectionsRequest,
        response: ListCollectionsResponse,
    }

    GetCollection {
        name: "get_collection",
        method: Get,
        path: "/v1/collections/{id}",
        auth: false,
        encoding: Binary,
        empty_response: Default,
        request: GetCollectionRequest,
        response: GetCollectionResponse,
    }

    /// Books under one collection; backs the sidebar's lazy expansion.
    ListBooks {
        name: "list_books",
        method: Get,
        path: "/v1/collections/{collection_id}/books",
        auth: false,
        encoding: Binary,
        empty_response: Default,
        request: ListBooksRequest,
        response: ListBooksResponse,
    }

    GetBook {
        name: "get_book",
        method: Get,
        path: "/v1/collections/{collection_id}/books/{book_number}",
        auth: false,
        encoding: Binary,
        empty_response: Default,
        request: GetBookRequest,
        response: GetBookResponse,
    }

    ListChapters {
        name: "list_chapters",
        method: Get,
        path: "/v1/collections/{collection_id}/books/{book_number}/chapters",
        auth: false,
        encoding: Binary,
        empty_response: Default,
        request: ListChaptersRequest,
        response: ListChaptersResponse,
    }

    ListHadiths {
        name: "list_hadiths",
        method: Get,
        path: "/v1/collections/{collection_id}/books/{book_number}/hadiths",
        auth: false,
        encoding: Binary,
        empty_response: Default,
        request: ListHadithsRequest,
        response: ListHadithsResponse,
    }

    GetHadith {
        name: "get_hadith",
        method: Get,
        path: "/v1/hadiths/{urn}",
        auth: false,
        encoding: Binary,
        empty_response: Default,
        request: GetHadithRequest,
        response: GetHadithResponse,
    }

    SearchHadiths {
        name: "search_hadiths",
        method: Post,
        path: "/v1/search",
        auth: false,
        encoding: Binary,
        empty_response: Default,
        request: SearchRequest,
        response: SearchResponse,
    }

    Login {
        name: "login",
        method: Post,
        path: "/v1/auth/login",
        auth: false,
        encoding: Binary,
        empty_response: Reject,
        request: LoginRequest,
        response: AuthResponse,
    }

    Register {
        name: "register",
        method: Post,
        path: "/v1/auth/register",
        auth: false,
        encoding: Binary,
        empty_response: Reject,
        request: RegisterRequest,
        response: AuthResponse,
    }

    CurrentUser {
        name: "current_user",
        method: Get,
        path: "/v1/auth/me",
        auth: true,
        encoding: Binary,
        empty_response: Reject,
        request: CurrentUserRequest,
        response: CurrentUserResponse,
    }

    GetSettings {
        name: "get_settings",
        method: Get,
        path: "/v1/users/me/settings",
        auth: true,
        encoding: Binary,
        empty_response: Reject,
        request: GetSettingsRequest,
        response: SettingsResponse,
    }

    UpdateSettings {
        name: "update_settings",
        method: Put,
        path: "/v1/users/me/settings",
        auth: true,
        encoding: Binary,
        empty_response: Reject,
        request: UpdateSettingsRequest,
        response: SettingsResponse,
    }

    /// Client-side telemetry. JSON in both directions.
    SubmitTelemetry {
        name: "submit_telemetry",
        method: Post,
        path: "/v1/telemetry",
        auth: false,
        encoding: Json,
        empty_response: Reject,
        request: TelemetryBatch,
        response: TelemetryAck,
    }
}

// ============================================================================
// Route parameters
// ============================================================================

fn push_non_empty(query: &mut Vec<(&'static str, String)>, name: &'static str, value: &str) {
    if !value.is_empty() {
        query.push((name, value.to_string()));
    }
}

fn push_non_zero(query: &mut Vec<(&'static str, String)>, name: &'static str, value: u32) {
    if value != 0 {
        query.push((name, value.to_string()));
    }
}

fn language_query(language: &str) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    push_non_empty(&mut query, "language", language);
    query
}

impl RouteParams for ListCollectionsRequest {
    fn query_params(&self) -> Vec<(&'static str, String)> {
        language_query(&self.language)
    }
}

impl RouteParams for GetCollectionRequest {
    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("id", self.id.as_str())]
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        language_query(&self.language)
    }
}

impl RouteParams for ListBooksRequest {
    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("collection_id", self.collection_id.as_str())]
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        language_query(&self.language)
    }
}

impl RouteParams for GetBookRequest {
    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("collection_id", self.collection_id.as_str()),
            ("book_number", self.book_number.as_str()),
        ]
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        language_query(&self.language)
    }
}

impl RouteParams for ListChaptersRequest {
    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("collection_id", self.collection_id.as_str()),
            ("book_number", self.book_number.as_str()),
        ]
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        language_query(&self.language)
    }
}

impl RouteParams for ListHadithsRequest {
    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("collection_id", self.collection_id.as_str()),
            ("book_number", self.book_number.as_str()),
        ]
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut query = language_query(&self.language);
        push_non_zero(&mut query, "page", self.page);
        push_non_zero(&mut query, "limit", self.limit);
        query
    }
}

impl RouteParams for GetHadithRequest {
    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("urn", self.urn.as_str())]
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        language_query(&self.language)
    }
}

impl RouteParams for SearchRequest {}
impl RouteParams for LoginRequest {}
impl RouteParams for RegisterRequest {}
impl RouteParams for CurrentUserRequest {}
impl RouteParams for GetSettingsRequest {}
impl RouteParams for UpdateSettingsRequest {}
impl RouteParams for TelemetryBatch {}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path parameter `{0}` was not supplied")]
    Missing(String),
    #[error("path parameter `{0}` is empty")]
    Empty(&'static str),
    #[error("unterminated placeholder in `{0}`")]
    Unterminated(&'static str),
}

/// Fills `{name}` segments of a path template, percent-encoding each value
/// as a single path segment.
pub fn render_path(
    template: &'static str,
    params: &[(&'static str, &str)],
) -> Result<String, PathError> {
    let mut rendered = String::with_capacity(template.len() + 16);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or(PathError::Unterminated(template))?;
        let name = &after[..close];

        let (param, value) = params
            .iter()
            .find(|(param, _)| *param == name)
            .ok_or_else(|| PathError::Missing(name.to_string()))?;
        if value.is_empty() {
            return Err(PathError::Empty(*param));
        }
        rendered.push_str(&urlencoding::encode(value));
        rest = &after[close + 1..];
    }
    rendered.push_str(rest);

    Ok(rendered)
}
