use bytes::Bytes;
use hadith_wire::WireCodec;
use hadith_wire::json::{TelemetryAck, TelemetryBatch};
use hadith_wire::messages::{
    AuthResponse, CurrentUserRequest, CurrentUserResponse, GetBookRequest, GetBookResponse,
    GetCollectionRequest, GetCollectionResponse, GetHadithRequest, GetHadithResponse,
    GetSettingsRequest, ListBooksRequest, ListBooksResponse, ListChaptersRequest,
    ListChaptersResponse, ListCollectionsRequest, ListCollectionsResponse, ListHadithsRequest,
    ListHadithsResponse, LoginRequest, RegisterRequest, SearchRequest, SearchResponse,
    SettingsResponse, UpdateSettingsRequest, UserSettings,
};
use reqwest::header::HeaderMap;
use tracing::instrument;

use super::auth::AuthState;
use super::error::ApiError;
use super::operations::{
    CurrentUser, EmptyResponse, Encoding, GetBook, GetCollection, GetHadith, GetSettings,
    ListBooks, ListChapters, ListCollections, ListHadiths, Login, Operation, Register,
    RouteParams, SearchHadiths, SubmitTelemetry, UpdateSettings, render_path,
};
use super::transport::{RequestBody, RequestOptions, Transport};

/// Per-call extras on top of what the operation declares.
#[derive(Debug, Default, Clone)]
pub struct CallOptions {
    pub headers: HeaderMap,
    /// Headers of the request being served, for cookie and client-IP
    /// pass-through.
    pub inbound: Option<HeaderMap>,
}

impl CallOptions {
    pub fn inbound(headers: HeaderMap) -> Self {
        Self {
            headers: HeaderMap::new(),
            inbound: Some(headers),
        }
    }
}

/// A decoded response together with how the call was authenticated.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    pub value: T,
    pub auth: AuthState,
}

impl<T> Reply<T> {
    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        Reply {
            value: f(self.value),
            auth: self.auth,
        }
    }
}

/// Typed client for the catalog and account service.
#[derive(Clone)]
pub struct RpcClient {
    transport: Transport,
}

impl RpcClient {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Runs one catalog operation end to end.
    #[instrument(skip_all, fields(operation = O::DESCRIPTOR.name))]
    pub async fn invoke<O: Operation>(
        &self,
        request: &O::Request,
        options: CallOptions,
    ) -> Result<Reply<O::Response>, ApiError> {
        let descriptor = O::DESCRIPTOR;

        let path = render_path(descriptor.path, &request.path_params()).map_err(|err| {
            self.transport.fail(
                ApiError::request(err.to_string()),
                Some(descriptor.name),
                descriptor.method,
                descriptor.path,
                "",
            )
        })?;

        let body = if descriptor.method.carries_body() {
            let bytes = O::RequestCodec::default().encode(request).map_err(|err| {
                self.transport.fail(
                    ApiError::request(err.to_string()),
                    Some(descriptor.name),
                    descriptor.method,
                    &path,
                    "",
                )
            })?;
            Some(match descriptor.encoding {
                Encoding::Binary => RequestBody::Binary(bytes),
                Encoding::Json => RequestBody::Json(bytes),
            })
        } else {
            None
        };

        let response_codec = O::ResponseCodec::default();
        let sent = self
            .transport
            .execute(
                descriptor.method,
                &path,
                RequestOptions {
                    query: request.query_params(),
                    headers: options.headers,
                    body,
                    accept: Some(response_codec.content_type()),
                    requires_auth: descriptor.requires_auth,
                    inbound: options.inbound,
                    operation: Some(descriptor.name),
                },
            )
            .await?;

        let status = sent.response.status();
        let url = sent.response.url().to_string();
        let fail = |err: ApiError| {
            self.transport.fail(
                err,
                Some(descriptor.name),
                descriptor.method,
                &url,
                &sent.request_id,
            )
        };

        let bytes: Bytes = match sent.response.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => return Err(fail(ApiError::from(err))),
        };

        if bytes.is_empty() && descriptor.empty_response == EmptyResponse::Reject {
            return Err(fail(ApiError::decode(
                status,
                format!("empty response body for {}", descriptor.name),
            )));
        }

        let value = response_codec
            .decode(&bytes)
            .map_err(|err| fail(ApiError::decode(status, err.to_string())))?;

        Ok(Reply {
            value,
            auth: sent.auth,
        })
    }

    pub async fn list_collections(
        &self,
        language: &str,
    ) -> Result<ListCollectionsResponse, ApiError> {
        let request = ListCollectionsRequest {
            language: language.to_string(),
        };
        self.invoke::<ListCollections>(&request, CallOptions::default())
            .await
            .map(Reply::into_inner)
    }

    pub async fn get_collection(
        &self,
        id: &str,
        language: &str,
    ) -> Result<GetCollectionResponse, ApiError> {
        let request = GetCollectionRequest {
            id: id.to_string(),
            language: language.to_string(),
        };
        self.invoke::<GetCollection>(&request, CallOptions::default())
            .await
            .map(Reply::into_inner)
    }

    pub async fn list_books(
        &self,
        collection_id: &str,
        language: &str,
    ) -> Result<ListBooksResponse, ApiError> {
        let request = ListBooksRequest {
            collection_id: collection_id.to_string(),
            language: language.to_string(),
        };
        self.invoke::<ListBooks>(&request, CallOptions::default())
            .await
            .map(Reply::into_inner)
    }

    pub async fn get_book(
        &self,
        collection_id: &str,
        book_number: &str,
        language: &str,
    ) -> Result<GetBookResponse, ApiError> {
        let request = GetBookRequest {
            collection_id: collection_id.to_string(),
            book_number: book_number.to_string(),
            language: language.to_string(),
        };
        self.invoke::<GetBook>(&request, CallOptions::default())
            .await
            .map(Reply::into_inner)
    }

    pub async fn list_chapters(
        &self,
        request: &ListChaptersRequest,
    ) -> Result<ListChaptersResponse, ApiError> {
        self.invoke::<ListChapters>(request, CallOptions::default())
            .await
            .map(Reply::into_inner)
    }

    pub async fn list_hadiths(
        &self,
        request: &ListHadithsRequest,
    ) -> Result<ListHadithsResponse, ApiError> {
        self.invoke::<ListHadiths>(request, CallOptions::default())
            .await
            .map(Reply::into_inner)
    }

    pub async fn get_hadith(&self, urn: &str, language: &str) -> Result<GetHadithResponse, ApiError> {
        let request = GetHadithRequest {
            urn: urn.to_string(),
            language: language.to_string(),
        };
        self.invoke::<GetHadith>(&request, CallOptions::default())
            .await
            .map(Reply::into_inner)
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        self.invoke::<SearchHadiths>(request, CallOptions::default())
            .await
            .map(Reply::into_inner)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.invoke::<Login>(&request, CallOptions::default())
            .await
            .map(Reply::into_inner)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.invoke::<Register>(request, CallOptions::default())
            .await
            .map(Reply::into_inner)
    }

    pub async fn current_user(
        &self,
        options: CallOptions,
    ) -> Result<Reply<CurrentUserResponse>, ApiError> {
        self.invoke::<CurrentUser>(&CurrentUserRequest {}, options)
            .await
    }

    pub async fn get_settings(
        &self,
        options: CallOptions,
    ) -> Result<Reply<SettingsResponse>, ApiError> {
        self.invoke::<GetSettings>(&GetSettingsRequest {}, options)
            .await
    }

    pub async fn update_settings(
        &self,
        settings: UserSettings,
        options: CallOptions,
    ) -> Result<Reply<SettingsResponse>, ApiError> {
        let request = UpdateSettingsRequest {
            settings: Some(settings),
        };
        self.invoke::<UpdateSettings>(&request, options).await
    }

    pub async fn submit_telemetry(&self, batch: &TelemetryBatch) -> Result<TelemetryAck, ApiError> {
        self.invoke::<SubmitTelemetry>(batch, CallOptions::default())
            .await
            .map(Reply::into_inner)
    }
}
