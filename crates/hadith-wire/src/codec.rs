//! Encode/decode contract for wire messages.

use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

pub const CONTENT_TYPE_PROTOBUF: &str = "application/x-protobuf";
pub const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode {message}: {reason}")]
    Encode {
        message: &'static str,
        reason: String,
    },
    #[error("failed to decode {message}: {reason}")]
    Decode {
        message: &'static str,
        reason: String,
    },
}

impl CodecError {
    pub fn encode(message: &'static str, reason: impl fmt::Display) -> Self {
        Self::Encode {
            message,
            reason: reason.to_string(),
        }
    }

    pub fn decode(message: &'static str, reason: impl fmt::Display) -> Self {
        Self::Decode {
            message,
            reason: reason.to_string(),
        }
    }
}

/// Turns one message type into bytes and back.
///
/// Codecs are stateless and shared for the whole process lifetime, so
/// implementations must be `Send + Sync` and cheap to construct through
/// [`Default`].
pub trait WireCodec<T>: Default + Send + Sync {
    fn encode(&self, value: &T) -> Result<Bytes, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError>;

    /// Value of the `Content-Type` header for bodies produced by this codec.
    fn content_type(&self) -> &'static str;
}

/// Tag-length-value binary codec backed by `prost`.
///
/// Fields equal to their default are left off the wire, absent fields
/// decode to their default, and unknown field numbers are skipped.
pub struct ProtobufCodec<T>(PhantomData<fn() -> T>);

impl<T> Default for ProtobufCodec<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T> fmt::Debug for ProtobufCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProtobufCodec")
            .field(&short_type_name::<T>())
            .finish()
    }
}

impl<T> WireCodec<T> for ProtobufCodec<T>
where
    T: prost::Message + Default,
{
    fn encode(&self, value: &T) -> Result<Bytes, CodecError> {
        Ok(Bytes::from(value.encode_to_vec()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        T::decode(bytes).map_err(|err| CodecError::decode(short_type_name::<T>(), err))
    }

    fn content_type(&self) -> &'static str {
        CONTENT_TYPE_PROTOBUF
    }
}

/// Textual codec for the few operations that speak JSON.
pub struct JsonCodec<T>(PhantomData<fn() -> T>);

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JsonCodec")
            .field(&short_type_name::<T>())
            .finish()
    }
}

impl<T> WireCodec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Bytes, CodecError> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|err| CodecError::encode(short_type_name::<T>(), err))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|err| CodecError::decode(short_type_name::<T>(), err))
    }

    fn content_type(&self) -> &'static str {
        CONTENT_TYPE_JSON
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::TelemetryAck;
    use crate::messages::{
        AuthResponse, Book, Collection, CurrentUserResponse, Grade, Hadith, ListBooksResponse,
        LoginRequest, RegisterRequest, SearchRequest, SettingsResponse, User, UserSettings,
    };

    #[test]
    fn default_message_encodes_to_nothing() {
        let codec = ProtobufCodec::<Collection>::default();
        let bytes = codec.encode(&Collection::default()).expect("encode");
        assert!(bytes.is_empty());

        let decoded = codec.decode(&bytes).expect("decode");
        assert_eq!(decoded, Collection::default());
    }

    #[test]
    fn sparse_fields_are_omitted_and_restored() {
        let codec = ProtobufCodec::<Collection>::default();
        let only_id = Collection {
            id: "bukhari".to_string(),
            ..Default::default()
        };
        let with_count = Collection {
            book_count: 97,
            ..only_id.clone()
        };

        let short = codec.encode(&only_id).expect("encode");
        let long = codec.encode(&with_count).expect("encode");
        assert!(short.len() < long.len());

        let decoded = codec.decode(&short).expect("decode");
        assert_eq!(decoded.book_count, 0);
        assert!(!decoded.has_books);
        assert_eq!(decoded.id, "bukhari");
    }

    #[test]
    fn nested_and_repeated_messages_survive() {
        let codec = ProtobufCodec::<Hadith>::default();
        let hadith = Hadith {
            urn: "bukhari:1:1".to_string(),
            collection_id: "bukhari".to_string(),
            book_number: "1".to_string(),
            number: "1".to_string(),
            text: "Actions are judged by intentions".to_string(),
            narrator: "Umar bin Al-Khattab".to_string(),
            grades: vec![
                Grade {
                    source: "al-Albani".to_string(),
                    grade: "Sahih".to_string(),
                },
                Grade::default(),
            ],
            ..Default::default()
        };

        let bytes = codec.encode(&hadith).expect("encode");
        assert_eq!(codec.decode(&bytes).expect("decode"), hadith);
    }

    fn assert_round_trips<T>(cases: &[T])
    where
        T: prost::Message + Default + PartialEq,
    {
        let codec = ProtobufCodec::<T>::default();
        for case in cases {
            let bytes = codec.encode(case).expect("encode");
            assert_eq!(&codec.decode(&bytes).expect("decode"), case);
        }
    }

    #[test]
    fn account_and_search_messages_round_trip() {
        let user = User {
            id: "u-1".to_string(),
            username: "reader".to_string(),
            email: "reader@example.org".to_string(),
            email_verified: true,
        };

        assert_round_trips(&[
            AuthResponse::default(),
            AuthResponse {
                token: "tok".to_string(),
                user: Some(user.clone()),
                expires_at: 1_767_225_600,
            },
            AuthResponse {
                token: "tok".to_string(),
                user: Some(User::default()),
                expires_at: -1,
            },
            AuthResponse {
                user: None,
                expires_at: i64::MAX,
                ..Default::default()
            },
        ]);
        assert_round_trips(&[
            UserSettings::default(),
            UserSettings {
                language: "ar".to_string(),
                theme: "dark".to_string(),
                font_size: 18,
                show_arabic: true,
                show_translation: false,
            },
            UserSettings {
                show_arabic: false,
                show_translation: true,
                ..Default::default()
            },
        ]);
        assert_round_trips(&[
            SearchRequest::default(),
            SearchRequest {
                query: "intention".to_string(),
                language: "en".to_string(),
                collection_id: "bukhari".to_string(),
                page: 2,
                limit: u32::MAX,
            },
        ]);
        assert_round_trips(&[
            CurrentUserResponse { user: None },
            CurrentUserResponse { user: Some(user) },
        ]);
        assert_round_trips(&[
            LoginRequest {
                username: "reader".to_string(),
                password: "s3cret".to_string(),
            },
            LoginRequest::default(),
        ]);
        assert_round_trips(&[
            RegisterRequest {
                username: "reader".to_string(),
                email: "reader@example.org".to_string(),
                password: "s3cret".to_string(),
            },
            RegisterRequest::default(),
        ]);
        assert_round_trips(&[
            SettingsResponse { settings: None },
            SettingsResponse {
                settings: Some(UserSettings {
                    font_size: 14,
                    ..Default::default()
                }),
            },
        ]);
    }

    #[derive(Clone, PartialEq, prost::Message)]
    struct CollectionNext {
        #[prost(string, tag = "1")]
        id: String,
        #[prost(string, tag = "2")]
        title: String,
        #[prost(string, tag = "40")]
        curator: String,
        #[prost(message, optional, tag = "41")]
        featured: Option<Book>,
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let newer = CollectionNext {
            id: "muslim".to_string(),
            title: "Sahih Muslim".to_string(),
            curator: "someone".to_string(),
            featured: Some(Book {
                id: "muslim-1".to_string(),
                ..Default::default()
            }),
        };

        let decoded = ProtobufCodec::<Collection>::default()
            .decode(&prost::Message::encode_to_vec(&newer))
            .expect("older reader tolerates newer fields");
        assert_eq!(decoded.id, "muslim");
        assert_eq!(decoded.title, "Sahih Muslim");
    }

    #[test]
    fn nested_decode_stops_at_length_boundary() {
        let response = ListBooksResponse {
            books: vec![
                Book {
                    id: "b1".to_string(),
                    title: "Revelation".to_string(),
                    ..Default::default()
                },
                Book {
                    id: "b2".to_string(),
                    title: "Belief".to_string(),
                    ..Default::default()
                },
            ],
        };

        let codec = ProtobufCodec::<ListBooksResponse>::default();
        let decoded = codec
            .decode(&codec.encode(&response).expect("encode"))
            .expect("decode");
        assert_eq!(decoded.books.len(), 2);
        assert_eq!(decoded.books[0].title, "Revelation");
        assert_eq!(decoded.books[1].id, "b2");
    }

    #[test]
    fn truncated_bytes_fail_to_decode() {
        let codec = ProtobufCodec::<Collection>::default();
        let bytes = codec
            .encode(&Collection {
                id: "abudawud".to_string(),
                ..Default::default()
            })
            .expect("encode");

        let err = codec
            .decode(&bytes[..bytes.len() - 2])
            .expect_err("truncated body");
        assert!(matches!(err, CodecError::Decode { message: "Collection", .. }));
    }

    #[test]
    fn json_codec_reports_content_type_and_errors() {
        let codec = JsonCodec::<TelemetryAck>::default();
        assert_eq!(codec.content_type(), CONTENT_TYPE_JSON);
        assert_eq!(
            codec.decode(br#"{"accepted":3}"#).expect("decode").accepted,
            3
        );
        assert!(codec.decode(b"not json").is_err());
    }
}
