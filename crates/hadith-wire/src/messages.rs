//! Protobuf messages for catalog and account operations.
//!
//! Field numbers are part of the contract with the backend; never reuse a
//! retired number.

// ============================================================================
// Catalog entities
// ============================================================================

#[derive(Clone, PartialEq, prost::Message)]
pub struct Collection {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub title: String,
    #[prost(string, tag = "3")]
    pub short_description: String,
    #[prost(string, tag = "4")]
    pub language: String,
    #[prost(uint32, tag = "5")]
    pub book_count: u32,
    #[prost(uint32, tag = "6")]
    pub hadith_count: u32,
    #[prost(bool, tag = "7")]
    pub has_books: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Book {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub collection_id: String,
    /// Display number; some collections use non-numeric book numbers.
    #[prost(string, tag = "3")]
    pub number: String,
    #[prost(string, tag = "4")]
    pub title: String,
    #[prost(uint32, tag = "5")]
    pub hadith_start: u32,
    #[prost(uint32, tag = "6")]
    pub hadith_end: u32,
    #[prost(uint32, tag = "7")]
    pub hadith_count: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Chapter {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub book_id: String,
    #[prost(string, tag = "3")]
    pub number: String,
    #[prost(string, tag = "4")]
    pub title: String,
    #[prost(string, tag = "5")]
    pub preface: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Grade {
    #[prost(string, tag = "1")]
    pub source: String,
    #[prost(string, tag = "2")]
    pub grade: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Hadith {
    #[prost(string, tag = "1")]
    pub urn: String,
    #[prost(string, tag = "2")]
    pub collection_id: String,
    #[prost(string, tag = "3")]
    pub book_number: String,
    #[prost(string, tag = "4")]
    pub chapter_id: String,
    #[prost(string, tag = "5")]
    pub number: String,
    #[prost(string, tag = "6")]
    pub text: String,
    #[prost(string, tag = "7")]
    pub narrator: String,
    #[prost(message, repeated, tag = "8")]
    pub grades: Vec<Grade>,
}

// ============================================================================
// Catalog requests and responses
// ============================================================================

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListCollectionsRequest {
    #[prost(string, tag = "1")]
    pub language: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListCollectionsResponse {
    #[prost(message, repeated, tag = "1")]
    pub collections: Vec<Collection>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetCollectionRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub language: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetCollectionResponse {
    #[prost(message, optional, tag = "1")]
    pub collection: Option<Collection>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListBooksRequest {
    #[prost(string, tag = "1")]
    pub collection_id: String,
    #[prost(string, tag = "2")]
    pub language: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListBooksResponse {
    #[prost(message, repeated, tag = "1")]
    pub books: Vec<Book>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetBookRequest {
    #[prost(string, tag = "1")]
    pub collection_id: String,
    #[prost(string, tag = "2")]
    pub book_number: String,
    #[prost(string, tag = "3")]
    pub language: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetBookResponse {
    #[prost(message, optional, tag = "1")]
    pub book: Option<Book>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListChaptersRequest {
    #[prost(string, tag = "1")]
    pub collection_id: String,
    #[prost(string, tag = "2")]
    pub book_number: String,
    #[prost(string, tag = "3")]
    pub language: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListChaptersResponse {
    #[prost(message, repeated, tag = "1")]
    pub chapters: Vec<Chapter>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListHadithsRequest {
    #[prost(string, tag = "1")]
    pub collection_id: String,
    #[prost(string, tag = "2")]
    pub book_number: String,
    #[prost(string, tag = "3")]
    pub language: String,
    #[prost(uint32, tag = "4")]
    pub page: u32,
    #[prost(uint32, tag = "5")]
    pub limit: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListHadithsResponse {
    #[prost(message, repeated, tag = "1")]
    pub hadiths: Vec<Hadith>,
    #[prost(uint32, tag = "2")]
    pub total: u32,
    /// Zero when there is no further page.
    #[prost(uint32, tag = "3")]
    pub next_page: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetHadithRequest {
    #[prost(string, tag = "1")]
    pub urn: String,
    #[prost(string, tag = "2")]
    pub language: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetHadithResponse {
    #[prost(message, optional, tag = "1")]
    pub hadith: Option<Hadith>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SearchRequest {
    #[prost(string, tag = "1")]
    pub query: String,
    #[prost(string, tag = "2")]
    pub language: String,
    #[prost(string, tag = "3")]
    pub collection_id: String,
    #[prost(uint32, tag = "4")]
    pub page: u32,
    #[prost(uint32, tag = "5")]
    pub limit: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SearchResponse {
    #[prost(message, repeated, tag = "1")]
    pub hadiths: Vec<Hadith>,
    #[prost(uint32, tag = "2")]
    pub total: u32,
}

// ============================================================================
// Accounts
// ============================================================================

#[derive(Clone, PartialEq, prost::Message)]
pub struct User {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub username: String,
    #[prost(string, tag = "3")]
    pub email: String,
    #[prost(bool, tag = "4")]
    pub email_verified: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LoginRequest {
    #[prost(string, tag = "1")]
    pub username: String,
    #[prost(string, tag = "2")]
    pub password: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RegisterRequest {
    #[prost(string, tag = "1")]
    pub username: String,
    #[prost(string, tag = "2")]
    pub email: String,
    #[prost(string, tag = "3")]
    pub password: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AuthResponse {
    #[prost(string, tag = "1")]
    pub token: String,
    #[prost(message, optional, tag = "2")]
    pub user: Option<User>,
    /// Unix seconds.
    #[prost(int64, tag = "3")]
    pub expires_at: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CurrentUserRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CurrentUserResponse {
    #[prost(message, optional, tag = "1")]
    pub user: Option<User>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UserSettings {
    #[prost(string, tag = "1")]
    pub language: String,
    #[prost(string, tag = "2")]
    pub theme: String,
    #[prost(uint32, tag = "3")]
    pub font_size: u32,
    #[prost(bool, tag = "4")]
    pub show_arabic: bool,
    #[prost(bool, tag = "5")]
    pub show_translation: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetSettingsRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UpdateSettingsRequest {
    #[prost(message, optional, tag = "1")]
    pub settings: Option<UserSettings>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SettingsResponse {
    #[prost(message, optional, tag = "1")]
    pub settings: Option<UserSettings>,
}
