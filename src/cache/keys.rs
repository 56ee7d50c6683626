//! Cache key definitions.
//!
//! A key names the catalog read it memoizes plus every parameter that
//! influences the result.

use std::fmt;

use url::form_urlencoded;

/// Identifies one memoized catalog read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Full collection list.
    Collections { language: String },
    /// One collection together with all of its books.
    CollectionWithBooks { id: String, language: String },
    /// Collection list with books preloaded for the sidebar.
    Navigation { language: String },
}

impl CacheKey {
    pub fn collections(language: impl Into<String>) -> Self {
        Self::Collections {
            language: language.into(),
        }
    }

    pub fn collection_with_books(id: impl Into<String>, language: impl Into<String>) -> Self {
        Self::CollectionWithBooks {
            id: id.into(),
            language: language.into(),
        }
    }

    pub fn navigation(language: impl Into<String>) -> Self {
        Self::Navigation {
            language: language.into(),
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::Collections { .. } => "collections",
            Self::CollectionWithBooks { .. } => "collection_with_books",
            Self::Navigation { .. } => "navigation",
        }
    }

    fn params(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::Collections { language } | Self::Navigation { language } => {
                vec![("language", language.as_str())]
            }
            Self::CollectionWithBooks { id, language } => {
                vec![("id", id.as_str()), ("language", language.as_str())]
            }
        }
    }

    /// Deterministic string form, `operation?name=value&...`.
    ///
    /// Values are form-urlencoded, so no parameter value can forge a
    /// separator and two distinct keys never render the same.
    pub fn render(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (name, value) in self.params() {
            query.append_pair(name, value);
        }
        format!("{}?{}", self.operation(), query.finish())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
