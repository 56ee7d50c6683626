//! Sidebar tree: collections whose books load on first expansion.

mod loader;

use async_trait::async_trait;

pub use loader::{ChildFetcher, DEFAULT_FETCH_TIMEOUT, Expansion, HierarchicalLoader, NodeState};
pub(crate) use loader::METRIC_LOADER_FETCH;

use crate::catalog::{Book, Collection, NavigationCollection};
use crate::rpc::{ApiError, RpcClient};

/// Fetches a collection's books through [`RpcClient::list_books`].
#[derive(Clone)]
pub struct BookFetcher {
    client: RpcClient,
    language: String,
}

impl BookFetcher {
    pub fn new(client: RpcClient, language: impl Into<String>) -> Self {
        Self {
            client,
            language: language.into(),
        }
    }
}

#[async_trait]
impl ChildFetcher<String, Book> for BookFetcher {
    async fn fetch_children(&self, collection_id: &String) -> Result<Vec<Book>, ApiError> {
        let response = self.client.list_books(collection_id, &self.language).await?;
        Ok(response.books.into_iter().map(Book::from).collect())
    }
}

/// Loader keyed by collection id.
pub type SidebarLoader<F = BookFetcher> = HierarchicalLoader<String, Book, F>;

impl<F: ChildFetcher<String, Book>> HierarchicalLoader<String, Book, F> {
    /// Expands a collection, skipping the fetch when it declares no books.
    pub async fn expand_collection(&self, collection: &Collection) -> Expansion<Book> {
        self.expand(&collection.id, collection.declared_books())
            .await
    }

    /// Seeds every collection whose books came with the navigation list.
    pub fn seed_navigation(&self, navigation: &[NavigationCollection]) {
        for entry in navigation {
            if let Some(books) = &entry.books {
                self.seed(entry.collection.id.clone(), books.clone());
            }
        }
    }
}
