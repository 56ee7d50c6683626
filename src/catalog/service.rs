use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::{join_all, try_join};
use hadith_wire::messages;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::model::{Book, Collection, CollectionWithBooks, NavigationCollection, books_from_wire};
use crate::cache::{CacheConfig, CacheKey, Flight, Flights, ResponseCache};
use crate::rpc::{ApiError, RpcClient};

/// The reads the catalog cache memoizes.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn list_collections(&self, language: &str)
    -> Result<Vec<messages::Collection>, ApiError>;

    /// `Ok(None)` when the collection does not exist.
    async fn get_collection(
        &self,
        id: &str,
        language: &str,
    ) -> Result<Option<messages::Collection>, ApiError>;

    async fn list_books(
        &self,
        collection_id: &str,
        language: &str,
    ) -> Result<Vec<messages::Book>, ApiError>;
}

#[async_trait]
impl CatalogBackend for RpcClient {
    async fn list_collections(
        &self,
        language: &str,
    ) -> Result<Vec<messages::Collection>, ApiError> {
        Ok(RpcClient::list_collections(self, language).await?.collections)
    }

    async fn get_collection(
        &self,
        id: &str,
        language: &str,
    ) -> Result<Option<messages::Collection>, ApiError> {
        match RpcClient::get_collection(self, id, language).await {
            Ok(response) => Ok(response.collection),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn list_books(
        &self,
        collection_id: &str,
        language: &str,
    ) -> Result<Vec<messages::Book>, ApiError> {
        Ok(RpcClient::list_books(self, collection_id, language)
            .await?
            .books)
    }
}

/// Cache-backed catalog reads used by page rendering.
///
/// Backend failures never reach the caller: they are logged and the read
/// degrades to an empty list or `None`, and nothing is cached for them.
pub struct CatalogService<B = RpcClient> {
    backend: Arc<B>,
    cache: Arc<dyn ResponseCache>,
    config: CacheConfig,
    flights: Arc<Flights>,
    language: String,
}

impl<B> Clone for CatalogService<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
            flights: Arc::clone(&self.flights),
            language: self.language.clone(),
        }
    }
}

impl<B: CatalogBackend> CatalogService<B> {
    pub fn new(backend: Arc<B>, cache: Arc<dyn ResponseCache>, config: CacheConfig) -> Self {
        Self {
            backend,
            cache,
            config,
            flights: Arc::new(Flights::new()),
            language: String::new(),
        }
    }

    /// Same cache and backend, reads in another language.
    pub fn with_language(&self, language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..self.clone()
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub async fn list_collections(&self) -> Vec<Collection> {
        let key = CacheKey::collections(&self.language);
        let load = async {
            let collections = self.backend.list_collections(&self.language).await?;
            Ok::<_, ApiError>(Some(
                collections
                    .into_iter()
                    .map(Collection::from)
                    .collect::<Vec<_>>(),
            ))
        };
        self.cached(key, self.config.collections_ttl, load)
            .await
            .unwrap_or_default()
    }

    pub async fn get_collection_with_books(&self, id: &str) -> Option<CollectionWithBooks> {
        let key = CacheKey::collection_with_books(id, &self.language);
        let load = async {
            let (collection, books) = try_join(
                self.backend.get_collection(id, &self.language),
                self.backend.list_books(id, &self.language),
            )
            .await?;
            Ok::<_, ApiError>(collection.map(|collection| CollectionWithBooks {
                collection: collection.into(),
                books: books_from_wire(books),
            }))
        };
        self.cached(key, self.config.collection_detail_ttl, load)
            .await
    }

    /// Collection list for the sidebar.
    ///
    /// Books are fetched up front for the first
    /// [`navigation_preload_limit`](CacheConfig::navigation_preload_limit)
    /// collections; collections without books get an empty list, everything
    /// else is left as `None` for lazy expansion. A failed preload leaves
    /// that collection as `None` instead of failing the whole list.
    pub async fn list_collections_with_preloaded_books(&self) -> Vec<NavigationCollection> {
        let key = CacheKey::navigation(&self.language);
        let load = async {
            let collections: Vec<Collection> = self
                .backend
                .list_collections(&self.language)
                .await?
                .into_iter()
                .map(Collection::from)
                .collect();

            let limit = self.config.navigation_preload_limit;
            let preloads = collections.iter().enumerate().map(|(index, collection)| {
                self.preload_books(collection, index < limit)
            });
            let books = join_all(preloads).await;

            Ok::<_, ApiError>(Some(
                collections
                    .into_iter()
                    .zip(books)
                    .map(|(collection, books)| NavigationCollection { collection, books })
                    .collect::<Vec<_>>(),
            ))
        };
        self.cached(key, self.config.navigation_ttl, load)
            .await
            .unwrap_or_default()
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    async fn preload_books(&self, collection: &Collection, within_limit: bool) -> Option<Vec<Book>> {
        match collection.declared_books() {
            Some(0) => Some(Vec::new()),
            _ if !within_limit => None,
            _ => match self
                .backend
                .list_books(&collection.id, &self.language)
                .await
            {
                Ok(books) => Some(books_from_wire(books)),
                Err(err) => {
                    warn!(
                        collection = %collection.id,
                        error = %err,
                        "book preload failed; leaving collection for lazy load"
                    );
                    None
                }
            },
        }
    }

    /// Read-through for one key.
    ///
    /// With single-flight enabled, concurrent misses wait for the first one
    /// and take its outcome, including a degraded one.
    async fn cached<T, F>(&self, key: CacheKey, ttl: Duration, load: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<Option<T>, ApiError>>,
    {
        let rendered = key.render();
        if let Some(hit) = self.read::<T>(&rendered).await {
            return Some(hit);
        }
        if !self.config.single_flight {
            return self.load_and_store(&rendered, ttl, load).await;
        }

        match self.flights.enter(&key) {
            Flight::Leader(leader) => {
                // A previous flight may have filled the entry since the first read.
                let value = match self.read::<T>(&rendered).await {
                    Some(hit) => Some(hit),
                    None => self.load_and_store(&rendered, ttl, load).await,
                };
                leader.settle(value.as_ref().and_then(|value| encode(&rendered, value)));
                value
            }
            Flight::Follower(follower) => match follower.settled().await {
                Some(Some(bytes)) => decode(&rendered, &bytes),
                Some(None) => None,
                None => {
                    debug!(key = %rendered, "flight abandoned; loading directly");
                    self.load_and_store(&rendered, ttl, load).await
                }
            },
        }
    }

    async fn load_and_store<T, F>(&self, key: &str, ttl: Duration, load: F) -> Option<T>
    where
        T: Serialize,
        F: Future<Output = Result<Option<T>, ApiError>>,
    {
        match load.await {
            Ok(Some(value)) => {
                if let Some(bytes) = encode(key, &value) {
                    self.cache.set(key, bytes, ttl).await;
                }
                Some(value)
            }
            Ok(None) => {
                debug!(key, "backend returned nothing; not caching");
                None
            }
            Err(err) => {
                warn!(
                    key,
                    status = err.status,
                    error = %err,
                    "catalog read failed; serving empty result"
                );
                None
            }
        }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.cache.get(key).await?;
        decode(key, &bytes)
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Option<Bytes> {
    match serde_json::to_vec(value) {
        Ok(bytes) => Some(Bytes::from(bytes)),
        Err(err) => {
            warn!(key, error = %err, "failed to serialize cache entry");
            None
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Option<T> {
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "discarding undecodable cache entry");
            None
        }
    }
}
