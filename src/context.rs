//! Wiring of client, cache, and sidebar loader from settings.

use std::sync::Arc;

use crate::cache::{MemoryCache, ResponseCache};
use crate::catalog::CatalogService;
use crate::config::Settings;
use crate::infra::error::InfraError;
use crate::rpc::{
    ErrorReporter, RpcClient, SessionToken, TokenSource, TracingReporter, Transport,
};
use crate::sidebar::{BookFetcher, SidebarLoader};

/// Everything one process needs to read the catalog.
pub struct ReaderContext {
    pub client: RpcClient,
    pub catalog: CatalogService,
    pub session: Arc<SessionToken>,
    language: String,
    fetch_timeout: std::time::Duration,
}

impl ReaderContext {
    pub fn new(settings: &Settings, language: impl Into<String>) -> Result<Self, InfraError> {
        Self::with_parts(
            settings,
            language,
            Arc::new(MemoryCache::new()),
            Arc::new(TracingReporter),
        )
    }

    /// Same as [`ReaderContext::new`] with an injected cache and reporter.
    pub fn with_parts(
        settings: &Settings,
        language: impl Into<String>,
        cache: Arc<dyn ResponseCache>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<Self, InfraError> {
        let session = Arc::new(SessionToken::new());
        let token_source: Arc<dyn TokenSource> = session.clone();
        let transport = Transport::new(&settings.api.transport_config(), reporter, token_source)
            .map_err(|err| InfraError::http_client(err.to_string()))?;
        let client = RpcClient::new(transport);
        let language = language.into();

        let catalog = CatalogService::new(Arc::new(client.clone()), cache, settings.cache.clone())
            .with_language(language.clone());

        Ok(Self {
            client,
            catalog,
            session,
            language,
            fetch_timeout: settings.loader.fetch_timeout,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// A fresh sidebar loader; one per page session.
    pub fn sidebar(&self) -> SidebarLoader {
        SidebarLoader::new(BookFetcher::new(self.client.clone(), self.language.clone()))
            .with_fetch_timeout(self.fetch_timeout)
    }
}
