//! Search index abstraction.

use async_trait::async_trait;
use edgar_client::{EdgarClient, PageQuery, SearchHit};

/// Source of paginated search hits.
///
/// Implemented by [`EdgarClient`] for production and by
/// [`MockSearchIndex`](crate::testing::MockSearchIndex) for tests.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Fetch one page of hits.
    async fn fetch_page(&self, query: &PageQuery) -> edgar_client::Result<Vec<SearchHit>>;

    /// Root used to build primary document URLs.
    fn archive_root(&self) -> &str;
}

#[async_trait]
impl SearchIndex for EdgarClient {
    async fn fetch_page(&self, query: &PageQuery) -> edgar_client::Result<Vec<SearchHit>> {
        self.search_page(query).await
    }

    fn archive_root(&self) -> &str {
        EdgarClient::archive_root(self)
    }
}
