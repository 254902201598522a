use std::sync::Arc;

use async_trait::async_trait;

use catapi_client::{BreedWithDetails, CatApiClient, CatImage};
use catnip_util::parsing::parse_id_list;

use crate::cache::{CacheKey, QueryCache};
use crate::error::Result;

/// Number of images per feed page.
pub const PAGE_SIZE: u32 = 12;
/// Hard ceiling on pages per filter. The rendered list is not virtualized, so
/// accumulation has to stop somewhere even if the API never runs dry.
pub const MAX_PAGES: usize = 30;

/// Remote source of gallery data. The HTTP client is the production
/// implementation; tests substitute scripted sources.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn breeds(&self) -> Result<Vec<BreedWithDetails>>;
    async fn image(&self, image_id: &str) -> Result<CatImage>;
    async fn search_images(&self, limit: u32, breed_ids: &[String], page: Option<u32>) -> Result<Vec<CatImage>>;
}

#[async_trait]
impl ImageSource for CatApiClient {
    async fn breeds(&self) -> Result<Vec<BreedWithDetails>> {
        Ok(CatApiClient::breeds(self).await?)
    }

    async fn image(&self, image_id: &str) -> Result<CatImage> {
        Ok(CatApiClient::image(self, image_id).await?)
    }

    async fn search_images(&self, limit: u32, breed_ids: &[String], page: Option<u32>) -> Result<Vec<CatImage>> {
        Ok(CatApiClient::search_images(self, limit, breed_ids, page).await?)
    }
}

/// Which pool of images a feed paginates over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageFilter {
    Random,
    Breeds(Vec<String>),
}

impl ImageFilter {
    /// Derive a filter from the `breed` URL query param, a comma-separated id
    /// list. An empty or blank param means the unfiltered random pool.
    pub fn from_breed_param(param: &str) -> Self {
        let ids = parse_id_list(param);
        if ids.is_empty() {
            ImageFilter::Random
        } else {
            ImageFilter::Breeds(ids)
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        match self {
            ImageFilter::Random => CacheKey::RandomImages,
            ImageFilter::Breeds(ids) => CacheKey::RandomBreedImages { breed_ids: ids.join(",") },
        }
    }

    fn breed_ids(&self) -> &[String] {
        match self {
            ImageFilter::Random => &[],
            ImageFilter::Breeds(ids) => ids,
        }
    }
}

/// Paginated image feed for one filter.
///
/// Pages live in the query cache under the filter's key, so every feed handle
/// for the same filter shares one page collection, and page fetches for a key
/// are strictly sequential.
pub struct ImageFeed<S: ImageSource> {
    cache: Arc<QueryCache>,
    source: Arc<S>,
    filter: ImageFilter,
    page_size: u32,
}

impl<S: ImageSource> ImageFeed<S> {
    pub fn new(cache: Arc<QueryCache>, source: Arc<S>, filter: ImageFilter) -> Self {
        Self {
            cache,
            source,
            filter,
            page_size: PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn filter(&self) -> &ImageFilter {
        &self.filter
    }

    /// Pages fetched so far, oldest first.
    pub fn pages(&self) -> Vec<Vec<CatImage>> {
        self.cache.pages(&self.filter.cache_key())
    }

    /// All fetched images in display order.
    pub fn images(&self) -> Vec<CatImage> {
        self.pages().into_iter().flatten().collect()
    }

    /// Load the first page, unless this filter already has resident pages from
    /// earlier in the session. Back-navigation must not refetch.
    pub async fn load(&self) -> Result<Vec<Vec<CatImage>>> {
        let pages = self.pages();
        if !pages.is_empty() {
            tracing::debug!("Feed for {:?} already loaded, skipping fetch", self.filter);
            return Ok(pages);
        }
        self.fetch_page().await?;
        Ok(self.pages())
    }

    /// Whether another page may be requested: the last page was full (a short
    /// page means the API ran dry) and the page ceiling has not been reached.
    /// False before `load` has produced any page.
    pub fn has_next_page(&self) -> bool {
        let pages = self.pages();
        match pages.last() {
            Some(last) => last.len() >= self.page_size as usize && pages.len() < MAX_PAGES,
            None => false,
        }
    }

    /// Fetch the page after the last one. Returns `None` without a network
    /// call when the feed is exhausted or the ceiling is reached.
    pub async fn fetch_next_page(&self) -> Result<Option<Vec<CatImage>>> {
        if !self.has_next_page() {
            return Ok(None);
        }
        let page = self.fetch_page().await?;
        Ok(Some(page))
    }

    async fn fetch_page(&self) -> Result<Vec<CatImage>> {
        let key = self.filter.cache_key();
        let limit = self.page_size;
        let breed_ids = self.filter.breed_ids();
        self.cache
            .fetch_next_page(&key, |page| self.source.search_images(limit, breed_ids, Some(page)))
            .await
    }
}
