use std::sync::Arc;
use std::time::Duration;

use catapi_client::{BreedWithDetails, CatImage};

use crate::cache::{CacheKey, QueryCache};
use crate::error::Result;
use crate::feed::{ImageFeed, ImageFilter, ImageSource};
use crate::library::FavouritesLibrary;
use crate::storage::KvStore;

/// Image listings change all the time; breed data and single images barely ever do.
pub const CACHE_TIME_SHORT: Duration = Duration::from_secs(60 * 5);
pub const CACHE_TIME_LONG: Duration = Duration::from_secs(60 * 60 * 24);

/// The gallery's composition root: one query cache, one remote source, one
/// favourites library. Built once at process start and handed to consumers by
/// reference; nothing here is global, so tests construct throwaway instances.
pub struct Gallery<S: ImageSource> {
    cache: Arc<QueryCache>,
    source: Arc<S>,
    favourites: FavouritesLibrary,
}

impl<S: ImageSource> Gallery<S> {
    pub fn new(source: S, store: KvStore) -> Self {
        Self {
            cache: Arc::new(QueryCache::new()),
            source: Arc::new(source),
            favourites: FavouritesLibrary::new(store),
        }
    }

    pub fn cache(&self) -> Arc<QueryCache> {
        self.cache.clone()
    }

    pub fn source(&self) -> Arc<S> {
        self.source.clone()
    }

    pub fn favourites(&self) -> &FavouritesLibrary {
        &self.favourites
    }

    /// All breeds with details. The list is small and nearly static, so it is
    /// fetched at most once per session and kept under one key for a long
    /// time; while any data is resident the fetch is skipped outright.
    pub async fn breeds(&self) -> Result<Vec<BreedWithDetails>> {
        let key = CacheKey::Breeds;
        if let Some(breeds) = self.cache.get_cached(&key) {
            return Ok(breeds);
        }
        self.cache.request(&key, CACHE_TIME_LONG, || self.source.breeds()).await
    }

    /// Look one breed up in the cached breeds list. An unknown id is a valid
    /// empty state, not an error.
    pub async fn breed(&self, breed_id: &str) -> Result<Option<BreedWithDetails>> {
        let breeds = self.breeds().await?;
        Ok(breeds.into_iter().find(|breed| breed.id == breed_id))
    }

    /// A single image by id. Passing a `known` image object, e.g. one already
    /// in hand from a listing, seeds the slot so no fetch happens at all.
    pub async fn image(&self, image_id: &str, known: Option<&CatImage>) -> Result<CatImage> {
        let key = CacheKey::Image { image_id: image_id.to_string() };
        if let Some(image) = known {
            self.cache.seed(&key, image, CACHE_TIME_LONG)?;
        }
        self.cache
            .request(&key, CACHE_TIME_LONG, || self.source.image(image_id))
            .await
    }

    /// One-shot listing of images, optionally filtered by breed.
    pub async fn images(&self, limit: u32, breed_ids: &[String]) -> Result<Vec<CatImage>> {
        let key = if breed_ids.is_empty() {
            CacheKey::Images { limit }
        } else {
            CacheKey::BreedImages { breed_ids: breed_ids.join(","), limit }
        };
        self.cache
            .request(&key, CACHE_TIME_SHORT, || self.source.search_images(limit, breed_ids, None))
            .await
    }

    /// Paginated feed for a filter. Feeds for the same filter share pages
    /// through the cache.
    pub fn feed(&self, filter: ImageFilter) -> ImageFeed<S> {
        ImageFeed::new(self.cache.clone(), self.source.clone(), filter)
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::cache::QueryState;

    fn image(id: &str) -> CatImage {
        CatImage {
            id: id.to_string(),
            url: format!("https://cdn2.thecatapi.com/images/{}.jpg", id),
            breeds: vec![],
        }
    }

    fn breed(id: &str, name: &str) -> BreedWithDetails {
        BreedWithDetails {
            id: id.to_string(),
            name: name.to_string(),
            image: None,
            origin: String::new(),
            temperament: String::new(),
            description: String::new(),
        }
    }

    #[derive(Default)]
    struct CountingSource {
        breeds_calls: AtomicUsize,
        image_calls: AtomicUsize,
        search_calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageSource for CountingSource {
        async fn breeds(&self) -> Result<Vec<BreedWithDetails>> {
            self.breeds_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![breed("beng", "Bengal"), breed("abys", "Abyssinian")])
        }

        async fn image(&self, image_id: &str) -> Result<CatImage> {
            self.image_calls.fetch_add(1, Ordering::SeqCst);
            Ok(image(image_id))
        }

        async fn search_images(&self, limit: u32, breed_ids: &[String], _page: Option<u32>) -> Result<Vec<CatImage>> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            let prefix = if breed_ids.is_empty() { "rand".to_string() } else { breed_ids.join("-") };
            Ok((0..limit).map(|i| image(&format!("{}-{}", prefix, i))).collect())
        }
    }

    fn gallery() -> (Gallery<CountingSource>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let gallery = Gallery::new(CountingSource::default(), KvStore::new(dir.path()));
        (gallery, dir)
    }

    #[tokio::test]
    async fn test_breeds_fetched_once_per_session() {
        let (gallery, _dir) = gallery();

        let breeds = gallery.breeds().await.unwrap();
        assert_eq!(breeds.len(), 2);
        gallery.breeds().await.unwrap();
        gallery.breeds().await.unwrap();

        assert_eq!(gallery.source().breeds_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_breed_lookup() {
        let (gallery, _dir) = gallery();

        let bengal = gallery.breed("beng").await.unwrap();
        assert_eq!(bengal.unwrap().name, "Bengal");

        // Unknown id is an empty result, not an error.
        assert!(gallery.breed("nope").await.unwrap().is_none());
        assert_eq!(gallery.source().breeds_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_known_image_seeds_the_slot() {
        let (gallery, _dir) = gallery();

        let known = image("xyz");
        let fetched = gallery.image("xyz", Some(&known)).await.unwrap();
        assert_eq!(fetched.id, "xyz");
        assert_eq!(gallery.source().image_calls.load(Ordering::SeqCst), 0);
        assert_eq!(gallery.cache().state(&CacheKey::Image { image_id: "xyz".to_string() }), QueryState::Resolved);
    }

    #[tokio::test]
    async fn test_image_fetched_then_cached() {
        let (gallery, _dir) = gallery();

        gallery.image("abc", None).await.unwrap();
        gallery.image("abc", None).await.unwrap();
        assert_eq!(gallery.source().image_calls.load(Ordering::SeqCst), 1);

        // A different id is a different slot.
        gallery.image("def", None).await.unwrap();
        assert_eq!(gallery.source().image_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_listings_are_keyed_by_limit_and_breeds() {
        let (gallery, _dir) = gallery();

        let images = gallery.images(5, &[]).await.unwrap();
        assert_eq!(images.len(), 5);
        gallery.images(5, &[]).await.unwrap();
        assert_eq!(gallery.source().search_calls.load(Ordering::SeqCst), 1);

        gallery.images(8, &[]).await.unwrap();
        gallery.images(5, &["beng".to_string()]).await.unwrap();
        assert_eq!(gallery.source().search_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_feed_shares_cache_with_gallery() {
        let (gallery, _dir) = gallery();

        let feed = gallery.feed(ImageFilter::Random).with_page_size(4);
        feed.load().await.unwrap();

        let again = gallery.feed(ImageFilter::Random).with_page_size(4);
        assert_eq!(again.pages().len(), 1);
        assert_eq!(gallery.source().search_calls.load(Ordering::SeqCst), 1);
    }
}
