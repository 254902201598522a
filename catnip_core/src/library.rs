use std::sync::Mutex;

use catapi_client::CatImage;

use crate::storage::KvStore;

pub(crate) const STORAGE_KEY: &str = "favourite_images";

/// The user's favourite images, in insertion order.
///
/// The in-memory list is the source of truth; every mutation mirrors the full
/// list to the [`KvStore`] synchronously, so favourites survive restarts.
/// Favourite toggles are low-frequency user actions, so there is no batching.
///
/// Duplicate ids are permitted, matching how the gallery has always behaved:
/// adding the same image twice stores it twice, and removing an id drops every
/// occurrence.
#[derive(Debug)]
pub struct FavouritesLibrary {
    store: KvStore,
    images: Mutex<Vec<CatImage>>,
}

impl FavouritesLibrary {
    /// Load the persisted favourites, defaulting to an empty list when nothing
    /// was stored or the stored value cannot be read.
    pub fn new(store: KvStore) -> Self {
        let images = store.get::<Vec<CatImage>>(STORAGE_KEY).unwrap_or_default();
        Self {
            store,
            images: Mutex::new(images),
        }
    }

    pub fn add(&self, image: CatImage) {
        let mut images = self.images.lock().unwrap();
        tracing::info!("Added favourite image {}", image.id);
        images.push(image);
        self.store.set(STORAGE_KEY, &*images);
    }

    pub fn remove(&self, image_id: &str) {
        let mut images = self.images.lock().unwrap();
        images.retain(|image| image.id != image_id);
        self.store.set(STORAGE_KEY, &*images);
        tracing::info!("Removed favourite image {}", image_id);
    }

    /// Empty the list and delete the persisted key entirely.
    pub fn clear(&self) {
        let mut images = self.images.lock().unwrap();
        images.clear();
        self.store.remove(STORAGE_KEY);
        tracing::info!("Cleared favourite images");
    }

    pub fn is_favourite(&self, image_id: &str) -> bool {
        self.images.lock().unwrap().iter().any(|image| image.id == image_id)
    }

    pub fn all(&self) -> Vec<CatImage> {
        self.images.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.images.lock().unwrap().len()
    }
}
