pub mod api;
pub mod cache;
pub mod error;
pub mod feed;
pub mod library;
pub mod storage;

pub use error::*;

pub use catapi_client::{Breed, BreedWithDetails, CatImage};
