use serde::{Deserialize, Serialize};

/// A single cat image. The API nests at most one breed per image, and omits
/// the field entirely for breedless images; deserialization normalizes that to
/// an empty list so downstream code never sees a missing array.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CatImage {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub breeds: Vec<Breed>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Breed {
    pub id: String,
    pub name: String,
}

/// Full breed record, produced only by the breeds-list endpoint. The API
/// omits the reference image and the text fields for a handful of breeds, so
/// all of them default.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BreedWithDetails {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<CatImage>,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub temperament: String,
    #[serde(default)]
    pub description: String,
}

impl From<&BreedWithDetails> for Breed {
    fn from(breed: &BreedWithDetails) -> Self {
        Self {
            id: breed.id.clone(),
            name: breed.name.clone(),
        }
    }
}
