mod error;
mod result;

use reqwest::{header, Client, Url};
use serde::de::DeserializeOwned;

use catnip_util::build_params;

pub use crate::error::Error;
use crate::error::Result;
pub use crate::result::*;

const BASE_URL: &str = "https://api.thecatapi.com";

#[derive(Debug, Clone)]
pub struct CatApiClient {
    client: reqwest::Client,
}

impl CatApiClient {
    /// Build a client that attaches the given API key to every request.
    pub fn new(api_key: &str) -> Result<CatApiClient> {
        let mut headers = header::HeaderMap::new();
        headers.insert("x-api-key", header::HeaderValue::from_str(api_key).unwrap());

        let client = Client::builder().default_headers(headers).build()?;

        Ok(CatApiClient { client })
    }

    pub async fn breeds(&self) -> Result<Vec<BreedWithDetails>> {
        self.get("/v1/breeds", vec![]).await
    }

    /// Fetch a single image by id. Breedless images come back with an empty
    /// `breeds` array rather than a missing field.
    pub async fn image(&self, image_id: &str) -> Result<CatImage> {
        self.get(&format!("/v1/images/{}", image_id), vec![]).await
    }

    /// Search images, optionally filtered to the given breeds and page.
    /// Pages are 1-based; the API signals exhaustion by returning a short page.
    pub async fn search_images(
        &self,
        limit: u32,
        breed_ids: &[String],
        page: Option<u32>,
    ) -> Result<Vec<CatImage>> {
        let params = build_params! {
            required limit,
            joined breed_ids,
            optional page,
        };
        self.get("/v1/images/search", params).await
    }

    async fn get<T>(&self, path: &str, query: Vec<(String, String)>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut url = Url::parse(BASE_URL)?;
        url.set_path(path);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let response = self.client.get(url).send().await?.error_for_status()?;
        let content = response.text().await?;

        log(path, &content).await?;
        let result = serde_json::from_str::<T>(&content)?;
        Ok(result)
    }
}

async fn log(path: &str, content: &str) -> Result<()> {
    use std::path::PathBuf;
    use tokio::{fs::File, io::AsyncWriteExt};

    if let Ok(dir) = std::env::var("CLIENT_LOG_DIR") {
        let name = path.trim_start_matches('/').replace('/', "_");
        let time = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let filepath = PathBuf::from(dir).join(format!("catapi_{}_{}.json", name, time));
        let mut file = File::create(filepath).await?;
        file.write_all(content.as_bytes()).await?;
    }
    Ok(())
}
