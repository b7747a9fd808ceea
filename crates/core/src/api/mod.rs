//! Client for the contest HTTP collaborator: rider roster, carriers, parks and scorecard history.

pub mod timestamp;

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::contest::{Carrier, Rider, Scorecard, ScorecardPage};

pub const DEFAULT_BASE_URL: &str = "https://koesterventures.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid url '{0}'")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{path} answered {status}")]
    Status { path: String, status: StatusCode },
    #[error("{path} reported failure")]
    Rejected { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Park {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    data: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RiderResponse {
    pub success: bool,
    pub rider_id: String,
}

#[derive(Debug, Clone)]
pub struct ContestApi {
    base: Url,
    client: Client,
}

impl ContestApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base =
            Url::parse(base_url).map_err(|_| ApiError::InvalidUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let joined = format!("{}{}", self.base.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|_| ApiError::InvalidUrl(joined))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        log::debug!("GET {}", url);
        let response = self.client.get(url).query(query).send().await?;
        Self::checked(path, response).await
    }

    async fn checked<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ApiError::Status {
                path: path.to_string(),
                status,
            });
        }
        Ok(response.json::<T>().await?)
    }

    /// Registered riders sorted by full name.
    pub async fn fetch_riders(&self) -> Result<Vec<Rider>, ApiError> {
        let mut riders = self.get::<Listing<Rider>>("/riders", &[]).await?.data;
        riders.sort_by_key(|r| r.full_name());
        log::info!("Fetched {} riders", riders.len());
        Ok(riders)
    }

    pub async fn fetch_contest_carriers(&self) -> Result<Vec<Carrier>, ApiError> {
        let carriers = self
            .get::<Listing<Carrier>>("/contest/carriers", &[])
            .await?
            .data;
        log::info!("Fetched {} carriers", carriers.len());
        Ok(carriers)
    }

    pub async fn fetch_parks(&self) -> Result<Vec<Park>, ApiError> {
        Ok(self.get::<Listing<Park>>("/parks", &[]).await?.data)
    }

    /// One page of scorecard history; pass the previous page's cursor to continue.
    pub async fn fetch_scorecards(&self, cursor: Option<&str>) -> Result<ScorecardPage, ApiError> {
        let query: Vec<(&str, &str)> = cursor
            .filter(|c| !c.is_empty())
            .map(|c| ("cursor", c))
            .into_iter()
            .collect();
        self.get("/scorecards", &query).await
    }

    pub async fn fetch_all_scorecards(&self) -> Result<Vec<Scorecard>, ApiError> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.fetch_scorecards(cursor.as_deref()).await?;
            let done = page.data.is_empty() || page.cursor.is_empty();
            all.extend(page.data);
            if done || cursor.as_deref() == Some(page.cursor.as_str()) {
                break;
            }
            cursor = Some(page.cursor);
        }
        Ok(all)
    }

    pub async fn create_rider(&self) -> Result<String, ApiError> {
        let path = "/riders/create";
        let response = self
            .client
            .post(self.endpoint(path)?)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;
        Self::rider_id(path, response).await
    }

    pub async fn update_rider(&self, rider: &Rider) -> Result<String, ApiError> {
        let path = "/riders/update";
        let response = self
            .client
            .post(self.endpoint(path)?)
            .json(rider)
            .send()
            .await?;
        Self::rider_id(path, response).await
    }

    async fn rider_id(path: &str, response: reqwest::Response) -> Result<String, ApiError> {
        let body: RiderResponse = Self::checked(path, response).await?;
        if !body.success {
            return Err(ApiError::Rejected {
                path: path.to_string(),
            });
        }
        log::info!("{} -> rider {}", path, body.rider_id);
        Ok(body.rider_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_onto_base() {
        let api = ContestApi::new("https://contest.example/").unwrap();
        assert_eq!(
            api.endpoint("/contest/carriers").unwrap().as_str(),
            "https://contest.example/contest/carriers"
        );

        let nested = ContestApi::new("http://127.0.0.1:8080/api").unwrap();
        assert_eq!(
            nested.endpoint("/riders").unwrap().as_str(),
            "http://127.0.0.1:8080/api/riders"
        );
    }

    #[test]
    fn rejects_unusable_base() {
        assert!(matches!(
            ContestApi::new("not a url"),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            ContestApi::new("mailto:judge@example.com"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn listing_and_rider_response_shapes() {
        let parks: Listing<Park> =
            serde_json::from_str(r#"{"data":[{"id":"p1","name":"Sunshine"}]}"#).unwrap();
        assert_eq!(parks.data[0].name, "Sunshine");

        let created: RiderResponse =
            serde_json::from_str(r#"{"success":true,"rider_id":"r-9"}"#).unwrap();
        assert!(created.success);
        assert_eq!(created.rider_id, "r-9");
    }
}
