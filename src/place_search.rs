use anyhow::Result;
use itertools::Itertools;
use serde::Deserialize;

use crate::config::ServiceConfig;
use crate::query_refine::QueryRefiner;

#[derive(Clone, Debug, PartialEq)]
pub struct Place {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

// the subset of a Nominatim hit we care about; coordinates arrive as strings
#[derive(Deserialize)]
struct NominatimPlace {
    place_id: i64,
    lat: String,
    lon: String,
    display_name: String,
}

/// Free-text place search against a Nominatim endpoint, optionally running
/// the query through the refiner first.
pub struct PlaceSearcher {
    client: reqwest::Client,
    base_url: String,
    refiner: Option<QueryRefiner>,
}

impl PlaceSearcher {
    pub fn new(config: &ServiceConfig) -> Result<PlaceSearcher> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()?;
        let refiner = config
            .refiner
            .clone()
            .map(|refiner_config| QueryRefiner::new(client.clone(), refiner_config));
        Ok(PlaceSearcher {
            client,
            base_url: config.nominatim_url.clone(),
            refiner,
        })
    }

    /// Search for places matching a free-text query, ordered as the service
    /// returned them. Any failure (refinement, transport, decode) degrades
    /// to an empty list.
    pub async fn search(&self, query: &str) -> Vec<Place> {
        match self.try_search(query).await {
            Ok(places) => places,
            Err(error) => {
                warn!("[place_search] query {:?} failed: {}", query, error);
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &str) -> Result<Vec<Place>> {
        let query = match &self.refiner {
            None => query.to_string(),
            Some(refiner) => refiner.refine(query).await?,
        };
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("format", "json"), ("q", query.as_str())])
            .send()
            .await?
            .error_for_status()?;
        let raw = response.text().await?;
        parse_places(&raw)
    }
}

fn parse_places(raw: &str) -> Result<Vec<Place>> {
    let hits: Vec<NominatimPlace> = serde_json::from_str(raw)?;
    Ok(hits.into_iter().filter_map(to_place).collect_vec())
}

// hits with unparsable coordinates are dropped
fn to_place(hit: NominatimPlace) -> Option<Place> {
    let latitude = hit.lat.parse().ok()?;
    let longitude = hit.lon.parse().ok()?;
    Some(Place {
        id: hit.place_id,
        latitude,
        longitude,
        display_name: hit.display_name,
    })
}
