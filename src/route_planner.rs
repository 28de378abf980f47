use anyhow::Result;
use itertools::Itertools;
use serde::Deserialize;

use crate::config::ServiceConfig;
use crate::geo::GeoPoint;

#[derive(Clone, Debug, PartialEq)]
pub struct PlannedRoute {
    pub distance_meters: f64,
    pub duration_secs: f64,
    /// The route shape in path order.
    pub geometry: Vec<GeoPoint>,
}

#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

// GeoJSON geometry, coordinates are [lon, lat]
#[derive(Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Driving-route lookup against an OSRM endpoint.
pub struct RoutePlanner {
    client: reqwest::Client,
    base_url: String,
}

impl RoutePlanner {
    pub fn new(config: &ServiceConfig) -> Result<RoutePlanner> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()?;
        Ok(RoutePlanner {
            client,
            base_url: config.osrm_url.clone(),
        })
    }

    /// Plan a driving route between two points. `None` on any failure or
    /// when the service finds no route.
    pub async fn plan_route(&self, from: GeoPoint, to: GeoPoint) -> Option<PlannedRoute> {
        match self.try_plan_route(from, to).await {
            Ok(route) => route,
            Err(error) => {
                warn!("[route_planner] routing failed: {}", error);
                None
            }
        }
    }

    async fn try_plan_route(&self, from: GeoPoint, to: GeoPoint) -> Result<Option<PlannedRoute>> {
        // OSRM coordinates go lon,lat
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.base_url, from.longitude, from.latitude, to.longitude, to.latitude
        );
        let response = self
            .client
            .get(url)
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?
            .error_for_status()?;
        let raw = response.text().await?;
        parse_route(&raw)
    }
}

fn parse_route(raw: &str) -> Result<Option<PlannedRoute>> {
    let response: OsrmResponse = serde_json::from_str(raw)?;
    if response.code != "Ok" {
        return Ok(None);
    }
    match response.routes.into_iter().next() {
        None => Ok(None),
        Some(route) => Ok(Some(PlannedRoute {
            distance_meters: route.distance,
            duration_secs: route.duration,
            geometry: route
                .geometry
                .coordinates
                .into_iter()
                .map(|[longitude, latitude]| GeoPoint {
                    latitude,
                    longitude,
                })
                .collect_vec(),
        })),
    }
}
