use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

/// Endpoints and credentials for the external service collaborators. Every
/// field has a usable default; the refiner stays off until configured.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub nominatim_url: String,
    pub osrm_url: String,
    pub user_agent: String,
    pub refiner: Option<RefinerConfig>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RefinerConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            osrm_url: "https://router.project-osrm.org".to_string(),
            user_agent: concat!("roampilot/", env!("CARGO_PKG_VERSION")).to_string(),
            refiner: None,
        }
    }
}

impl ServiceConfig {
    /// Load from a JSON file. A missing file yields the defaults; an
    /// unreadable or malformed file is the caller's problem.
    pub fn load(path: &Path) -> Result<ServiceConfig> {
        if !path.exists() {
            return Ok(ServiceConfig::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
