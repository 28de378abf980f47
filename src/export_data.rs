use std::io::Write;

use anyhow::Result;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Metadata, Track, TrackSegment, Waypoint};
use itertools::Itertools;
use serde_json::json;
use strum_macros::{Display, EnumString};
use time::OffsetDateTime;

use crate::geo::GeoSample;
use crate::journey::MIN_JOURNEY_SAMPLES;

pub const GPX_CREATOR: &str = "RoamPilot";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    Gpx,
    GeoJson,
}

/// Download file name for an exported track, e.g.
/// `roampilot-route-1716200000000.gpx`.
pub fn export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("roampilot-route-{}.{}", timestamp_ms, format)
}

fn waypoint(sample: &GeoSample) -> Waypoint {
    let mut waypoint = Waypoint::new(Point::new(sample.point.longitude, sample.point.latitude));
    let nanos = sample.timestamp_ms as i128 * 1_000_000;
    if let Ok(time) = OffsetDateTime::from_unix_timestamp_nanos(nanos) {
        waypoint.time = Some(time.into());
    }
    waypoint
}

/// Build a GPX document for a tracked path: one track, one track segment,
/// an ISO-8601 timestamp per point. Returns `None` for paths under the
/// journey minimum.
pub fn track_to_gpx(path: &[GeoSample]) -> Option<Gpx> {
    if path.len() < MIN_JOURNEY_SAMPLES {
        return None;
    }
    let points = path.iter().map(waypoint).collect_vec();
    let track = Track {
        name: Some("Tracked Route".to_string()),
        comment: None,
        description: None,
        source: None,
        links: vec![],
        type_: None,
        number: None,
        segments: vec![TrackSegment { points }],
    };
    let metadata = Metadata {
        name: Some("RoamPilot Route".to_string()),
        time: Some(OffsetDateTime::now_utc().into()),
        ..Default::default()
    };
    Some(Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(GPX_CREATOR.to_string()),
        metadata: Some(metadata),
        waypoints: vec![],
        tracks: vec![track],
        routes: vec![],
    })
}

/// Serialize a tracked path as GPX into `writer`. Returns false without
/// writing anything when the path is under the journey minimum.
pub fn track_to_gpx_file<W: Write>(path: &[GeoSample], writer: W) -> Result<bool> {
    match track_to_gpx(path) {
        None => Ok(false),
        Some(gpx) => {
            gpx::write(&gpx, writer)?;
            Ok(true)
        }
    }
}

/// Build a GeoJSON `FeatureCollection` holding the tracked path as a single
/// `LineString` feature, coordinates as `[lon, lat]` in path order. Returns
/// `None` for paths under the journey minimum.
pub fn track_to_geojson(path: &[GeoSample]) -> Option<serde_json::Value> {
    if path.len() < MIN_JOURNEY_SAMPLES {
        return None;
    }
    let coordinates = path
        .iter()
        .map(|sample| [sample.point.longitude, sample.point.latitude])
        .collect_vec();
    Some(json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "LineString",
                    "coordinates": coordinates,
                },
            },
        ],
    }))
}

/// Serialize a tracked path as pretty-printed GeoJSON into `writer`.
/// Returns false without writing anything when the path is under the
/// journey minimum.
pub fn track_to_geojson_file<W: Write>(path: &[GeoSample], mut writer: W) -> Result<bool> {
    match track_to_geojson(path) {
        None => Ok(false),
        Some(geojson) => {
            serde_json::to_writer_pretty(&mut writer, &geojson)?;
            Ok(true)
        }
    }
}
