use serde::{Deserialize, Serialize};

use crate::geo::GeoSample;

/// Minimum number of samples a path needs before it can be finalized into a
/// journey. Export payloads share the same threshold.
pub const MIN_JOURNEY_SAMPLES: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalStats {
    pub speed_kmh: f64,
    pub avg_speed_kmh: f64,
}

/// One finalized tracking session. Immutable once created; it leaves the
/// store only through explicit deletion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedJourney {
    pub path: Vec<GeoSample>,
    pub distance_meters: f64,
    pub duration_secs: f64,
    pub created_at_ms: i64,
    pub final_stats: FinalStats,
}

/// Package a completed path and its accumulators into a journey record.
/// Returns `None` when the path is too short to be worth saving.
pub fn finalize(
    path: &[GeoSample],
    distance_meters: f64,
    active_duration_secs: f64,
    stopped_at_ms: i64,
) -> Option<SavedJourney> {
    if path.len() < MIN_JOURNEY_SAMPLES {
        return None;
    }
    let avg_speed_kmh = if active_duration_secs > 0.0 {
        (distance_meters / 1000.0) / (active_duration_secs / 3600.0)
    } else {
        0.0
    };
    Some(SavedJourney {
        path: path.to_vec(),
        distance_meters,
        duration_secs: active_duration_secs.round(),
        created_at_ms: stopped_at_ms,
        // tracking has ended, so the instantaneous figure is zero
        final_stats: FinalStats {
            speed_kmh: 0.0,
            avg_speed_kmh,
        },
    })
}
