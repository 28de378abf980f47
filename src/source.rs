use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::geo::GeoSample;

/// Watch configuration recognized by sample sources, mirroring the usual
/// platform location-API knobs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Maximum acceptable age of a cached fix. Zero means the source must
    /// deliver fresh fixes only.
    pub max_sample_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        WatchOptions {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            max_sample_age: Duration::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeoErrorKind {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Unknown,
}

impl GeoErrorKind {
    pub fn message(&self) -> &'static str {
        match self {
            GeoErrorKind::PermissionDenied => {
                "Location permission denied. Please enable it in your settings."
            }
            GeoErrorKind::PositionUnavailable => "Location information is unavailable.",
            GeoErrorKind::Timeout => "The request to get the current location timed out.",
            GeoErrorKind::Unknown => "An unknown error occurred while fetching the location.",
        }
    }
}

impl fmt::Display for GeoErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// What a subscribed source pushes into its sink.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceEvent {
    Sample(GeoSample),
    Failure(GeoErrorKind),
}

pub type SampleSink = mpsc::UnboundedSender<SourceEvent>;

/// The geo sample source boundary. Implementations wrap a platform location
/// API (or a replay/simulation) and push fixes at whatever rate the sensor
/// produces them.
pub trait SampleSource: Send {
    /// Start pushing events into `sink`. Must not block. Subscribing while
    /// already subscribed replaces the previous sink.
    fn subscribe(&mut self, options: &WatchOptions, sink: SampleSink);

    /// Stop pushing events. Idempotent: calling it while not subscribed is a
    /// no-op, not a fault.
    fn unsubscribe(&mut self);
}
