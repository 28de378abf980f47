use std::sync::Arc;

use chrono::Utc;
use strum_macros::Display;

use crate::geo::GeoSample;
use crate::journey::{self, SavedJourney};
use crate::source::{GeoErrorKind, SampleSink, SampleSource, SourceEvent, WatchOptions};
use crate::utils;

const MPS_TO_KMH: f64 = 3.6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum TrackingStatus {
    #[default]
    Idle,
    Tracking,
    Paused,
}

/// Figures derived from the accumulators, refreshed on every sample and on
/// every projector tick. `duration_secs` is rounded to whole seconds; the
/// average always comes from the unrounded duration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackingStats {
    pub speed_kmh: f64,
    pub avg_speed_kmh: f64,
    pub distance_meters: f64,
    pub duration_secs: f64,
}

/// Immutable view of the tracker, published after every processed event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackerSnapshot {
    pub status: TrackingStatus,
    pub position: Option<GeoSample>,
    pub path: Vec<GeoSample>,
    pub stats: TrackingStats,
    pub error: Option<GeoErrorKind>,
}

pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/* The tracking state machine. It owns the sample source subscription so that
pause/stop can tear the subscription down synchronously before touching any
state, and it keeps both accumulators as plain fields:

`stats.distance_meters` grows by the great-circle distance between
consecutive samples, O(1) per sample, never recomputed from the full path.

`banked_duration_secs` holds the sum of all closed active intervals;
`active_since_ms` marks the start of the currently open one. Pausing closes
the open interval, resuming opens a new one, so time spent paused never
reaches the duration figure. */
pub struct Tracker {
    source: Box<dyn SampleSource>,
    options: WatchOptions,
    events: SampleSink,
    clock: Arc<dyn Clock>,

    status: TrackingStatus,
    position: Option<GeoSample>,
    path: Vec<GeoSample>,
    stats: TrackingStats,
    error: Option<GeoErrorKind>,
    // baseline for the next distance increment
    last_sample: Option<GeoSample>,
    active_since_ms: Option<i64>,
    banked_duration_secs: f64,
}

impl Tracker {
    pub fn new(
        source: Box<dyn SampleSource>,
        options: WatchOptions,
        events: SampleSink,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Tracker {
            source,
            options,
            events,
            clock,
            status: TrackingStatus::Idle,
            position: None,
            path: Vec::new(),
            stats: TrackingStats::default(),
            error: None,
            last_sample: None,
            active_since_ms: None,
            banked_duration_secs: 0.0,
        }
    }

    pub fn status(&self) -> TrackingStatus {
        self.status
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            status: self.status,
            position: self.position,
            path: self.path.clone(),
            stats: self.stats,
            error: self.error,
        }
    }

    /// Begin a fresh session. Ignored unless idle. Whatever an earlier
    /// session (or a sensor failure) left behind is discarded first.
    pub fn start(&mut self) {
        if self.status != TrackingStatus::Idle {
            return;
        }
        self.reset();
        self.status = TrackingStatus::Tracking;
        self.active_since_ms = Some(self.clock.now_ms());
        self.source.subscribe(&self.options, self.events.clone());
        info!("tracking started");
    }

    /// Suspend the session. Ignored unless tracking.
    pub fn pause(&mut self) {
        if self.status != TrackingStatus::Tracking {
            return;
        }
        // teardown must happen before the state changes below
        self.source.unsubscribe();
        self.close_active_interval();
        self.status = TrackingStatus::Paused;
        info!("tracking paused at {:.0}m", self.stats.distance_meters);
    }

    /// Continue a paused session. Ignored unless paused.
    pub fn resume(&mut self) {
        if self.status != TrackingStatus::Paused {
            return;
        }
        self.status = TrackingStatus::Tracking;
        self.active_since_ms = Some(self.clock.now_ms());
        // re-baseline on the pre-pause tail so the next distance increment
        // does not span the paused gap
        self.last_sample = self.path.last().copied();
        self.source.subscribe(&self.options, self.events.clone());
        info!("tracking resumed");
    }

    /// End the session. Returns the finalized journey when the path was long
    /// enough to save. The path and accumulators are reset either way; the
    /// last known position stays.
    pub fn stop(&mut self) -> Option<SavedJourney> {
        if self.status == TrackingStatus::Idle {
            return None;
        }
        self.source.unsubscribe();
        self.close_active_interval();
        let journey = journey::finalize(
            &self.path,
            self.stats.distance_meters,
            self.banked_duration_secs,
            self.clock.now_ms(),
        );
        match &journey {
            Some(journey) => info!(
                "tracking stopped, journey finalized: {:.0}m in {}",
                journey.distance_meters,
                utils::format_duration_secs(journey.duration_secs)
            ),
            None => info!("tracking stopped, path too short to save"),
        }
        self.status = TrackingStatus::Idle;
        self.path = Vec::new();
        self.stats = TrackingStats::default();
        self.last_sample = None;
        self.banked_duration_secs = 0.0;
        journey
    }

    /// Discard all tracking state, from any status, saving nothing.
    pub fn clear(&mut self) {
        self.source.unsubscribe();
        self.status = TrackingStatus::Idle;
        self.reset();
    }

    fn reset(&mut self) {
        self.position = None;
        self.path = Vec::new();
        self.stats = TrackingStats::default();
        self.error = None;
        self.last_sample = None;
        self.active_since_ms = None;
        self.banked_duration_secs = 0.0;
    }

    pub fn handle_event(&mut self, event: SourceEvent) {
        match event {
            SourceEvent::Sample(sample) => self.handle_sample(sample),
            SourceEvent::Failure(kind) => self.handle_failure(kind),
        }
    }

    /// Feed one sample. Samples arriving outside `Tracking` (teardown races
    /// a fix already in flight) are dropped without touching any state.
    pub fn handle_sample(&mut self, sample: GeoSample) {
        if self.status != TrackingStatus::Tracking {
            debug!("dropping sample while {}", self.status);
            return;
        }
        self.position = Some(sample);
        self.path.push(sample);
        if let Some(last) = &self.last_sample {
            self.stats.distance_meters += last.point.haversine_distance(&sample.point);
        }
        // an unreported sensor speed reads as zero, never as the stale value
        self.stats.speed_kmh = sample.speed_mps.unwrap_or(0.0) * MPS_TO_KMH;
        self.last_sample = Some(sample);
    }

    /// A sensor failure ends the session in place: the subscription is torn
    /// down and the collected path stays visible, but nothing is saved.
    pub fn handle_failure(&mut self, kind: GeoErrorKind) {
        self.source.unsubscribe();
        self.close_active_interval();
        self.status = TrackingStatus::Idle;
        self.error = Some(kind);
        warn!("sample source failed: {}", kind);
    }

    /// Project duration and average speed from the accumulators. A no-op
    /// outside `Tracking`, where the last published figures stay frozen.
    pub fn tick(&mut self) {
        if self.status != TrackingStatus::Tracking {
            return;
        }
        let duration_secs = self.projected_duration_secs();
        self.stats.duration_secs = duration_secs.round();
        self.stats.avg_speed_kmh = if duration_secs > 0.0 {
            (self.stats.distance_meters / 1000.0) / (duration_secs / 3600.0)
        } else {
            0.0
        };
    }

    fn close_active_interval(&mut self) {
        if let Some(started_ms) = self.active_since_ms.take() {
            self.banked_duration_secs += (self.clock.now_ms() - started_ms) as f64 / 1000.0;
        }
    }

    fn projected_duration_secs(&self) -> f64 {
        let open_interval_secs = match self.active_since_ms {
            Some(started_ms) => (self.clock.now_ms() - started_ms) as f64 / 1000.0,
            None => 0.0,
        };
        self.banked_duration_secs + open_interval_secs
    }
}
