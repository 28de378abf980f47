use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use roampilot_core::geo::{GeoPoint, GeoSample};
use roampilot_core::journey::SavedJourney;
use roampilot_core::source::{SampleSink, SampleSource, SourceEvent, WatchOptions};
use roampilot_core::tracker::Clock;

// a short walk up Regent Street, one block per sample
pub const WALK_START_LAT: f64 = 51.51;
pub const WALK_START_LNG: f64 = -0.14;
pub const WALK_LAT_STEP: f64 = 0.01;

pub fn point(latitude: f64, longitude: f64) -> GeoPoint {
    GeoPoint {
        latitude,
        longitude,
    }
}

pub fn sample(latitude: f64, longitude: f64, timestamp_ms: i64) -> GeoSample {
    GeoSample {
        point: point(latitude, longitude),
        timestamp_ms,
        speed_mps: None,
    }
}

pub fn sample_with_speed(
    latitude: f64,
    longitude: f64,
    timestamp_ms: i64,
    speed_mps: f64,
) -> GeoSample {
    GeoSample {
        point: point(latitude, longitude),
        timestamp_ms,
        speed_mps: Some(speed_mps),
    }
}

/// The kth sample of the reference walk: straight north, one step per
/// minute.
pub fn walk_sample(k: usize) -> GeoSample {
    sample(
        WALK_START_LAT + WALK_LAT_STEP * k as f64,
        WALK_START_LNG,
        60_000 * k as i64,
    )
}

pub fn walk_path(len: usize) -> Vec<GeoSample> {
    (0..len).map(walk_sample).collect()
}

/// A clock advanced by hand.
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Arc<ManualClock> {
        Arc::new(ManualClock {
            now_ms: AtomicI64::new(start_ms),
        })
    }

    pub fn advance_ms(&self, ms: i64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance_ms(secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// A clock that follows tokio's virtual time. Construct inside a paused
/// runtime and drive it with `tokio::time::advance`.
pub struct TokioTestClock {
    base: tokio::time::Instant,
    base_ms: i64,
}

impl TokioTestClock {
    pub fn new(base_ms: i64) -> Arc<TokioTestClock> {
        Arc::new(TokioTestClock {
            base: tokio::time::Instant::now(),
            base_ms,
        })
    }
}

impl Clock for TokioTestClock {
    fn now_ms(&self) -> i64 {
        self.base_ms + self.base.elapsed().as_millis() as i64
    }
}

#[derive(Default)]
pub struct ProbeState {
    pub subscribed: bool,
    pub subscribe_calls: usize,
    pub unsubscribe_calls: usize,
    pub last_options: Option<WatchOptions>,
    pub sink: Option<SampleSink>,
}

/// A sample source that records its subscription bookkeeping and pushes
/// events only when the test tells it to. Clones share state, so a test can
/// keep one clone and hand the other to the tracker.
#[derive(Clone, Default)]
pub struct SourceProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl SourceProbe {
    pub fn new() -> SourceProbe {
        SourceProbe::default()
    }

    pub fn subscribed(&self) -> bool {
        self.state.lock().unwrap().subscribed
    }

    pub fn subscribe_calls(&self) -> usize {
        self.state.lock().unwrap().subscribe_calls
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.state.lock().unwrap().unsubscribe_calls
    }

    pub fn last_options(&self) -> Option<WatchOptions> {
        self.state.lock().unwrap().last_options.clone()
    }

    /// Push an event through the sink captured at subscribe time. Events
    /// emitted while unsubscribed go nowhere, like a torn-down watch.
    pub fn emit(&self, event: SourceEvent) {
        let sink = self.state.lock().unwrap().sink.clone();
        if let Some(sink) = sink {
            let _ = sink.send(event);
        }
    }
}

impl SampleSource for SourceProbe {
    fn subscribe(&mut self, options: &WatchOptions, sink: SampleSink) {
        let mut state = self.state.lock().unwrap();
        state.subscribed = true;
        state.subscribe_calls += 1;
        state.last_options = Some(options.clone());
        state.sink = Some(sink);
    }

    fn unsubscribe(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.subscribed = false;
        state.unsubscribe_calls += 1;
        state.sink = None;
    }
}

/// Collects finalized journeys, for wiring into a session as its save
/// callback.
#[derive(Clone, Default)]
pub struct JourneyCollector {
    journeys: Arc<Mutex<Vec<SavedJourney>>>,
}

impl JourneyCollector {
    pub fn new() -> JourneyCollector {
        JourneyCollector::default()
    }

    pub fn push(&self, journey: SavedJourney) {
        self.journeys.lock().unwrap().push(journey);
    }

    pub fn journeys(&self) -> Vec<SavedJourney> {
        self.journeys.lock().unwrap().clone()
    }
}
