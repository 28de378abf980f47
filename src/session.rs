use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::journey::SavedJourney;
use crate::source::{SampleSource, SourceEvent, WatchOptions};
use crate::tracker::{Clock, SystemClock, Tracker, TrackerSnapshot, TrackingStatus};

const PROJECTOR_TICK: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Resume,
    Stop,
    Clear,
}

/// Receives every finalized journey, typically to append it to a store.
pub type JourneySink = Box<dyn FnMut(SavedJourney) + Send>;

/// Handle to a running tracking session. Cloneable; the session task ends
/// when every handle is gone.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<TrackerSnapshot>,
}

impl SessionHandle {
    pub fn start(&self) {
        self.send(Command::Start);
    }

    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    pub fn resume(&self) {
        self.send(Command::Resume);
    }

    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    pub fn clear(&self) {
        self.send(Command::Clear);
    }

    fn send(&self, command: Command) {
        // fire and forget, a closed loop means the session already ended
        let _ = self.commands.send(command);
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> TrackerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that observes every snapshot update.
    pub fn watch(&self) -> watch::Receiver<TrackerSnapshot> {
        self.snapshots.clone()
    }
}

/// Spawn the session event loop: a single task owning the tracker, fed by
/// user commands, source events, and the one-second projector tick.
pub fn spawn(
    source: Box<dyn SampleSource>,
    options: WatchOptions,
    on_save: JourneySink,
) -> SessionHandle {
    spawn_with_clock(source, options, on_save, Arc::new(SystemClock))
}

pub fn spawn_with_clock(
    source: Box<dyn SampleSource>,
    options: WatchOptions,
    on_save: JourneySink,
    clock: Arc<dyn Clock>,
) -> SessionHandle {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(TrackerSnapshot::default());
    let tracker = Tracker::new(source, options, event_tx, clock);
    tokio::spawn(run(tracker, command_rx, event_rx, snapshot_tx, on_save));
    SessionHandle {
        commands: command_tx,
        snapshots: snapshot_rx,
    }
}

async fn run(
    mut tracker: Tracker,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut events: mpsc::UnboundedReceiver<SourceEvent>,
    snapshots: watch::Sender<TrackerSnapshot>,
    mut on_save: JourneySink,
) {
    let mut ticker = tokio::time::interval(PROJECTOR_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        let was_tracking = tracker.status() == TrackingStatus::Tracking;
        tokio::select! {
            command = commands.recv() => match command {
                None => break,
                Some(Command::Start) => tracker.start(),
                Some(Command::Pause) => tracker.pause(),
                Some(Command::Resume) => tracker.resume(),
                Some(Command::Stop) => {
                    if let Some(journey) = tracker.stop() {
                        on_save(journey);
                    }
                }
                Some(Command::Clear) => tracker.clear(),
            },
            event = events.recv() => match event {
                None => break,
                Some(event) => tracker.handle_event(event),
            },
            _ = ticker.tick(), if was_tracking => tracker.tick(),
        }
        if !was_tracking && tracker.status() == TrackingStatus::Tracking {
            // a fresh active interval gets a fresh tick schedule
            ticker.reset();
        }
        let _ = snapshots.send(tracker.snapshot());
    }
    // tear down any live subscription before the tracker drops
    tracker.clear();
    debug!("tracking session loop ended");
}
