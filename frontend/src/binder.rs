//! Track rows and channel strips built from the engine's track list.
//!
//! The binder owns the console's only copy of the track list. Every rebuild
//! throws away all pairs and their bindings and creates fresh ones under a
//! new generation, so inputs and command outcomes that still carry an old
//! [`PairId`] fall on the floor instead of touching the new pairs.
//!
//! Engine round trips run as tokio tasks that post a [`ConsoleMessage`]
//! back to the binder's inbox; the UI drains the inbox once per frame.

use std::sync::Arc;

use mixdesk_types::{MixdeskEvent, ToggleFlag, TrackInfo, TrackListResponse, TrackUpdate};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::engine::{Engine, EngineResult};
use crate::fader::{FaderController, FaderGeometry, FaderUpdate};
use crate::gain::gain_to_percent;
use crate::meter::{MeterDisplay, MeterSubscription, SampleRouter};
use crate::state::{ConnectionState, ConsoleMessage};
use crate::toggle::{FlagSet, ToggleGroup, ToggleOutcome, ToggleSink};

/// Fader size used until the UI reports the real one.
const DEFAULT_FADER_GEOMETRY: FaderGeometry = FaderGeometry {
    track_height: 160.0,
    thumb_height: 24.0,
};

/// Identity of one pair within one rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairId {
    generation: u64,
    index: usize,
}

impl PairId {
    pub fn new(generation: u64, index: usize) -> Self {
        Self { generation, index }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Which of the two representations of a track a control lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Twin {
    Row,
    Strip,
}

/// The toggle buttons of one twin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonSet {
    flags: FlagSet,
}

impl ButtonSet {
    pub fn new(flags: FlagSet) -> Self {
        Self { flags }
    }

    pub fn flags(&self) -> FlagSet {
        self.flags
    }

    pub fn is_active(&self, flag: ToggleFlag) -> bool {
        self.flags.get(flag)
    }
}

impl ToggleSink for ButtonSet {
    fn set_flag(&mut self, flag: ToggleFlag, active: bool) {
        self.flags.set(flag, active);
    }
}

/// Inline rename in progress on a track row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEdit {
    pub text: String,
    /// Why the last commit was refused, shown next to the field
    pub problem: Option<String>,
    /// A rename command is in flight
    pub pending: bool,
}

/// The track-list representation of a track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRow {
    pub buttons: ButtonSet,
    pub edit: Option<RenameEdit>,
}

/// The mixer representation of a track.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStrip {
    pub buttons: ButtonSet,
    pub fader: FaderController,
    pub meter: MeterDisplay,
}

/// One track bound to its row and its strip.
#[derive(Debug)]
pub struct VisualPair {
    id: PairId,
    track: TrackInfo,
    toggles: ToggleGroup,
    pub row: TrackRow,
    pub strip: ChannelStrip,
    meter_subscription: MeterSubscription,
    /// Latest fader gain waiting for the track's gain task
    gain_lane: Option<watch::Sender<f32>>,
}

impl VisualPair {
    fn new(id: PairId, track: TrackInfo, meter_subscription: MeterSubscription) -> Self {
        let flags = FlagSet::from_track(&track);
        let fader = FaderController::new(DEFAULT_FADER_GEOMETRY, gain_to_percent(track.gain));
        Self {
            id,
            toggles: ToggleGroup::new(track.name.clone()),
            row: TrackRow {
                buttons: ButtonSet::new(flags),
                edit: None,
            },
            strip: ChannelStrip {
                buttons: ButtonSet::new(flags),
                fader,
                meter: MeterDisplay::new(),
            },
            track,
            meter_subscription,
            gain_lane: None,
        }
    }

    pub fn id(&self) -> PairId {
        self.id
    }

    pub fn track(&self) -> &TrackInfo {
        &self.track
    }

    pub fn name(&self) -> &str {
        &self.track.name
    }

    /// Visible toggle state. Row and strip always agree.
    pub fn flags(&self) -> FlagSet {
        self.row.buttons.flags()
    }
}

/// User gestures addressed to the console.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    /// A toggle button on either twin was clicked
    Toggle {
        pair: PairId,
        twin: Twin,
        flag: ToggleFlag,
    },
    /// Double-click on a row's name label
    BeginRename { pair: PairId },
    /// Text typed into the rename field
    EditRename { pair: PairId, text: String },
    /// Rename field lost focus or Enter was pressed
    CommitRename { pair: PairId },
    /// Escape pressed in the rename field
    CancelRename { pair: PairId },
    /// Pointer pressed on a fader thumb
    FaderDown { pair: PairId, pointer_y: f32 },
    /// Pointer moved anywhere
    PointerMove { pointer_y: f32 },
    /// Pointer released anywhere
    PointerUp,
    /// Wheel over a fader; positive `delta_y` scrolls down
    Wheel {
        pair: PairId,
        delta_y: f32,
        fine: bool,
    },
    /// The UI laid the fader out at a new size
    FaderResized {
        pair: PairId,
        geometry: FaderGeometry,
    },
    AddTrack,
    RemoveTrack { pair: PairId },
    Refresh,
}

type Repaint = Arc<dyn Fn() + Send + Sync>;

/// Builds and drives the pairs for the current track list.
pub struct TrackRowBinder<E: Engine> {
    engine: Arc<E>,
    tx: UnboundedSender<ConsoleMessage>,
    rx: UnboundedReceiver<ConsoleMessage>,
    repaint: Repaint,
    /// Last fetched track list, sorted by name
    tracks: Vec<TrackInfo>,
    pairs: Vec<VisualPair>,
    generation: u64,
    router: SampleRouter,
    next_list_request: u64,
    applied_list_request: u64,
    connection: ConnectionState,
    status: Option<String>,
}

impl<E: Engine> TrackRowBinder<E> {
    pub fn new(engine: Arc<E>) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            engine,
            tx,
            rx,
            repaint: Arc::new(|| {}),
            tracks: Vec::new(),
            pairs: Vec::new(),
            generation: 0,
            router: SampleRouter::new(),
            next_list_request: 0,
            applied_list_request: 0,
            connection: ConnectionState::Disconnected,
            status: None,
        }
    }

    /// Called whenever a message lands in the inbox from another task.
    pub fn set_repaint(&mut self, repaint: impl Fn() + Send + Sync + 'static) {
        self.repaint = Arc::new(repaint);
    }

    /// Sender for the event stream and other producers.
    pub fn sender(&self) -> UnboundedSender<ConsoleMessage> {
        self.tx.clone()
    }

    pub fn pairs(&self) -> &[VisualPair] {
        &self.pairs
    }

    pub fn pair(&self, id: PairId) -> Option<&VisualPair> {
        self.live_index(id).map(|index| &self.pairs[index])
    }

    /// The engine's track list as of the last rebuild.
    pub fn tracks(&self) -> &[TrackInfo] {
        &self.tracks
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of live sample listeners. Torn-down pairs leave none behind.
    pub fn bindings(&self) -> usize {
        self.router.len()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Last user-visible failure, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    // ------------------------------------------------------------------
    // Inbox
    // ------------------------------------------------------------------

    /// Apply every queued message. Returns how many were handled.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.process(message);
            handled += 1;
        }
        handled
    }

    /// Wait for the next message and apply it.
    pub async fn pump(&mut self) {
        if let Some(message) = self.rx.recv().await {
            self.process(message);
        }
    }

    fn spawn<F>(&self, future: F)
    where
        F: std::future::Future<Output = Option<ConsoleMessage>> + Send + 'static,
    {
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        tokio::spawn(async move {
            if let Some(message) = future.await {
                if tx.send(message).is_ok() {
                    repaint();
                }
            }
        });
    }

    fn process(&mut self, message: ConsoleMessage) {
        match message {
            ConsoleMessage::TrackListLoaded { request, result } => {
                self.on_track_list(request, result)
            }
            ConsoleMessage::ToggleDone { pair, outcome } => self.on_toggle_done(pair, outcome),
            ConsoleMessage::RenameDone {
                pair,
                new_name,
                result,
            } => self.on_rename_done(pair, new_name, result),
            ConsoleMessage::TrackAdded(result) => match result {
                Ok(()) => self.refresh(),
                Err(e) => self.report(format!("Failed to add track: {}", e)),
            },
            ConsoleMessage::TrackRemoved { track_name, result } => match result {
                Ok(()) => {
                    info!("Removed track {}", track_name);
                    self.refresh();
                }
                Err(e) => self.report(format!("Failed to remove track {}: {}", track_name, e)),
            },
            ConsoleMessage::Event(event) => self.on_event(event),
            ConsoleMessage::ConnectionStateChanged(state) => {
                let reconnected = state.is_connected() && !self.connection.is_connected();
                self.connection = state;
                if reconnected {
                    // Catch up on whatever changed while we were away
                    self.refresh();
                }
            }
        }
    }

    fn report(&mut self, message: String) {
        warn!("{}", message);
        self.status = Some(message);
    }

    // ------------------------------------------------------------------
    // Rebuild
    // ------------------------------------------------------------------

    /// Fetch the track list and rebuild every pair from it.
    pub fn refresh(&mut self) {
        self.next_list_request += 1;
        let request = self.next_list_request;
        let engine = self.engine.clone();
        self.spawn(async move {
            let result = engine.get_track_list().await;
            Some(ConsoleMessage::TrackListLoaded { request, result })
        });
    }

    fn on_track_list(&mut self, request: u64, result: EngineResult<TrackListResponse>) {
        if request < self.applied_list_request {
            debug!("Ignoring outdated track list (request {})", request);
            return;
        }
        match result {
            Ok(list) => {
                self.applied_list_request = request;
                self.rebuild(list.tracks);
            }
            Err(e) => self.report(format!("Failed to load track list: {}", e)),
        }
    }

    /// Replace every pair with fresh ones for `tracks`.
    pub fn rebuild(&mut self, mut tracks: Vec<TrackInfo>) {
        self.teardown();

        tracks.sort_by(|a, b| a.name.cmp(&b.name));
        self.generation += 1;
        let generation = self.generation;

        let mut pairs = Vec::with_capacity(tracks.len());
        for (index, track) in tracks.iter().enumerate() {
            let id = PairId::new(generation, index);
            let subscription = self.router.subscribe(&track.name, id);
            pairs.push(VisualPair::new(id, track.clone(), subscription));
        }

        self.pairs = pairs;
        self.tracks = tracks;
        self.status = None;
        debug!(
            "Rebuilt console: {} tracks, generation {}, {} bindings",
            self.pairs.len(),
            generation,
            self.bindings()
        );
    }

    fn teardown(&mut self) {
        for pair in self.pairs.drain(..) {
            self.router.unsubscribe(&pair.meter_subscription);
        }
    }

    fn live_index(&self, id: PairId) -> Option<usize> {
        if id.generation != self.generation {
            return None;
        }
        self.pairs.get(id.index).filter(|p| p.id == id).map(|_| id.index)
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    pub fn handle(&mut self, input: ConsoleInput) {
        match input {
            ConsoleInput::Toggle { pair, twin, flag } => self.toggle(pair, twin, flag),
            ConsoleInput::BeginRename { pair } => self.begin_rename(pair),
            ConsoleInput::EditRename { pair, text } => {
                if let Some(edit) = self.edit_mut(pair) {
                    edit.text = text;
                }
            }
            ConsoleInput::CommitRename { pair } => self.commit_rename(pair),
            ConsoleInput::CancelRename { pair } => {
                if let Some(index) = self.live_index(pair) {
                    self.pairs[index].row.edit = None;
                }
            }
            ConsoleInput::FaderDown { pair, pointer_y } => {
                if let Some(index) = self.live_index(pair) {
                    self.pairs[index].strip.fader.pointer_down(pointer_y);
                } else {
                    trace!("Ignoring fader grab on stale pair {:?}", pair);
                }
            }
            ConsoleInput::PointerMove { pointer_y } => self.pointer_move(pointer_y),
            ConsoleInput::PointerUp => {
                for pair in &mut self.pairs {
                    pair.strip.fader.pointer_up();
                }
            }
            ConsoleInput::Wheel {
                pair,
                delta_y,
                fine,
            } => {
                if let Some(index) = self.live_index(pair) {
                    if let Some(update) = self.pairs[index].strip.fader.wheel(delta_y, fine) {
                        self.send_gain(index, update);
                    }
                }
            }
            ConsoleInput::FaderResized { pair, geometry } => {
                if let Some(index) = self.live_index(pair) {
                    self.pairs[index].strip.fader.set_geometry(geometry);
                }
            }
            ConsoleInput::AddTrack => self.add_empty_track(),
            ConsoleInput::RemoveTrack { pair } => self.remove_track(pair),
            ConsoleInput::Refresh => self.refresh(),
        }
    }

    fn toggle(&mut self, pair: PairId, twin: Twin, flag: ToggleFlag) {
        let Some(index) = self.live_index(pair) else {
            debug!("Ignoring {:?} {:?} toggle on stale pair {:?}", twin, flag, pair);
            return;
        };

        let pair_ref = &self.pairs[index];
        let plan = pair_ref.toggles.plan(flag, pair_ref.flags());
        let group = pair_ref.toggles.clone();
        let engine = self.engine.clone();
        self.spawn(async move {
            let outcome = group.send(engine.as_ref(), &plan).await;
            Some(ConsoleMessage::ToggleDone { pair, outcome })
        });
    }

    /// Render what the engine confirmed. A rejection is already logged by the
    /// toggle group and leaves the rest of the plan unrendered.
    fn on_toggle_done(&mut self, pair: PairId, outcome: ToggleOutcome) {
        let Some(index) = self.live_index(pair) else {
            debug!("Dropping toggle outcome for stale pair {:?}", pair);
            return;
        };

        let pair = &mut self.pairs[index];
        let mut twins: [&mut dyn ToggleSink; 2] = [&mut pair.row.buttons, &mut pair.strip.buttons];
        ToggleGroup::apply(&outcome.confirmed, &mut twins);
        for &(flag, value) in &outcome.confirmed {
            pair.track.apply(&flag.update(value));
            self.tracks[index].apply(&flag.update(value));
        }
    }

    fn pointer_move(&mut self, pointer_y: f32) {
        let updates: Vec<(usize, FaderUpdate)> = self
            .pairs
            .iter_mut()
            .enumerate()
            .filter_map(|(index, pair)| {
                pair.strip
                    .fader
                    .pointer_move(pointer_y)
                    .map(|update| (index, update))
            })
            .collect();
        for (index, update) in updates {
            self.send_gain(index, update);
        }
    }

    /// Fire-and-forget gain command. The fader stays where the user put it.
    /// Gains go out one at a time per track. Moves made while a command is
    /// in flight collapse into the latest value.
    fn send_gain(&mut self, index: usize, update: FaderUpdate) {
        let pair = &mut self.pairs[index];
        pair.track.gain = update.gain;
        self.tracks[index].gain = update.gain;

        if let Some(lane) = &pair.gain_lane {
            if lane.send(update.gain).is_ok() {
                return;
            }
        }

        let (lane, latest) = watch::channel(update.gain);
        pair.gain_lane = Some(lane);
        tokio::spawn(run_gain_lane(
            self.engine.clone(),
            pair.track.name.clone(),
            latest,
        ));
    }

    fn edit_mut(&mut self, pair: PairId) -> Option<&mut RenameEdit> {
        let index = self.live_index(pair)?;
        self.pairs[index].row.edit.as_mut()
    }

    fn begin_rename(&mut self, pair: PairId) {
        if let Some(index) = self.live_index(pair) {
            let pair = &mut self.pairs[index];
            if pair.row.edit.is_none() {
                pair.row.edit = Some(RenameEdit {
                    text: pair.track.name.clone(),
                    problem: None,
                    pending: false,
                });
            }
        }
    }

    fn commit_rename(&mut self, pair: PairId) {
        let Some(index) = self.live_index(pair) else {
            return;
        };
        let current = self.pairs[index].track.name.clone();
        let Some(edit) = self.pairs[index].row.edit.as_ref() else {
            return;
        };
        if edit.pending {
            return;
        }

        let new_name = edit.text.trim().to_string();
        let problem = if new_name == current {
            self.pairs[index].row.edit = None;
            return;
        } else if new_name.is_empty() {
            Some("Track name cannot be empty".to_string())
        } else if self
            .tracks
            .iter()
            .enumerate()
            .any(|(i, t)| i != index && t.name == new_name)
        {
            Some(format!("A track named '{}' already exists", new_name))
        } else {
            None
        };

        if let Some(edit) = self.pairs[index].row.edit.as_mut() {
            edit.problem = problem.clone();
            edit.pending = problem.is_none();
        }
        if problem.is_some() {
            return;
        }

        info!("Renaming track {} to {}", current, new_name);
        let engine = self.engine.clone();
        self.spawn(async move {
            let result = engine
                .update_track(&current, TrackUpdate::Name(new_name.clone()))
                .await;
            Some(ConsoleMessage::RenameDone {
                pair,
                new_name,
                result,
            })
        });
    }

    fn on_rename_done(&mut self, pair: PairId, new_name: String, result: EngineResult<()>) {
        let Some(index) = self.live_index(pair) else {
            debug!("Dropping rename outcome for stale pair {:?}", pair);
            return;
        };
        match result {
            Ok(()) => {
                self.pairs[index].row.edit = None;
                self.refresh();
            }
            Err(e) => {
                warn!("Failed to rename track to {}: {}", new_name, e);
                if let Some(edit) = self.pairs[index].row.edit.as_mut() {
                    edit.pending = false;
                    edit.problem = Some(e.to_string());
                }
            }
        }
    }

    /// Ask the engine for a new empty track, then rebuild.
    pub fn add_empty_track(&mut self) {
        let engine = self.engine.clone();
        self.spawn(async move { Some(ConsoleMessage::TrackAdded(engine.add_empty_track().await)) });
    }

    /// Ask the engine to drop a track, then rebuild.
    pub fn remove_track(&mut self, pair: PairId) {
        let Some(index) = self.live_index(pair) else {
            return;
        };
        let track_name = self.pairs[index].track.name.clone();
        let engine = self.engine.clone();
        self.spawn(async move {
            let result = engine.remove_track(&track_name).await;
            Some(ConsoleMessage::TrackRemoved { track_name, result })
        });
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    fn on_event(&mut self, event: MixdeskEvent) {
        match event {
            MixdeskEvent::TrackListChanged => {
                debug!("Track list changed, rebuilding");
                self.refresh();
            }
            MixdeskEvent::AudioSamples { track_name, sample } => {
                match self.router.route(&track_name).and_then(|id| self.live_index(id)) {
                    Some(index) => self.pairs[index].strip.meter.on_sample(sample),
                    None => trace!("No meter for track {}", track_name),
                }
            }
            MixdeskEvent::Ping => trace!("Received ping event"),
        }
    }
}

/// Send gains for one track until its pair is torn down, always the
/// newest one. A value set before the teardown is still delivered.
async fn run_gain_lane<E: Engine>(
    engine: Arc<E>,
    track_name: String,
    mut latest: watch::Receiver<f32>,
) {
    loop {
        let gain = *latest.borrow_and_update();
        if let Err(e) = engine
            .update_track(&track_name, TrackUpdate::Gain(gain))
            .await
        {
            warn!("Failed to set gain of track {}: {}", track_name, e);
        }
        if latest.changed().await.is_err() {
            break;
        }
    }
    trace!("Gain lane of track {} closed", track_name);
}
