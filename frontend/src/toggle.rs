//! Mute/solo/record/monitor toggles shared by a track's row and strip.
//!
//! A toggle is planned from the state the user sees, sent to the engine,
//! and written to the buttons only as far as the engine accepted it.

use mixdesk_types::{ToggleFlag, TrackInfo, TrackUpdate};
use tracing::{debug, warn};

use crate::engine::{Engine, EngineError};

/// The four boolean controls of one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagSet {
    pub mute: bool,
    pub solo: bool,
    pub record: bool,
    pub monitor: bool,
}

impl FlagSet {
    pub fn from_track(track: &TrackInfo) -> Self {
        Self {
            mute: track.mute,
            solo: track.solo,
            record: track.record,
            monitor: track.monitor,
        }
    }

    pub fn get(&self, flag: ToggleFlag) -> bool {
        match flag {
            ToggleFlag::Mute => self.mute,
            ToggleFlag::Solo => self.solo,
            ToggleFlag::Record => self.record,
            ToggleFlag::Monitor => self.monitor,
        }
    }

    pub fn set(&mut self, flag: ToggleFlag, value: bool) {
        match flag {
            ToggleFlag::Mute => self.mute = value,
            ToggleFlag::Solo => self.solo = value,
            ToggleFlag::Record => self.record = value,
            ToggleFlag::Monitor => self.monitor = value,
        }
    }
}

/// What one click will change, computed from the visible state at click time.
#[derive(Debug, Clone, PartialEq)]
pub struct TogglePlan {
    pub flag: ToggleFlag,
    pub value: bool,
    /// Complementary flag forced off because `flag` is being switched on
    pub forced: Option<ToggleFlag>,
}

impl TogglePlan {
    /// Invert `flag`. Switching mute or solo on always forces the other one off,
    /// whatever this console last saw of it.
    pub fn new(flag: ToggleFlag, current: FlagSet) -> Self {
        let value = !current.get(flag);
        let forced = if value { flag.exclusive_with() } else { None };
        Self {
            flag,
            value,
            forced,
        }
    }

    /// Every flag change of the plan in sending order. The forced-off flag goes
    /// first so the engine never holds mute and solo together.
    pub fn changes(&self) -> impl Iterator<Item = (ToggleFlag, bool)> + '_ {
        self.forced
            .map(|forced| (forced, false))
            .into_iter()
            .chain(std::iter::once((self.flag, self.value)))
    }

    /// Engine commands in sending order.
    pub fn commands(&self) -> Vec<TrackUpdate> {
        self.changes().map(|(flag, value)| flag.update(value)).collect()
    }

    pub fn applied_to(&self, mut flags: FlagSet) -> FlagSet {
        for (flag, value) in self.changes() {
            flags.set(flag, value);
        }
        flags
    }
}

/// What the engine accepted of a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleOutcome {
    /// Accepted flag changes, in sending order
    pub confirmed: Vec<(ToggleFlag, bool)>,
    /// Rejection that stopped the rest of the plan
    pub error: Option<EngineError>,
}

impl ToggleOutcome {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// A visual twin that displays the toggle buttons of a track.
pub trait ToggleSink {
    fn set_flag(&mut self, flag: ToggleFlag, active: bool);
}

/// Toggle operation for one track, shared by its row and strip buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleGroup {
    track_name: String,
}

impl ToggleGroup {
    pub fn new(track_name: impl Into<String>) -> Self {
        Self {
            track_name: track_name.into(),
        }
    }

    pub fn track_name(&self) -> &str {
        &self.track_name
    }

    pub fn plan(&self, flag: ToggleFlag, current: FlagSet) -> TogglePlan {
        TogglePlan::new(flag, current)
    }

    /// Send the plan's commands in order, stopping at the first rejection.
    /// Changes the engine accepted before that stay confirmed.
    pub async fn send<E: Engine + ?Sized>(&self, engine: &E, plan: &TogglePlan) -> ToggleOutcome {
        let mut confirmed = Vec::new();
        for (flag, value) in plan.changes() {
            let update = flag.update(value);
            let description = update.description();
            match engine.update_track(&self.track_name, update).await {
                Ok(()) => {
                    debug!("Updated track {}: {}", self.track_name, description);
                    confirmed.push((flag, value));
                }
                Err(e) => {
                    warn!(
                        "Failed to update track {} ({}): {}",
                        self.track_name, description, e
                    );
                    return ToggleOutcome {
                        confirmed,
                        error: Some(e),
                    };
                }
            }
        }
        ToggleOutcome {
            confirmed,
            error: None,
        }
    }

    /// Write confirmed changes to every twin.
    pub fn apply(confirmed: &[(ToggleFlag, bool)], sinks: &mut [&mut dyn ToggleSink]) {
        for sink in sinks.iter_mut() {
            for (flag, value) in confirmed {
                sink.set_flag(*flag, *value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::MockEngine;

    #[derive(Default)]
    struct Buttons(FlagSet);

    impl ToggleSink for Buttons {
        fn set_flag(&mut self, flag: ToggleFlag, active: bool) {
            self.0.set(flag, active);
        }
    }

    fn soloed(name: &str) -> TrackInfo {
        let mut track = TrackInfo::new(name);
        track.solo = true;
        track
    }

    #[test]
    fn test_plan_inverts_flag() {
        let plan = TogglePlan::new(ToggleFlag::Record, FlagSet::default());
        assert!(plan.value);
        assert_eq!(plan.forced, None);
        assert_eq!(plan.commands(), vec![TrackUpdate::Record(true)]);

        let on = FlagSet {
            record: true,
            ..FlagSet::default()
        };
        let plan = TogglePlan::new(ToggleFlag::Record, on);
        assert_eq!(plan.commands(), vec![TrackUpdate::Record(false)]);
    }

    #[test]
    fn test_mute_on_forces_solo_off_first() {
        let current = FlagSet {
            solo: true,
            ..FlagSet::default()
        };
        let plan = TogglePlan::new(ToggleFlag::Mute, current);
        assert_eq!(
            plan.commands(),
            vec![TrackUpdate::Solo(false), TrackUpdate::Mute(true)]
        );

        let after = plan.applied_to(current);
        assert!(after.mute);
        assert!(!after.solo);
    }

    #[test]
    fn test_forced_command_sent_even_when_complement_looks_off() {
        let plan = TogglePlan::new(ToggleFlag::Solo, FlagSet::default());
        assert_eq!(plan.forced, Some(ToggleFlag::Mute));
        assert_eq!(
            plan.commands(),
            vec![TrackUpdate::Mute(false), TrackUpdate::Solo(true)]
        );
    }

    #[test]
    fn test_solo_on_forces_mute_off() {
        let current = FlagSet {
            mute: true,
            ..FlagSet::default()
        };
        let after = TogglePlan::new(ToggleFlag::Solo, current).applied_to(current);
        assert!(after.solo);
        assert!(!after.mute);
    }

    #[test]
    fn test_switching_off_forces_nothing() {
        let current = FlagSet {
            mute: true,
            solo: true,
            ..FlagSet::default()
        };
        let plan = TogglePlan::new(ToggleFlag::Mute, current);
        assert_eq!(plan.forced, None);
        assert_eq!(plan.commands(), vec![TrackUpdate::Mute(false)]);
    }

    #[test]
    fn test_apply_writes_every_sink() {
        let mut row = Buttons::default();
        let mut strip = Buttons(FlagSet {
            solo: true,
            ..FlagSet::default()
        });
        row.0.solo = true;

        let plan = TogglePlan::new(ToggleFlag::Mute, row.0);
        let changes: Vec<_> = plan.changes().collect();
        ToggleGroup::apply(&changes, &mut [&mut row, &mut strip]);

        assert_eq!(row.0, strip.0);
        assert!(row.0.mute && !row.0.solo);
    }

    #[tokio::test]
    async fn test_send_in_order() {
        let track = soloed("Vox");
        let engine = MockEngine::with_tracks(vec![track.clone()]);
        let group = ToggleGroup::new("Vox");

        let plan = group.plan(ToggleFlag::Mute, FlagSet::from_track(&track));
        let outcome = group.send(&engine, &plan).await;

        assert!(outcome.is_complete());
        assert_eq!(
            outcome.confirmed,
            vec![(ToggleFlag::Solo, false), (ToggleFlag::Mute, true)]
        );
        assert_eq!(
            engine.updates(),
            vec![
                ("Vox".to_string(), TrackUpdate::Solo(false)),
                ("Vox".to_string(), TrackUpdate::Mute(true)),
            ]
        );
    }

    #[tokio::test]
    async fn test_rejected_forced_command_stops_the_plan() {
        let track = soloed("Vox");
        let engine = MockEngine::with_tracks(vec![track.clone()]);
        engine.reject_when(|_, update| matches!(update, TrackUpdate::Solo(false)));
        let group = ToggleGroup::new("Vox");

        let plan = group.plan(ToggleFlag::Mute, FlagSet::from_track(&track));
        let outcome = group.send(&engine, &plan).await;

        assert!(!outcome.is_complete());
        assert!(outcome.confirmed.is_empty());
        assert_eq!(engine.updates().len(), 1);
        let engine_track = engine.track("Vox").unwrap();
        assert!(!engine_track.mute && engine_track.solo);
    }

    #[tokio::test]
    async fn test_rejected_primary_keeps_forced_change() {
        let track = soloed("Vox");
        let engine = MockEngine::with_tracks(vec![track.clone()]);
        engine.reject_when(|_, update| matches!(update, TrackUpdate::Mute(_)));
        let group = ToggleGroup::new("Vox");

        let plan = group.plan(ToggleFlag::Mute, FlagSet::from_track(&track));
        let outcome = group.send(&engine, &plan).await;

        assert!(outcome.error.is_some());
        assert_eq!(outcome.confirmed, vec![(ToggleFlag::Solo, false)]);
        let engine_track = engine.track("Vox").unwrap();
        assert!(!engine_track.mute && !engine_track.solo);
    }
}
