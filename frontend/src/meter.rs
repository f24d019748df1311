//! Level meters and the routing of inbound samples to them.

use std::collections::HashMap;

use crate::binder::PairId;
use crate::gain::{meter_position, sample_to_meter_fraction};

/// Displayed level of one channel strip.
///
/// Every sample replaces the previous one; there is no decay.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterDisplay {
    fraction: f32,
    readout: String,
}

impl MeterDisplay {
    pub fn new() -> Self {
        Self {
            fraction: 0.0,
            readout: format_readout(0.0),
        }
    }

    pub fn on_sample(&mut self, sample: f32) {
        self.fraction = sample_to_meter_fraction(sample);
        self.readout = format_readout(self.fraction);
    }

    /// Level in 0..=1.
    pub fn fraction(&self) -> f32 {
        self.fraction
    }

    /// Top-anchored position of the level edge, 0 is the top.
    pub fn position(&self) -> f32 {
        meter_position(self.fraction)
    }

    pub fn readout(&self) -> &str {
        &self.readout
    }
}

impl Default for MeterDisplay {
    fn default() -> Self {
        Self::new()
    }
}

fn format_readout(fraction: f32) -> String {
    format!("{:.0}%", fraction * 100.0)
}

/// Handle for a meter listening to `<track>-audio-samples`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterSubscription {
    track_name: String,
    pair: PairId,
}

impl MeterSubscription {
    pub fn track_name(&self) -> &str {
        &self.track_name
    }

    pub fn pair(&self) -> PairId {
        self.pair
    }
}

/// Maps track names to the pair whose meter shows them.
#[derive(Debug, Default)]
pub struct SampleRouter {
    listeners: HashMap<String, PairId>,
}

impl SampleRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen for samples of `track_name`. Replaces any earlier listener.
    pub fn subscribe(&mut self, track_name: &str, pair: PairId) -> MeterSubscription {
        self.listeners.insert(track_name.to_string(), pair);
        MeterSubscription {
            track_name: track_name.to_string(),
            pair,
        }
    }

    /// Stop listening. A subscription that was already replaced is left alone.
    pub fn unsubscribe(&mut self, subscription: &MeterSubscription) -> bool {
        if self.listeners.get(&subscription.track_name) == Some(&subscription.pair) {
            self.listeners.remove(&subscription.track_name);
            true
        } else {
            false
        }
    }

    /// The pair listening for `track_name`, if any.
    pub fn route(&self, track_name: &str) -> Option<PairId> {
        self.listeners.get(track_name).copied()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
