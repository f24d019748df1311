//! Track model and track commands.

use crate::console::{DEFAULT_TRACK_GAIN, DEFAULT_TRACK_PAN};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Classification of a track. Read-only from the console's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum TrackType {
    /// Input track fed by a source
    #[default]
    In,
    /// The master output
    MasterOut,
    /// Bus (submix)
    Bus,
}

impl std::fmt::Display for TrackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::In => write!(f, "In"),
            Self::MasterOut => write!(f, "MasterOut"),
            Self::Bus => write!(f, "Bus"),
        }
    }
}

/// Identity and mixer state for one audio channel.
///
/// `name` is the addressing key for every command; renaming a track
/// changes its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TrackInfo {
    /// Unique human-readable name
    pub name: String,
    /// Input/output/bus classification
    #[serde(rename = "trackType", default)]
    pub track_type: TrackType,
    /// Linear gain multiplier
    pub gain: f32,
    /// Signed balance value
    pub pan: f32,
    pub mute: bool,
    pub solo: bool,
    pub record: bool,
    pub monitor: bool,
}

impl TrackInfo {
    /// Create an input track at unity gain with every flag cleared.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            track_type: TrackType::In,
            gain: DEFAULT_TRACK_GAIN,
            pan: DEFAULT_TRACK_PAN,
            mute: false,
            solo: false,
            record: false,
            monitor: false,
        }
    }

    /// Apply a single update in place.
    pub fn apply(&mut self, update: &TrackUpdate) {
        match update {
            TrackUpdate::Name(name) => self.name = name.clone(),
            TrackUpdate::Gain(gain) => self.gain = *gain,
            TrackUpdate::Pan(pan) => self.pan = *pan,
            TrackUpdate::Mute(mute) => self.mute = *mute,
            TrackUpdate::Solo(solo) => self.solo = *solo,
            TrackUpdate::Record(record) => self.record = *record,
            TrackUpdate::Monitor(monitor) => self.monitor = *monitor,
        }
    }
}

/// A single change to one track, addressed by the track's name.
///
/// Serialized externally tagged: `{"Gain": 0.5}`, `{"Mute": true}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum TrackUpdate {
    Name(String),
    Gain(f32),
    Pan(f32),
    Mute(bool),
    Solo(bool),
    Record(bool),
    Monitor(bool),
}

impl TrackUpdate {
    /// Short description used in log lines.
    pub fn description(&self) -> String {
        match self {
            TrackUpdate::Name(name) => format!("rename to '{}'", name),
            TrackUpdate::Gain(gain) => format!("gain {:.4}", gain),
            TrackUpdate::Pan(pan) => format!("pan {:.2}", pan),
            TrackUpdate::Mute(v) => format!("mute {}", v),
            TrackUpdate::Solo(v) => format!("solo {}", v),
            TrackUpdate::Record(v) => format!("record {}", v),
            TrackUpdate::Monitor(v) => format!("monitor {}", v),
        }
    }
}

/// One of the boolean controls shown on both the row and the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleFlag {
    Mute,
    Solo,
    Record,
    Monitor,
}

impl ToggleFlag {
    pub const ALL: [ToggleFlag; 4] = [
        ToggleFlag::Mute,
        ToggleFlag::Solo,
        ToggleFlag::Record,
        ToggleFlag::Monitor,
    ];

    /// The flag that is forced off when this one is switched on.
    pub fn exclusive_with(self) -> Option<ToggleFlag> {
        match self {
            ToggleFlag::Mute => Some(ToggleFlag::Solo),
            ToggleFlag::Solo => Some(ToggleFlag::Mute),
            ToggleFlag::Record | ToggleFlag::Monitor => None,
        }
    }

    /// Build the engine command that sets this flag.
    pub fn update(self, value: bool) -> TrackUpdate {
        match self {
            ToggleFlag::Mute => TrackUpdate::Mute(value),
            ToggleFlag::Solo => TrackUpdate::Solo(value),
            ToggleFlag::Record => TrackUpdate::Record(value),
            ToggleFlag::Monitor => TrackUpdate::Monitor(value),
        }
    }

    /// Button caption.
    pub fn label(self) -> &'static str {
        match self {
            ToggleFlag::Mute => "M",
            ToggleFlag::Solo => "S",
            ToggleFlag::Record => "R",
            ToggleFlag::Monitor => "I",
        }
    }
}

/// Response containing every track known to the engine, sorted by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TrackListResponse {
    pub tracks: Vec<TrackInfo>,
}
