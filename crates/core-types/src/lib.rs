//! Shared value types for the watchdeck page agent crates.
//!
//! Everything on the controller wire contract lives here: media snapshots,
//! quality tiers, action requests and the normalized action result. The
//! member crates depend on this crate only, never on each other's internals.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Playback quality tier derived from the media element's vertical resolution.
///
/// `Unknown` is reserved for "no media element resolvable". An element that
/// reports a zero height deliberately yields `Measured(0)` (`"0p"` on the
/// wire) so controllers can tell the two cases apart.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QualityTier {
    Unknown,
    P480,
    P720,
    P1080,
    P1440,
    Uhd4k,
    Measured(u32),
}

impl QualityTier {
    /// Strict descending threshold table on vertical resolution.
    pub fn from_height(height: u32) -> Self {
        if height >= 2160 {
            QualityTier::Uhd4k
        } else if height >= 1440 {
            QualityTier::P1440
        } else if height >= 1080 {
            QualityTier::P1080
        } else if height >= 720 {
            QualityTier::P720
        } else if height >= 480 {
            QualityTier::P480
        } else {
            QualityTier::Measured(height)
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityTier::Unknown => write!(f, "Unknown"),
            QualityTier::P480 => write!(f, "480p"),
            QualityTier::P720 => write!(f, "720p"),
            QualityTier::P1080 => write!(f, "1080p"),
            QualityTier::P1440 => write!(f, "1440p"),
            QualityTier::Uhd4k => write!(f, "4K"),
            QualityTier::Measured(height) => write!(f, "{height}p"),
        }
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unknown" => Ok(QualityTier::Unknown),
            "480p" => Ok(QualityTier::P480),
            "720p" => Ok(QualityTier::P720),
            "1080p" => Ok(QualityTier::P1080),
            "1440p" => Ok(QualityTier::P1440),
            "4K" => Ok(QualityTier::Uhd4k),
            other => other
                .strip_suffix('p')
                .and_then(|h| h.parse().ok())
                .map(QualityTier::Measured)
                .ok_or_else(|| format!("unrecognized quality tier: {other}")),
        }
    }
}

impl Serialize for QualityTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QualityTier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// Point-in-time view of the page's media state.
///
/// Derived fresh on every read. Field names follow the controller wire
/// contract, hence the per-field renames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaSnapshot {
    #[serde(rename = "isPlaying")]
    pub playing: bool,
    #[serde(rename = "volume")]
    pub volume_level: u8,
    pub muted: bool,
    #[serde(rename = "currentTime")]
    pub current_time_sec: u64,
    #[serde(rename = "duration")]
    pub duration_sec: u64,
    pub fullscreen: bool,
    pub quality: QualityTier,
    #[serde(rename = "subtitles")]
    pub subtitles_available: bool,
    #[serde(rename = "overlayCount")]
    pub overlay_count: u32,
    #[serde(rename = "videoCount")]
    pub media_element_count: u32,
}

impl MediaSnapshot {
    /// Snapshot reported when no media element is resolvable. Controllers
    /// always receive a well-formed object, never an error.
    pub fn absent(fullscreen: bool, overlay_count: u32, media_element_count: u32) -> Self {
        Self {
            playing: false,
            volume_level: 50,
            muted: false,
            current_time_sec: 0,
            duration_sec: 0,
            fullscreen,
            quality: QualityTier::Unknown,
            subtitles_available: false,
            overlay_count,
            media_element_count,
        }
    }
}

/// Lifecycle of the page agent. Suppression subscriptions, timers and the
/// control surface exist iff the state is `Running`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EngineState {
    Uninitialized,
    Running,
    Deactivated,
}

/// A named remote operation plus its parameter bag.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionRequest {
    pub name: String,
    pub params: Map<String, Value>,
}

impl ActionRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Normalized outcome of a dispatched action. The `Ok`/`Err` distinction is
/// the sole success signal; payload fields are spread into the response
/// envelope by the bridge.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionResult {
    Ok { payload: Map<String, Value> },
    Err { message: String },
}

impl ActionResult {
    pub fn ok(payload: Map<String, Value>) -> Self {
        ActionResult::Ok { payload }
    }

    pub fn err(message: impl Into<String>) -> Self {
        ActionResult::Err {
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ActionResult::Ok { .. })
    }

    /// Payload field accessor for callers that only need one value.
    pub fn field(&self, key: &str) -> Option<&Value> {
        match self {
            ActionResult::Ok { payload } => payload.get(key),
            ActionResult::Err { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ActionResult::Ok { .. } => None,
            ActionResult::Err { message } => Some(message),
        }
    }
}
