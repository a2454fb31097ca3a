//! Device configuration model.
//!
//! Three shapes of the same record live here:
//! - [`DeviceConfig`]: the canonical in-memory record, holding the fields of
//!   every mode so that switching modes back and forth keeps prior settings.
//! - [`PersistedConfig`]: the on-disk JSON form (camelCase keys).
//! - [`ModeSettings`] / [`ConfigProjection`]: the mode-keyed view that the
//!   API accepts and returns.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timestamp layout used in the file and in API responses (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// How far ahead of the clock a previous `lastUpdated` may be and still be
/// stepped past by the next mutation.
pub const MAX_CLOCK_SKEW: TimeDelta = TimeDelta::seconds(2);

/// Operating mode of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Led,
    Web,
    Chromecast,
    Powerpoint,
}

impl Mode {
    /// Every mode this build knows how to validate and project.
    pub const ALL: [Mode; 4] = [Mode::Led, Mode::Web, Mode::Chromecast, Mode::Powerpoint];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Led => "led",
            Mode::Web => "web",
            Mode::Chromecast => "chromecast",
            Mode::Powerpoint => "powerpoint",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Mode together with the fields that belong to it.
///
/// Serializes internally tagged, so `Chromecast { .. }` becomes
/// `{"mode":"chromecast","chromecast_name":..,"youtube_video_id":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ModeSettings {
    Led,
    Web {
        web_url: String,
    },
    Chromecast {
        chromecast_name: String,
        youtube_video_id: String,
    },
    Powerpoint {
        ppt_email: String,
    },
}

impl ModeSettings {
    pub fn mode(&self) -> Mode {
        match self {
            ModeSettings::Led => Mode::Led,
            ModeSettings::Web { .. } => Mode::Web,
            ModeSettings::Chromecast { .. } => Mode::Chromecast,
            ModeSettings::Powerpoint { .. } => Mode::Powerpoint,
        }
    }
}

/// What API callers see: the active mode's fields plus bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigProjection {
    #[serde(flatten)]
    pub settings: ModeSettings,
    pub last_updated: String,
    pub status: &'static str,
}

/// Canonical configuration record.
///
/// `mode` stays a raw string because the file may be written by another
/// process with a mode this build does not recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub mode: String,
    pub web_url: String,
    pub chromecast_name: String,
    pub youtube_video_id: String,
    pub ppt_email: String,
    pub last_updated: DateTime<Utc>,
    /// Modes whose fields were set by an update or came from the file, as
    /// opposed to built-in defaults.
    pub configured: HashSet<Mode>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Led.as_str().to_string(),
            web_url: "https://youtube.com".to_string(),
            chromecast_name: "Chromecast name".to_string(),
            youtube_video_id: String::new(),
            ppt_email: String::new(),
            last_updated: now_millis(),
            configured: HashSet::new(),
        }
    }
}

impl DeviceConfig {
    /// Build a record from the file, overwriting every field.
    ///
    /// Missing fields become empty strings; a missing or unreadable
    /// `lastUpdated` falls back to `now`.
    pub fn from_persisted(persisted: PersistedConfig, now: DateTime<Utc>) -> Self {
        let last_updated = persisted
            .last_updated
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(now);

        let mut config = Self {
            mode: persisted.mode.unwrap_or_default(),
            web_url: persisted.web_url.unwrap_or_default(),
            chromecast_name: persisted.chromecast_name.unwrap_or_default(),
            youtube_video_id: persisted.youtube_video_id.unwrap_or_default(),
            ppt_email: persisted.ppt_email.unwrap_or_default(),
            last_updated,
            configured: HashSet::new(),
        };
        config.configured = Mode::ALL
            .into_iter()
            .filter(|mode| config.has_fields_for(*mode))
            .collect();
        config
    }

    /// Whether the stored fields of `mode` came from an update or the file.
    pub fn is_configured(&self, mode: Mode) -> bool {
        self.configured.contains(&mode)
    }

    fn has_fields_for(&self, mode: Mode) -> bool {
        match mode {
            Mode::Led => true,
            Mode::Web => !self.web_url.is_empty(),
            Mode::Chromecast => {
                !self.chromecast_name.is_empty() && !self.youtube_video_id.is_empty()
            }
            Mode::Powerpoint => !self.ppt_email.is_empty(),
        }
    }

    /// Canonical field set for writing back to disk.
    pub fn to_persisted(&self) -> PersistedConfig {
        PersistedConfig {
            mode: Some(self.mode.clone()),
            web_url: Some(self.web_url.clone()),
            chromecast_name: Some(self.chromecast_name.clone()),
            youtube_video_id: Some(self.youtube_video_id.clone()),
            ppt_email: Some(self.ppt_email.clone()),
            last_updated: Some(format_timestamp(&self.last_updated)),
            extra: serde_json::Map::new(),
        }
    }

    /// Switch to the given mode and overwrite only that mode's fields.
    pub fn apply(&mut self, settings: &ModeSettings, at: DateTime<Utc>) {
        self.mode = settings.mode().as_str().to_string();
        match settings {
            ModeSettings::Led => {}
            ModeSettings::Web { web_url } => {
                self.web_url = web_url.clone();
            }
            ModeSettings::Chromecast {
                chromecast_name,
                youtube_video_id,
            } => {
                self.chromecast_name = chromecast_name.clone();
                self.youtube_video_id = youtube_video_id.clone();
            }
            ModeSettings::Powerpoint { ppt_email } => {
                self.ppt_email = ppt_email.clone();
            }
        }
        self.configured.insert(settings.mode());
        self.last_updated = at;
    }

    /// Resolve the active mode, if it is known and allowed.
    pub fn active_mode(&self, allowed: &[Mode]) -> Result<Mode, UnknownMode> {
        let mode: Mode = self.mode.parse()?;
        if allowed.contains(&mode) {
            Ok(mode)
        } else {
            Err(UnknownMode(self.mode.clone()))
        }
    }

    /// Project the stored fields onto the active mode.
    pub fn project(&self, allowed: &[Mode]) -> Result<ConfigProjection, UnknownMode> {
        let settings = match self.active_mode(allowed)? {
            Mode::Led => ModeSettings::Led,
            Mode::Web => ModeSettings::Web {
                web_url: self.web_url.clone(),
            },
            Mode::Chromecast => ModeSettings::Chromecast {
                chromecast_name: self.chromecast_name.clone(),
                youtube_video_id: self.youtube_video_id.clone(),
            },
            Mode::Powerpoint => ModeSettings::Powerpoint {
                ppt_email: self.ppt_email.clone(),
            },
        };

        Ok(ConfigProjection {
            settings,
            last_updated: format_timestamp(&self.last_updated),
            status: "success",
        })
    }

    /// Timestamp for the next mutation: now, bumped past the previous value
    /// when the clock has not moved on or stepped back by at most
    /// [`MAX_CLOCK_SKEW`]. A previous value further in the future (a file
    /// written on a skewed clock) is not followed.
    pub fn next_timestamp(&self) -> DateTime<Utc> {
        let now = now_millis();
        let floor = self.last_updated + TimeDelta::milliseconds(1);
        if floor > now + MAX_CLOCK_SKEW {
            now
        } else {
            now.max(floor)
        }
    }
}

/// On-disk JSON form of the configuration.
///
/// All fields are optional on read; unknown keys are kept in `extra` but
/// never written back since [`DeviceConfig::to_persisted`] leaves it empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedConfig {
    pub mode: Option<String>,
    pub web_url: Option<String>,
    pub chromecast_name: Option<String>,
    pub youtube_video_id: Option<String>,
    pub ppt_email: Option<String>,
    pub last_updated: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Current time truncated to millisecond precision.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Accepts the native layout as well as RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        return Some(naive.and_utc().trunc_subsecs(3));
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc).trunc_subsecs(3))
}
