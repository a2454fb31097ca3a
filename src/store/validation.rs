//! Validation of proposed configuration changes.
//!
//! # Responsibilities
//! - Check that the requested mode is one of the allowed modes
//! - Check the fields each mode requires
//! - Turn an untyped request body into [`ModeSettings`]
//!
//! # Design Decisions
//! - Pure: never touches the file or the store
//! - Stops at the first problem; each rejection carries one reason
//! - Field shapes only; whether a URL or cast target is reachable is the
//!   device driver's business
//! - Omitted fields may be filled from the retained settings of the same
//!   mode, so switching back to a configured mode needs only `{"mode": ..}`

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::store::model::{DeviceConfig, Mode, ModeSettings};

/// Why a candidate was rejected. The message is returned to API callers as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("mode must be one of: {allowed}")]
    InvalidMode { allowed: String },

    #[error("web_url required for web mode")]
    MissingWebUrl,

    #[error("web_url must be a valid url")]
    InvalidWebUrl,

    #[error("chromecast_name and youtube_video_id required for chromecast mode")]
    MissingCastTarget,

    #[error("ppt_email required for powerpoint mode")]
    MissingPptEmail,

    #[error("ppt_email must be a valid email address")]
    InvalidPptEmail,
}

/// Validates candidates against the deployment's allowed mode set.
#[derive(Debug, Clone)]
pub struct Validator {
    allowed: Vec<Mode>,
}

impl Validator {
    pub fn new(allowed: Vec<Mode>) -> Self {
        Self { allowed }
    }

    /// Accept or reject a request body such as
    /// `{"mode": "web", "web_url": "https://example.com"}`.
    ///
    /// Anything that is not a JSON object is treated as a body without a mode.
    pub fn validate(&self, candidate: &Value) -> Result<ModeSettings, ValidationError> {
        self.validate_with_retained(candidate, None)
    }

    /// Like [`Validator::validate`], but a required field the candidate omits
    /// (or sends as `null`) is taken from `retained`, provided that mode was
    /// configured before (by an update or in the file). Built-in defaults are
    /// never used. The resolved value goes through the same checks either way.
    pub fn validate_with_retained(
        &self,
        candidate: &Value,
        retained: Option<&DeviceConfig>,
    ) -> Result<ModeSettings, ValidationError> {
        let empty = Map::new();
        let fields = candidate.as_object().unwrap_or(&empty);

        let mode = fields
            .get("mode")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse::<Mode>().ok())
            .filter(|mode| self.allowed.contains(mode))
            .ok_or_else(|| self.invalid_mode())?;
        let retained = retained.filter(|config| config.is_configured(mode));

        let field = |key: &str, kept: fn(&DeviceConfig) -> &str| {
            resolve(fields, key, retained.map(kept))
        };

        match mode {
            Mode::Led => Ok(ModeSettings::Led),
            Mode::Web => {
                let web_url =
                    field("web_url", |c| c.web_url.as_str()).ok_or(ValidationError::MissingWebUrl)?;
                Url::parse(web_url).map_err(|_| ValidationError::InvalidWebUrl)?;
                Ok(ModeSettings::Web {
                    web_url: web_url.to_string(),
                })
            }
            Mode::Chromecast => {
                match (
                    field("chromecast_name", |c| c.chromecast_name.as_str()),
                    field("youtube_video_id", |c| c.youtube_video_id.as_str()),
                ) {
                    (Some(name), Some(video_id)) => Ok(ModeSettings::Chromecast {
                        chromecast_name: name.to_string(),
                        youtube_video_id: video_id.to_string(),
                    }),
                    _ => Err(ValidationError::MissingCastTarget),
                }
            }
            Mode::Powerpoint => {
                let email =
                    field("ppt_email", |c| c.ppt_email.as_str()).ok_or(ValidationError::MissingPptEmail)?;
                if !email_shape().is_match(email) {
                    return Err(ValidationError::InvalidPptEmail);
                }
                Ok(ModeSettings::Powerpoint {
                    ppt_email: email.to_string(),
                })
            }
        }
    }

    fn invalid_mode(&self) -> ValidationError {
        let allowed = self
            .allowed
            .iter()
            .map(Mode::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        ValidationError::InvalidMode { allowed }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Mode::ALL.to_vec())
    }
}

/// A field sent with the wrong type or empty is rejected outright; only an
/// absent or `null` field falls back to the retained value.
fn resolve<'a>(
    fields: &'a Map<String, Value>,
    key: &str,
    retained: Option<&'a str>,
) -> Option<&'a str> {
    match fields.get(key) {
        None | Some(Value::Null) => retained,
        Some(value) => value.as_str(),
    }
    .filter(|value| !value.is_empty())
}

/// `local@domain.tld`, no whitespace. Not RFC 5322.
fn email_shape() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"))
}
