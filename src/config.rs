//! Runtime configuration for the image canvas.
//!
//! Every field has a default taken from [`crate::consts`], so an empty JSON
//! object (or no configuration at all) yields the stock behaviour. The host
//! page may override any subset through `mount_with_config`.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    CONTAINER_ID, DELETE_KEYS, ELEMENT_ID_PREFIX, ID_LENGTH, IMAGE_KEY_PREFIX, MAX_HEIGHT_PX, MAX_ID_LENGTH,
    MIN_HEIGHT_PX, MIN_ID_LENGTH, POINTER_THROTTLE_MS, POSITION_KEY_PREFIX, SELECTED_BORDER,
};
use crate::id::ImageId;

/// Error returned by [`Config::from_json`] and [`Config::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration text is not valid JSON for [`Config`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A storage key prefix is empty.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    /// One key prefix is a prefix of the other, so keys would be ambiguous.
    #[error("key prefixes overlap: {image:?} and {position:?}")]
    OverlappingPrefixes { image: String, position: String },
    /// `id_length` is outside the supported range.
    #[error("id_length must be between {min} and {max}, got {0}", min = MIN_ID_LENGTH, max = MAX_ID_LENGTH)]
    IdLength(usize),
    /// The image height bounds are inverted or not finite.
    #[error("invalid height bounds: min {min}, max {max}")]
    HeightBounds { min: f64, max: f64 },
    /// The throttle interval is negative or not finite.
    #[error("invalid pointer throttle interval: {0}")]
    ThrottleInterval(f64),
    /// `log_level` does not name a `log` level.
    #[error("unknown log level: {0}")]
    LogLevel(String),
}

/// Image canvas configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage key prefix for image payloads.
    pub image_key_prefix: String,
    /// Storage key prefix for position records.
    pub position_key_prefix: String,
    /// DOM id of the element images are appended to.
    pub container_id: String,
    /// Prefix of each image element's DOM id.
    pub element_id_prefix: String,
    /// Length of generated identifiers, 4 to 16 characters.
    pub id_length: usize,
    /// Minimum interval between admitted pointer samples, in milliseconds.
    pub pointer_throttle_ms: f64,
    /// Key names (as reported by `KeyboardEvent.key`) that delete the selection.
    pub delete_keys: Vec<String>,
    /// Minimum rendered image height in CSS pixels.
    pub min_height_px: f64,
    /// Maximum rendered image height in CSS pixels.
    pub max_height_px: f64,
    /// CSS `border` value marking the selected image.
    pub selected_border: String,
    /// Console log level (`error`, `warn`, `info`, `debug`, `trace`).
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_key_prefix: IMAGE_KEY_PREFIX.to_owned(),
            position_key_prefix: POSITION_KEY_PREFIX.to_owned(),
            container_id: CONTAINER_ID.to_owned(),
            element_id_prefix: ELEMENT_ID_PREFIX.to_owned(),
            id_length: ID_LENGTH,
            pointer_throttle_ms: POINTER_THROTTLE_MS,
            delete_keys: DELETE_KEYS.iter().map(|k| (*k).to_owned()).collect(),
            min_height_px: MIN_HEIGHT_PX,
            max_height_px: MAX_HEIGHT_PX,
            selected_border: SELECTED_BORDER.to_owned(),
            log_level: "info".to_owned(),
        }
    }
}

impl Config {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid JSON or fails [`Config::validate`].
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the canvas cannot work with.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image_key_prefix.is_empty() {
            return Err(ConfigError::EmptyField("image_key_prefix"));
        }
        if self.position_key_prefix.is_empty() {
            return Err(ConfigError::EmptyField("position_key_prefix"));
        }
        if self.container_id.is_empty() {
            return Err(ConfigError::EmptyField("container_id"));
        }
        if self.element_id_prefix.is_empty() {
            return Err(ConfigError::EmptyField("element_id_prefix"));
        }
        if self.image_key_prefix.starts_with(&self.position_key_prefix)
            || self.position_key_prefix.starts_with(&self.image_key_prefix)
        {
            return Err(ConfigError::OverlappingPrefixes {
                image: self.image_key_prefix.clone(),
                position: self.position_key_prefix.clone(),
            });
        }
        if !(MIN_ID_LENGTH..=MAX_ID_LENGTH).contains(&self.id_length) {
            return Err(ConfigError::IdLength(self.id_length));
        }
        if !self.min_height_px.is_finite()
            || !self.max_height_px.is_finite()
            || self.min_height_px < 0.0
            || self.min_height_px > self.max_height_px
        {
            return Err(ConfigError::HeightBounds { min: self.min_height_px, max: self.max_height_px });
        }
        if !self.pointer_throttle_ms.is_finite() || self.pointer_throttle_ms < 0.0 {
            return Err(ConfigError::ThrottleInterval(self.pointer_throttle_ms));
        }
        self.log_level_filter()?;
        Ok(())
    }

    /// The configured log level as a `log` filter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LogLevel`] if the name is not recognised.
    pub fn log_level_filter(&self) -> Result<log::Level, ConfigError> {
        self.log_level
            .parse::<log::Level>()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }

    /// Whether `key` (a `KeyboardEvent.key` value) deletes the selection.
    #[must_use]
    pub fn is_delete_key(&self, key: &str) -> bool {
        self.delete_keys.iter().any(|k| k == key)
    }

    /// The storage key scheme derived from this configuration.
    #[must_use]
    pub fn key_scheme(&self) -> KeyScheme {
        KeyScheme {
            image_prefix: self.image_key_prefix.clone(),
            position_prefix: self.position_key_prefix.clone(),
        }
    }

    /// DOM id for the element showing image `id`.
    #[must_use]
    pub fn element_id(&self, id: &ImageId) -> String {
        format!("{}{}", self.element_id_prefix, id)
    }

    /// Recover the image id from an element's DOM id.
    #[must_use]
    pub fn id_from_element_id(&self, element_id: &str) -> Option<ImageId> {
        ImageId::from_prefixed(&self.element_id_prefix, element_id)
    }
}

/// Maps identifiers to storage keys and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScheme {
    image_prefix: String,
    position_prefix: String,
}

impl Default for KeyScheme {
    fn default() -> Self {
        Config::default().key_scheme()
    }
}

impl KeyScheme {
    /// Storage key of the Image Record for `id`.
    #[must_use]
    pub fn image_key(&self, id: &ImageId) -> String {
        format!("{}{}", self.image_prefix, id)
    }

    /// Storage key of the Position Record for `id`.
    #[must_use]
    pub fn position_key(&self, id: &ImageId) -> String {
        format!("{}{}", self.position_prefix, id)
    }

    /// Whether `key` names a Position Record.
    #[must_use]
    pub fn is_position_key(&self, key: &str) -> bool {
        key.starts_with(&self.position_prefix)
    }

    /// The identifier named by an Image Record key, if `key` is one.
    #[must_use]
    pub fn id_from_image_key(&self, key: &str) -> Option<ImageId> {
        ImageId::from_prefixed(&self.image_prefix, key)
    }
}
