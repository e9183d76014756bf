//! Image and Position Record persistence.
//!
//! Each pasted image owns two storage entries sharing one identifier:
//!
//! - the Image Record, `<image prefix><id>`, holding the JSON encoding of the
//!   image's data URL, and
//! - the Position Record, `<position prefix><id>`, holding `{"left", "top"}`.
//!
//! Position Records are validated on every read. On startup
//! [`Records::load_all`] runs an integrity pass that deletes every Position
//! Record that is not JSON or fails validation, then materializes each Image
//! Record at its stored position (or the origin when none is usable).

#[cfg(test)]
#[path = "records_test.rs"]
mod records_test;

use crate::config::KeyScheme;
use crate::geometry::Position;
use crate::id::ImageId;
use crate::store::{KeyValueStore, StoreError};

/// Error returned by record writes and image reads.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A record could not be encoded or decoded as JSON.
    #[error("record json error: {0}")]
    Json(#[from] serde_json::Error),
    /// The position has a non-finite coordinate and was not written.
    #[error("invalid position for {id}: left={}, top={}", .position.left, .position.top)]
    InvalidPosition { id: ImageId, position: Position },
}

/// Outcome of reading one Position Record.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionLookup {
    /// A valid record.
    Found(Position),
    /// No record is stored.
    Missing,
    /// A record is stored but unusable; the string says why.
    Corrupt(String),
}

impl PositionLookup {
    /// The stored position, or the origin when missing or corrupt.
    #[must_use]
    pub fn or_origin(&self) -> Position {
        match self {
            Self::Found(position) => *position,
            Self::Missing | Self::Corrupt(_) => Position::ORIGIN,
        }
    }
}

/// An image read back from storage, ready to be placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub id: ImageId,
    pub data_url: String,
    pub position: Position,
}

/// Summary of an integrity pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    /// Number of Position Records examined.
    pub scanned: usize,
    /// Keys of the Position Records that were deleted.
    pub removed: Vec<String>,
}

/// Parse a raw Position Record.
///
/// # Errors
///
/// Returns a description of the problem if `raw` is not a JSON object with
/// numeric `left`/`top` fields, or if either coordinate is not finite.
pub fn parse_position(raw: &str) -> Result<Position, String> {
    let position: Position = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    if position.is_valid() {
        Ok(position)
    } else {
        Err(format!("non-finite coordinates: left={}, top={}", position.left, position.top))
    }
}

/// Record persistence over a [`KeyValueStore`].
#[derive(Debug)]
pub struct Records<S> {
    store: S,
    keys: KeyScheme,
}

impl<S: KeyValueStore> Records<S> {
    pub fn new(store: S, keys: KeyScheme) -> Self {
        Self { store, keys }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn keys(&self) -> &KeyScheme {
        &self.keys
    }

    // --- Image Records ---

    /// Persist the data URL for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if encoding or the storage write fails.
    pub fn save_image(&mut self, id: &ImageId, data_url: &str) -> Result<(), RecordError> {
        let raw = serde_json::to_string(data_url)?;
        self.store.set(&self.keys.image_key(id), &raw)?;
        Ok(())
    }

    /// Read the data URL for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the read fails or the payload is not a JSON string.
    pub fn load_image(&self, id: &ImageId) -> Result<Option<String>, RecordError> {
        match self.store.get(&self.keys.image_key(id))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Whether an Image Record exists for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    pub fn has_image(&self, id: &ImageId) -> Result<bool, StoreError> {
        self.store.contains(&self.keys.image_key(id))
    }

    // --- Position Records ---

    /// Persist `position` for `id`. Invalid positions are rejected and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidPosition`] for non-finite coordinates, or
    /// another [`RecordError`] if encoding or the write fails.
    pub fn save_position(&mut self, id: &ImageId, position: Position) -> Result<(), RecordError> {
        if !position.is_valid() {
            return Err(RecordError::InvalidPosition { id: id.clone(), position });
        }
        let raw = serde_json::to_string(&position)?;
        self.store.set(&self.keys.position_key(id), &raw)?;
        Ok(())
    }

    /// Read and validate the Position Record for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    pub fn load_position(&self, id: &ImageId) -> Result<PositionLookup, StoreError> {
        let Some(raw) = self.store.get(&self.keys.position_key(id))? else {
            return Ok(PositionLookup::Missing);
        };
        Ok(match parse_position(&raw) {
            Ok(position) => PositionLookup::Found(position),
            Err(reason) => PositionLookup::Corrupt(reason),
        })
    }

    // --- Lifecycle ---

    /// Delete both records for `id`. Both removals are attempted even if the first fails.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError`] encountered.
    pub fn remove(&mut self, id: &ImageId) -> Result<(), StoreError> {
        let image = self.store.remove(&self.keys.image_key(id));
        let position = self.store.remove(&self.keys.position_key(id));
        image.and(position)
    }

    /// Delete every Position Record that is not JSON or fails validation.
    ///
    /// The key list is snapshotted first, so removals never disturb enumeration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the keys cannot be enumerated. Failures on
    /// individual keys are logged and the pass continues.
    pub fn integrity_pass(&mut self) -> Result<IntegrityReport, StoreError> {
        let mut report = IntegrityReport::default();
        for key in self.store.keys()? {
            if !self.keys.is_position_key(&key) {
                continue;
            }
            report.scanned += 1;
            let raw = match self.store.get(&key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(err) => {
                    log::error!("failed to read {key}: {err}");
                    continue;
                }
            };
            let Err(reason) = parse_position(&raw) else {
                continue;
            };
            log::warn!("invalid position record {key} ({reason}), removing: {raw:?}");
            match self.store.remove(&key) {
                Ok(()) => report.removed.push(key),
                Err(err) => log::error!("failed to remove {key}: {err}"),
            }
        }
        Ok(report)
    }

    /// Run the integrity pass, then read every Image Record with its position.
    ///
    /// Images come back in storage enumeration order. Images without a usable
    /// Position Record are placed at the origin; Image Records whose payload
    /// cannot be decoded are skipped and left in storage.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the keys cannot be enumerated.
    pub fn load_all(&mut self) -> Result<Vec<StoredImage>, StoreError> {
        let report = self.integrity_pass()?;
        if !report.removed.is_empty() {
            log::info!(
                "integrity pass removed {} of {} position records",
                report.removed.len(),
                report.scanned
            );
        }

        let mut images = Vec::new();
        for key in self.store.keys()? {
            let Some(id) = self.keys.id_from_image_key(&key) else {
                continue;
            };
            let data_url = match self.load_image(&id) {
                Ok(Some(data_url)) => data_url,
                Ok(None) => continue,
                Err(err) => {
                    log::warn!("skipping image {id}: {err}");
                    continue;
                }
            };
            let lookup = match self.load_position(&id) {
                Ok(lookup) => lookup,
                Err(err) => {
                    log::error!("failed to read position for {id}: {err}");
                    PositionLookup::Missing
                }
            };
            match &lookup {
                PositionLookup::Found(_) => {}
                PositionLookup::Missing => log::warn!("no position for {id}, using origin"),
                PositionLookup::Corrupt(reason) => log::warn!("invalid position for {id} ({reason}), using origin"),
            }
            images.push(StoredImage { id, data_url, position: lookup.or_origin() });
        }
        Ok(images)
    }
}
