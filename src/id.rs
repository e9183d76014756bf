#[cfg(test)]
#[path = "id_test.rs"]
mod id_test;

use std::fmt;

use rand::Rng;

use crate::consts::ID_ALPHABET;

/// Error returned by [`ImageId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("image id is empty")]
    Empty,
    #[error("image id {0:?} contains characters outside 0-9a-z")]
    InvalidChar(String),
}

/// Short base-36 identifier naming one pasted image.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageId(String);

impl ImageId {
    /// Generate a random identifier of `len` characters.
    pub fn generate<R: Rng>(rng: &mut R, len: usize) -> Self {
        let id = (0..len)
            .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
            .collect();
        Self(id)
    }

    /// Parse an identifier read back from storage or the DOM.
    ///
    /// Any non-empty run of `0-9a-z` is accepted, whatever its length.
    ///
    /// # Errors
    ///
    /// Returns [`IdError`] for empty strings or foreign characters.
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        if raw.is_empty() {
            return Err(IdError::Empty);
        }
        if !raw.bytes().all(|b| ID_ALPHABET.contains(&b)) {
            return Err(IdError::InvalidChar(raw.to_owned()));
        }
        Ok(Self(raw.to_owned()))
    }

    /// Strip `prefix` from `raw` and parse the remainder.
    #[must_use]
    pub fn from_prefixed(prefix: &str, raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix(prefix)?;
        match Self::parse(rest) {
            Ok(id) => Some(id),
            Err(err) => {
                log::debug!("ignoring {raw:?}: {err}");
                None
            }
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
