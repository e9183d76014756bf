//! Shared constants for the image canvas.

// ── Storage ─────────────────────────────────────────────────────

/// Key prefix for persisted image payloads (JSON-encoded data URLs).
pub const IMAGE_KEY_PREFIX: &str = "rhein-img-key-";

/// Key prefix for persisted `{left, top}` position records.
pub const POSITION_KEY_PREFIX: &str = "rhein-img-position-";

// ── Identifiers ─────────────────────────────────────────────────

/// Alphabet used for generated image identifiers (base 36, lowercase).
pub const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of a freshly generated identifier.
pub const ID_LENGTH: usize = 6;

/// Lower bound accepted for `Config::id_length`. Shorter ids leave too few
/// values for collision redraws to find a free one.
pub const MIN_ID_LENGTH: usize = 4;

/// Upper bound accepted for `Config::id_length`.
pub const MAX_ID_LENGTH: usize = 16;

/// Attempts made to find an identifier that is not already in storage.
pub const ID_GENERATION_ATTEMPTS: usize = 8;

// ── DOM ─────────────────────────────────────────────────────────

/// Id of the container element that pasted images are appended to.
pub const CONTAINER_ID: &str = "images";

/// Prefix of the DOM id given to each pasted image element.
pub const ELEMENT_ID_PREFIX: &str = "pasted-image-";

/// Minimum rendered height of a pasted image, in CSS pixels.
pub const MIN_HEIGHT_PX: f64 = 30.0;

/// Maximum rendered height of a pasted image, in CSS pixels.
pub const MAX_HEIGHT_PX: f64 = 300.0;

/// CSS border applied to the selected image.
pub const SELECTED_BORDER: &str = "2px dashed #3b82f6";

// ── Input ───────────────────────────────────────────────────────

/// Cooldown between admitted pointer-position samples, in milliseconds.
pub const POINTER_THROTTLE_MS: f64 = 100.0;

/// Keys that delete the selected image.
pub const DELETE_KEYS: [&str; 2] = ["Backspace", "Delete"];
