//! Error types for the report rendering engine.
//!
//! Every core operation (validation, rendering, draft codec) fails with
//! exactly one of the kinds below; failures are deterministic given the same
//! input, so nothing here retries or recovers.

/// Result type alias for report engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds that can occur while validating, rendering or persisting a report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A report attribute failed validation at construction (or after
    /// deserializing a draft).
    #[error("Invalid report attribute '{field}': {reason}")]
    Validation {
        /// Name of the offending attribute (e.g. `title`, `section.heading`)
        field: String,
        /// Why the attribute was rejected
        reason: String,
    },

    /// Logo bytes could not be decoded, or the decoded image exceeds the
    /// maximum pixel-dimension bound.
    #[error("Invalid image asset: {0}")]
    InvalidAsset(String),

    /// Layout or encoding failure inside a specific renderer.
    #[error("Render failed: {0}")]
    Render(String),

    /// Malformed draft JSON, missing required fields, or an unsupported
    /// schema version.
    #[error("Draft corrupt: {0}")]
    DraftCorrupt(String),

    /// IO error from the draft file helpers. The in-memory core operations
    /// never produce this variant.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a `Validation` error for a named attribute.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Build an `InvalidAsset` error.
    pub fn asset(reason: impl Into<String>) -> Self {
        Error::InvalidAsset(reason.into())
    }

    /// Build a `Render` error.
    pub fn render(reason: impl Into<String>) -> Self {
        Error::Render(reason.into())
    }

    /// Build a `DraftCorrupt` error.
    pub fn draft(reason: impl Into<String>) -> Self {
        Error::DraftCorrupt(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_attribute() {
        let err = Error::validation("title", "must not be empty");
        let msg = format!("{}", err);
        assert!(msg.contains("title"));
        assert!(msg.contains("must not be empty"));
    }

    #[test]
    fn test_invalid_asset_error() {
        let err = Error::asset("not a PNG or JPEG");
        assert!(format!("{}", err).contains("Invalid image asset"));
    }

    #[test]
    fn test_draft_corrupt_error() {
        let err = Error::draft("unsupported draft version 99");
        let msg = format!("{}", err);
        assert!(msg.contains("Draft corrupt"));
        assert!(msg.contains("99"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
