use thiserror::Error;

/// Everything the codec and the validation layer can report.
///
/// Paths are dotted JSON paths relative to the payload root, e.g.
/// `assets[2].img.w`. Validation reports several of these at once through
/// [`crate::validation::ValidationReport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NativeError {
    /// Not JSON, or a field holds the wrong JSON type.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("missing required field `{path}`")]
    MissingRequiredField { path: String },

    /// An asset populates zero or several of title/img/video/data.
    #[error("`{path}` must populate exactly one of title, img, video, data (found {found})")]
    InvalidVariant { path: String, found: usize },

    #[error("`{path}` holds {code}, which is not a known {table} code")]
    UnknownEnumValue {
        path: String,
        table: &'static str,
        code: i64,
    },

    /// A response asset does not line up with the request it answers.
    #[error("`{path}`: {reason}")]
    CrossReferenceMismatch { path: String, reason: String },

    /// Range, length, uniqueness or URL check failed.
    #[error("`{path}` {message}")]
    ConstraintViolation { path: String, message: String },

    #[error("`{path}` is deprecated, use `{replacement}`")]
    Deprecated {
        path: String,
        replacement: &'static str,
    },

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl NativeError {
    pub fn path(&self) -> Option<&str> {
        match self {
            NativeError::MissingRequiredField { path }
            | NativeError::InvalidVariant { path, .. }
            | NativeError::UnknownEnumValue { path, .. }
            | NativeError::CrossReferenceMismatch { path, .. }
            | NativeError::ConstraintViolation { path, .. }
            | NativeError::Deprecated { path, .. } => Some(path),
            NativeError::MalformedInput(_) | NativeError::Serialization(_) => None,
        }
    }
}
