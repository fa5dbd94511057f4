/// Errors raised while editing or loading a design.
#[derive(Debug, thiserror::Error)]
pub enum DesignError {
    /// The field name is not in the catalog.
    #[error("unknown design field '{0}'")]
    UnknownField(String),

    /// The value's kind does not match the field's kind.
    #[error("field '{field}' expects a {expected} value, got {found}")]
    KindMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Numeric fields reject NaN and infinities.
    #[error("field '{field}' must be a finite number")]
    NotFinite { field: String },

    /// The value is not one of the field's options.
    #[error("'{value}' is not a valid option for field '{field}'")]
    InvalidChoice { field: String, value: String },

    /// A design document was not a JSON object.
    #[error("design document must be a JSON object")]
    NotAnObject,

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DesignError>;
