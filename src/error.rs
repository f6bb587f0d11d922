/// Error types for the runtime core.
///
/// Configuration problems are fatal at initialization and carried as
/// `ConfigError`.  Runtime absences (an entity that was already retired) are
/// never errors; they show up as `None` from the world.

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// A spawner was given no templates to choose from.
    #[error("Spawner '{spawner}' has an empty template pool")]
    EmptyTemplatePool { spawner: String },

    /// A `[min, max]` pair with `min > max`.
    #[error("Invalid range for {field}: min {min} > max {max}")]
    InvalidRange { field: String, min: f32, max: f32 },

    /// A value that must be strictly positive.
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: String, value: i64 },

    /// A value that must be zero or positive.
    #[error("{field} must not be negative (got {value})")]
    Negative { field: String, value: f32 },
}

/// Returned when a phase name does not match any `GamePhase`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown game phase: '{0}'")]
pub struct PhaseParseError(pub String);

pub(crate) fn check_range(field: &str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min > max || min.is_nan() || max.is_nan() {
        return Err(ConfigError::InvalidRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

pub(crate) fn check_non_negative(field: &str, value: f32) -> Result<(), ConfigError> {
    if value < 0.0 || value.is_nan() {
        return Err(ConfigError::Negative {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}
