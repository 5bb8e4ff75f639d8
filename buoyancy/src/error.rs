use thiserror::Error;

/// Errors raised while loading or validating buoyancy data.
#[derive(Debug, Error)]
pub enum BuoyancyError {
    #[error("invalid buoyancy config: {field} = {value} ({reason})")]
    InvalidConfig {
        field: &'static str,
        value: f32,
        reason: &'static str,
    },

    #[error("failed to parse RON: {0}")]
    Ron(#[from] ron::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BuoyancyResult<T> = Result<T, BuoyancyError>;
