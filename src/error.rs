use thiserror::Error;

/// Failures that abort a generation step.
///
/// Expected "no valid placement" outcomes are not errors; generators report those with
/// `Option` or `bool` and the caller falls back or skips.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse dungeon spec: {0}")]
    SpecParse(String),

    #[error("malformed fixed room layout '{name}': {reason}")]
    MalformedLayout { name: String, reason: String },

    #[error("tile set '{tile_set}' has no visual for DesignType::None")]
    MissingFallbackVisual { tile_set: String },
}

pub type Result<T> = std::result::Result<T, GenerationError>;

pub(crate) fn invalid_config(message: impl Into<String>) -> GenerationError {
    let message = message.into();
    log::error!("{}", message);

    GenerationError::InvalidConfig(message)
}
