/// Convenience result type used across the crate.
pub type InsetResult<T> = Result<T, InsetError>;

/// Top-level error type for surfaces, the inset compositor, and draw scripts.
#[derive(thiserror::Error, Debug)]
pub enum InsetError {
    /// Invalid arguments or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Raster surface failures (size limits, buffer mismatches).
    #[error("raster error: {0}")]
    Raster(String),

    /// Draw script parsing or loading failures.
    #[error("script error: {0}")]
    Script(String),

    /// Any other error, preserved with its source chain.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl InsetError {
    /// Build an [`InsetError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`InsetError::Raster`] value.
    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }

    /// Build an [`InsetError::Script`] value.
    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
