//! Validation configuration.

/// Configuration for validation checks.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Maximum number of validation errors to report per check.
    pub max_errors_per_category: usize,

    /// Warn when the last frame is not terminated by a present call.
    pub warn_on_trailing_frame: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_errors_per_category: 10,
            warn_on_trailing_frame: true,
        }
    }
}
