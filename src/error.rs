use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GalaxyError {
    #[error("parameter `{name}` = {value} is outside [{min}, {max}]")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// The renderer-side buffer for a point field could not be released.
    /// Continuing would leak GPU memory on every regeneration.
    #[error("failed to release {resource} of galaxy generation {generation}")]
    ReleaseFailed {
        resource: &'static str,
        generation: i32,
    },
}
