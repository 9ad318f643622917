pub use crate::error::GalaxyError;
pub use crate::galaxy::{GalaxyConfig, GalaxyParameters, LiveGalaxy, PointCount, PointField};
pub use crate::graphics::GalaxyRenderConfig;
