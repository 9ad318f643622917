use bevy::prelude::*;
use std::time::Duration;

mod field_lifecycle;
mod galaxy_config;
mod point_field;
mod spawn_points;

pub use field_lifecycle::{GalaxyField, PointFieldBackend};
pub use galaxy_config::{GalaxyConfig, GalaxyConfigPlugin, GalaxyParameters};
pub use point_field::PointField;
pub use spawn_points::{LiveGalaxy, SpawnPointsPlugin};

/// Size of the live field and how long it took to build.
#[derive(Resource, Default)]
pub struct PointCount {
    pub count: usize,
    pub build_time: Duration,
}
