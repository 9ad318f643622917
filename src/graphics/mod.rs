use bevy::prelude::*;

mod points_material;
mod render;
mod shader_types;

pub use points_material::{GalaxyPointsBackend, GalaxyPointsBuffer, GalaxyPointsMaterial};
pub use render::GalaxyRenderConfig;

pub struct GraphicsPlugin;

impl Plugin for GraphicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(render::RenderPlugin);
    }
}
