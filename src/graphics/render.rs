use super::{shader_types::PointsUniform, GalaxyPointsMaterial};
use crate::prelude::*;
use bevy::{prelude::*, window::PrimaryWindow};

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(MaterialPlugin::<GalaxyPointsMaterial> {
            prepass_enabled: false,
            shadows_enabled: false,
            ..default()
        });

        app.init_resource::<GalaxyRenderConfig>()
            .add_systems(Update, update_points_mat);
    }
}

/// Settings of the point renderer that are not part of the galaxy itself.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct GalaxyRenderConfig {
    /// Converts `GalaxyParameters::size` into the point size base in pixels.
    pub size_to_pixels: f32,
    /// Upper bound on the window scale factor used for point sizes.
    pub max_pixel_ratio: f32,
    /// Shader time per second of wall time.
    pub time_scale: f32,
}

impl Default for GalaxyRenderConfig {
    fn default() -> Self {
        Self {
            size_to_pixels: 2000.0,
            max_pixel_ratio: 2.0,
            time_scale: 0.1,
        }
    }
}

/// Pushes elapsed time and point size into the live material once per frame.
/// Time is never reset, so the spin continues across regenerations.
fn update_points_mat(
    live_galaxy: Res<LiveGalaxy>,
    galaxy_config: Res<GalaxyConfig>,
    render_config: Res<GalaxyRenderConfig>,
    time: Res<Time>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut materials: ResMut<Assets<GalaxyPointsMaterial>>,
) {
    let Some(buffer) = live_galaxy.0.buffer() else {
        return;
    };
    let Some(mat) = materials.get_mut(&buffer.material) else {
        return;
    };

    let scale_factor = windows.single().map(Window::scale_factor).unwrap_or(1.0);
    mat.uniform = PointsUniform::read(
        &galaxy_config.params,
        &render_config,
        time.elapsed_secs(),
        scale_factor,
    );
}
