use crate::prelude::*;
use bevy::{prelude::*, render::render_resource::ShaderType};
use bytemuck::{Pod, Zeroable};

// Duplicated in galaxy_points.wgsl, so make sure to update both
#[derive(ShaderType, Pod, Zeroable, Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct PointsUniform {
    /// Point size base in physical pixels, before per-point scale and depth attenuation.
    pub size: f32,
    pub time: f32,
}

impl PointsUniform {
    pub fn read(
        params: &GalaxyParameters,
        render_config: &GalaxyRenderConfig,
        elapsed_secs: f32,
        scale_factor: f32,
    ) -> Self {
        let pixel_ratio = scale_factor.min(render_config.max_pixel_ratio);
        Self {
            size: params.size * render_config.size_to_pixels * pixel_ratio,
            time: elapsed_secs * render_config.time_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_size_is_twenty_pixels_per_unit_ratio() {
        let uniform = PointsUniform::read(
            &GalaxyParameters::default(),
            &GalaxyRenderConfig::default(),
            5.0,
            1.0,
        );
        assert_relative_eq!(uniform.size, 20.0, epsilon = 1e-4);
        assert_relative_eq!(uniform.time, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn pixel_ratio_is_capped() {
        let config = GalaxyRenderConfig::default();
        let params = GalaxyParameters::default();
        let retina = PointsUniform::read(&params, &config, 0.0, 2.0);
        let dense = PointsUniform::read(&params, &config, 0.0, 3.5);
        assert_eq!(retina.size, dense.size);
    }
}
