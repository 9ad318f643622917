use crate::error::GalaxyError;
use bevy::prelude::*;

/// Parameters the point field is sampled from.
#[derive(Clone, Debug, PartialEq)]
pub struct GalaxyParameters {
    pub count: u32,
    /// Render size hint, only read by the point material.
    pub size: f32,
    pub radius: f32,
    pub branches: u32,
    /// Radians of twist per unit of radius.
    pub spin: f32,
    pub randomness: f32,
    /// Values below 1 push jitter towards the outer edge of its range instead of the branch centerline.
    pub randomness_power: f32,
    pub inside_color: Color,
    pub outside_color: Color,
}

impl Default for GalaxyParameters {
    fn default() -> Self {
        Self {
            count: 40_000,
            size: 0.01,
            radius: 5.0,
            branches: 3,
            spin: 1.0,
            randomness: 0.2,
            randomness_power: 3.0,
            inside_color: Color::srgb_u8(0xff, 0x60, 0x30),
            outside_color: Color::srgb_u8(0x1b, 0x39, 0x84),
        }
    }
}

impl GalaxyParameters {
    pub const MIN: Self = Self {
        count: 100,
        size: 0.001,
        radius: 0.01,
        branches: 2,
        spin: -5.0,
        randomness: 0.0,
        randomness_power: 1.0,
        inside_color: Color::BLACK,
        outside_color: Color::BLACK,
    };
    pub const MAX: Self = Self {
        count: 1_000_000,
        size: 0.1,
        radius: 20.0,
        branches: 20,
        spin: 5.0,
        randomness: 2.0,
        randomness_power: 10.0,
        inside_color: Color::WHITE,
        outside_color: Color::WHITE,
    };

    /// Clamps every numeric field into the editable range.
    pub fn clamped(&self) -> Self {
        let (min, max) = (&Self::MIN, &Self::MAX);
        Self {
            count: self.count.clamp(min.count, max.count),
            size: self.size.clamp(min.size, max.size),
            radius: self.radius.clamp(min.radius, max.radius),
            branches: self.branches.clamp(min.branches, max.branches),
            spin: self.spin.clamp(min.spin, max.spin),
            randomness: self.randomness.clamp(min.randomness, max.randomness),
            randomness_power: self
                .randomness_power
                .clamp(min.randomness_power, max.randomness_power),
            inside_color: self.inside_color,
            outside_color: self.outside_color,
        }
    }

    /// Reports the first field outside the editable range.
    pub fn validate(&self) -> Result<(), GalaxyError> {
        let (min, max) = (&Self::MIN, &Self::MAX);
        check("count", self.count as f64, min.count as f64, max.count as f64)?;
        check("size", self.size as f64, min.size as f64, max.size as f64)?;
        check("radius", self.radius as f64, min.radius as f64, max.radius as f64)?;
        check(
            "branches",
            self.branches as f64,
            min.branches as f64,
            max.branches as f64,
        )?;
        check("spin", self.spin as f64, min.spin as f64, max.spin as f64)?;
        check(
            "randomness",
            self.randomness as f64,
            min.randomness as f64,
            max.randomness as f64,
        )?;
        check(
            "randomness_power",
            self.randomness_power as f64,
            min.randomness_power as f64,
            max.randomness_power as f64,
        )
    }
}

fn check(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), GalaxyError> {
    // NaN fails both comparisons, so test for containment rather than exclusion
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(GalaxyError::InvalidParameter {
            name,
            value,
            min,
            max,
        })
    }
}

/// The committed parameter set. `generation` is bumped whenever a commit changes
/// the parameters or a fresh sample is requested.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct GalaxyConfig {
    pub generation: i32,
    pub params: GalaxyParameters,
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        Self {
            generation: 1,
            params: GalaxyParameters::default(),
        }
    }
}

impl GalaxyConfig {
    /// Resample with the current parameters and a new seed.
    pub fn request_regeneration(&mut self) {
        self.generation += 1;
    }
}

#[derive(Resource, Default)]
pub(super) struct GalaxyConfigOld(GalaxyParameters);

pub struct GalaxyConfigPlugin;

impl Plugin for GalaxyConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GalaxyConfig>()
            .init_resource::<GalaxyConfigOld>()
            .add_systems(Update, apply_ui_updates);
    }
}

pub(super) fn apply_ui_updates(
    mut galaxy_config_old: ResMut<GalaxyConfigOld>,
    mut galaxy_config: ResMut<GalaxyConfig>,
) {
    if galaxy_config.is_changed() && galaxy_config.params != galaxy_config_old.0 {
        galaxy_config.generation += 1;
        galaxy_config_old.0 = galaxy_config.params.clone();
        debug!("Galaxy parameters committed, generation {}", galaxy_config.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(GalaxyConfigPlugin);
        app
    }

    #[test]
    fn startup_does_not_bump_generation() {
        let mut app = test_app();
        app.update();
        assert_eq!(app.world().resource::<GalaxyConfig>().generation, 1);
    }

    #[test]
    fn committed_change_bumps_generation_once() {
        let mut app = test_app();
        app.update();

        app.world_mut().resource_mut::<GalaxyConfig>().params.count = 200;
        app.update();
        assert_eq!(app.world().resource::<GalaxyConfig>().generation, 2);

        app.update();
        assert_eq!(app.world().resource::<GalaxyConfig>().generation, 2);
    }

    #[test]
    fn identical_commit_is_ignored() {
        let mut app = test_app();
        app.update();

        let params = app.world().resource::<GalaxyConfig>().params.clone();
        app.world_mut().resource_mut::<GalaxyConfig>().params = params;
        app.update();
        assert_eq!(app.world().resource::<GalaxyConfig>().generation, 1);
    }

    #[test]
    fn clamped_respects_limits() {
        let params = GalaxyParameters {
            count: 0,
            radius: -1.0,
            branches: 50,
            randomness_power: 0.5,
            ..default()
        }
        .clamped();

        assert_eq!(params.count, GalaxyParameters::MIN.count);
        assert_eq!(params.radius, GalaxyParameters::MIN.radius);
        assert_eq!(params.branches, GalaxyParameters::MAX.branches);
        assert_eq!(params.randomness_power, 1.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn validate_names_offending_field() {
        let params = GalaxyParameters {
            radius: 0.0,
            ..default()
        };
        match params.validate() {
            Err(GalaxyError::InvalidParameter { name, .. }) => assert_eq!(name, "radius"),
            other => panic!("unexpected {other:?}"),
        }

        let params = GalaxyParameters {
            spin: f32::NAN,
            ..default()
        };
        assert!(params.validate().is_err());
        assert!(GalaxyParameters::default().validate().is_ok());
    }
}
