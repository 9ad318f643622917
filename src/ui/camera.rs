use crate::prelude::*;
use bevy::{
    input::mouse::{AccumulatedMouseMotion, MouseScrollUnit, MouseWheel},
    prelude::*,
};
use bevy_egui::EguiContexts;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera)
            .add_systems(PostUpdate, camera_control_system);
    }
}

fn spawn_camera(mut commands: Commands, mut clearcolor: ResMut<ClearColor>) {
    *clearcolor = ClearColor(Color::BLACK);

    let camera_main = CameraMain::looking_from(Vec3::new(3.0, 3.0, 3.0), Vec3::ZERO);
    commands.spawn((
        Camera3d::default(),
        Projection::from(PerspectiveProjection {
            fov: 75f32.to_radians(),
            near: 0.1,
            far: 100.0,
            ..default()
        }),
        Transform::from_translation(camera_main.translation()).looking_at(Vec3::ZERO, Vec3::Y),
        camera_main,
    ));
}

/// Orbit state: the camera sits on a sphere around `target_pos`.
#[derive(Component, Clone, Debug)]
pub struct CameraMain {
    target_pos: Vec3,
    yaw: f32,
    pitch: f32,
    distance: f32,
    angular_velocity: Vec2,
    smooth_zoom_buffer: f32,
}

impl CameraMain {
    const MIN_DISTANCE: f32 = 0.5;
    const MAX_DISTANCE: f32 = 60.0;
    const PITCH_LIMIT: f32 = 1.55;
    const ROTATE_SPEED: f32 = 0.005;
    /// Fraction of the angular velocity kept per 60th of a second.
    const DAMPING: f32 = 0.9;

    pub fn looking_from(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(Self::MIN_DISTANCE);
        Self {
            target_pos: target,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            distance,
            angular_velocity: Vec2::ZERO,
            smooth_zoom_buffer: 0.0,
        }
    }

    pub fn translation(&self) -> Vec3 {
        let offset = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        );
        self.target_pos + offset * self.distance
    }

    pub fn look_pos(&self) -> Vec3 {
        self.target_pos
    }

    /// Integrates the damped orbit velocity over `dt` seconds.
    fn step(&mut self, dt: f32) {
        self.yaw -= self.angular_velocity.x;
        self.pitch = (self.pitch + self.angular_velocity.y).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
        self.angular_velocity *= Self::DAMPING.powf(dt * 60.0);
    }

    /// Moves part of the buffered scroll into the distance each frame,
    /// always at least `smooth_zoom_min` so the buffer drains.
    fn apply_smooth_zoom(&mut self) {
        let smooth_zoom_min = 0.001f32;
        let smooth_zoom_factor = 0.2f32;

        let smooth_zoom_amount = if self.smooth_zoom_buffer < 0.0 {
            f32::min(
                self.smooth_zoom_buffer * smooth_zoom_factor,
                (-smooth_zoom_min).max(self.smooth_zoom_buffer),
            )
        } else {
            f32::max(
                self.smooth_zoom_buffer * smooth_zoom_factor,
                smooth_zoom_min.min(self.smooth_zoom_buffer),
            )
        };
        self.distance = (self.distance * (1.0 - smooth_zoom_amount))
            .clamp(Self::MIN_DISTANCE, Self::MAX_DISTANCE);
        self.smooth_zoom_buffer -= smooth_zoom_amount;
    }
}

#[allow(clippy::too_many_arguments)]
pub fn camera_control_system(
    mut query: Query<(&mut Transform, &mut CameraMain)>,
    mut contexts: EguiContexts,
    keys: Res<ButtonInput<KeyCode>>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mut scroll_evr: EventReader<MouseWheel>,
    time: Res<Time>,
    galaxy_config: Res<GalaxyConfig>,
) {
    let Ok((mut transform, mut camera_main)) = query.single_mut() else {
        return;
    };

    // the side panel owns the pointer while it is hovered or dragged
    let ctx = contexts.ctx_mut();
    let pointer_captured = ctx.wants_pointer_input() || ctx.is_using_pointer();

    if mouse_buttons.pressed(MouseButton::Left) && !pointer_captured {
        camera_main.angular_velocity = mouse_motion.delta * CameraMain::ROTATE_SPEED;
    }

    for ev in scroll_evr.read() {
        if pointer_captured {
            continue;
        }
        match ev.unit {
            MouseScrollUnit::Line => {
                camera_main.smooth_zoom_buffer += ev.y * 0.05;
            }
            MouseScrollUnit::Pixel => {
                camera_main.smooth_zoom_buffer += ev.y * 0.002;
            }
        }
    }

    // key delta to use later
    let mut key_delta = Vec3::ZERO;
    if !ctx.wants_keyboard_input() {
        if keys.pressed(KeyCode::KeyW) {
            key_delta.z -= 1.0;
        }
        if keys.pressed(KeyCode::KeyA) {
            key_delta.x -= 1.0;
        }
        if keys.pressed(KeyCode::KeyS) {
            key_delta.z += 1.0;
        }
        if keys.pressed(KeyCode::KeyD) {
            key_delta.x += 1.0;
        }
    }

    let dt = time.delta_secs();
    camera_main.step(dt);
    camera_main.apply_smooth_zoom();

    // pan relative to the current heading
    let heading = Quat::from_rotation_y(camera_main.yaw);
    let speed = camera_main.distance * 0.5 * dt;
    camera_main.target_pos += heading * key_delta * speed;

    let reach = galaxy_config.params.radius;
    let d = camera_main.target_pos.xz().length();
    if d > reach {
        camera_main.target_pos *= reach / d;
    }

    transform.translation = camera_main.translation();
    transform.look_at(camera_main.look_pos(), Vec3::Y);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looking_from_round_trips_eye_position() {
        let eye = Vec3::new(3.0, 3.0, 3.0);
        let camera = CameraMain::looking_from(eye, Vec3::ZERO);
        assert!(camera.translation().abs_diff_eq(eye, 1e-5));
    }

    #[test]
    fn orbit_velocity_decays() {
        let mut camera = CameraMain::looking_from(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        camera.angular_velocity = Vec2::new(0.1, 0.0);

        for _ in 0..120 {
            camera.step(1.0 / 60.0);
        }
        assert!(camera.angular_velocity.length() < 1e-5);
        assert!((camera.translation().length() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn zoom_buffer_drains_within_limits() {
        let mut camera = CameraMain::looking_from(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        camera.smooth_zoom_buffer = 10.0;

        for _ in 0..2000 {
            camera.apply_smooth_zoom();
        }
        assert!(camera.smooth_zoom_buffer.abs() < 1e-3);
        assert!(camera.distance >= CameraMain::MIN_DISTANCE);
    }
}
