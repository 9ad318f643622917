use super::{galaxy_config::apply_ui_updates, GalaxyField};
use crate::graphics::{GalaxyPointsBackend, GalaxyPointsBuffer};
use crate::prelude::*;
use bevy::{platform::time::Instant, prelude::*};
use rand::Rng;

pub struct SpawnPointsPlugin;

impl Plugin for SpawnPointsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(PointSpawningControl { generation: -1 })
            .init_resource::<PointCount>()
            .init_resource::<LiveGalaxy>()
            // spawned before PostUpdate so visibility sees the new points the same frame
            .add_systems(Update, manage_galaxy_points.after(apply_ui_updates))
            .add_systems(Last, dispose_on_exit);
    }
}

#[derive(Resource)]
struct PointSpawningControl {
    generation: i32,
}

/// The galaxy currently attached to the scene.
#[derive(Resource, Default)]
pub struct LiveGalaxy(pub GalaxyField<GalaxyPointsBuffer>);

/// Rebuilds the point field whenever the committed generation moves on.
/// The whole field is sampled before the previous one is released, so a frame
/// never sees a partial galaxy.
fn manage_galaxy_points(
    galaxy_config: Res<GalaxyConfig>,
    mut control: ResMut<PointSpawningControl>,
    mut live_galaxy: ResMut<LiveGalaxy>,
    mut point_count: ResMut<PointCount>,
    mut backend: GalaxyPointsBackend,
) -> Result {
    if control.generation == galaxy_config.generation {
        return Ok(());
    }
    control.generation = galaxy_config.generation;

    // the panel clamps its edits; anything else still generates, just degenerately
    if let Err(err) = galaxy_config.params.validate() {
        warn!("Generating galaxy with out-of-range parameters: {err}");
    }

    let seed: u64 = rand::rng().random();
    let started = Instant::now();
    let field = live_galaxy
        .0
        .regenerate(
            &galaxy_config.params,
            seed,
            galaxy_config.generation,
            &mut backend,
        )
        .inspect_err(|err| error!("Galaxy regeneration failed: {err}"))?;

    point_count.count = field.len();
    point_count.build_time = started.elapsed();
    info!(
        "Galaxy generation {} built: {} points in {:.1} ms",
        galaxy_config.generation,
        point_count.count,
        point_count.build_time.as_secs_f64() * 1000.0
    );
    Ok(())
}

fn dispose_on_exit(
    mut exit_events: EventReader<AppExit>,
    mut live_galaxy: ResMut<LiveGalaxy>,
    mut backend: GalaxyPointsBackend,
) -> Result {
    if exit_events.read().next().is_none() {
        return Ok(());
    }
    if let (Some(field), Some(generation)) = (live_galaxy.0.current(), live_galaxy.0.generation()) {
        debug!("Releasing galaxy generation {generation} ({} points)", field.len());
    }
    live_galaxy.0.dispose(&mut backend)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::GalaxyConfigPlugin;
    use crate::graphics::GalaxyPointsMaterial;
    use bevy::ecs::system::RunSystemOnce;

    #[derive(Resource, Default)]
    struct MeshesSeenInPostUpdate(Vec<Vec<AssetId<Mesh>>>);

    fn record_scene_meshes(
        points: Query<&Mesh3d>,
        mut seen: ResMut<MeshesSeenInPostUpdate>,
    ) {
        seen.0.push(points.iter().map(|mesh| mesh.id()).collect());
    }

    fn galaxy_app(count: u32) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .init_asset::<GalaxyPointsMaterial>()
            .init_resource::<GalaxyRenderConfig>()
            .insert_resource(GalaxyConfig {
                params: GalaxyParameters { count, ..default() },
                ..default()
            })
            .add_plugins((GalaxyConfigPlugin, SpawnPointsPlugin));
        app
    }

    fn live_mesh(app: &App) -> Option<AssetId<Mesh>> {
        app.world()
            .resource::<LiveGalaxy>()
            .0
            .buffer()
            .map(|buffer| buffer.mesh.id())
    }

    fn mesh_entities(app: &mut App) -> usize {
        let world = app.world_mut();
        world.query::<&Mesh3d>().iter(world).count()
    }

    #[test]
    fn regeneration_replaces_scene_assets() {
        let mut app = galaxy_app(100);
        app.update();
        assert_eq!(app.world().resource::<PointCount>().count, 100);

        app.world_mut().resource_mut::<GalaxyConfig>().params.count = 200;
        app.update();

        let point_count = app.world().resource::<PointCount>();
        assert_eq!(point_count.count, 200);
        assert!(point_count.build_time > std::time::Duration::ZERO);
        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 1);
        assert_eq!(app.world().resource::<Assets<GalaxyPointsMaterial>>().len(), 1);
        assert_eq!(mesh_entities(&mut app), 1);
    }

    #[test]
    fn new_points_are_in_scene_before_post_update() {
        let mut app = galaxy_app(100);
        app.init_resource::<MeshesSeenInPostUpdate>()
            .add_systems(PostUpdate, record_scene_meshes);
        app.update();
        let first = live_mesh(&app);

        app.world_mut().resource_mut::<GalaxyConfig>().params.count = 300;
        app.update();
        let second = live_mesh(&app);
        assert_ne!(first, second);

        let seen = &app.world().resource::<MeshesSeenInPostUpdate>().0;
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], first.into_iter().collect::<Vec<_>>());
        assert_eq!(seen[1], second.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn missing_mesh_asset_fails_release() {
        let mut app = galaxy_app(100);
        app.update();
        let generation = app.world().resource::<GalaxyConfig>().generation;

        let mesh = live_mesh(&app).expect("galaxy was uploaded");
        app.world_mut().resource_mut::<Assets<Mesh>>().remove(mesh);

        let result = app
            .world_mut()
            .run_system_once(
                move |mut live_galaxy: ResMut<LiveGalaxy>,
                 galaxy_config: Res<GalaxyConfig>,
                 mut backend: GalaxyPointsBackend| {
                    live_galaxy
                        .0
                        .regenerate(&galaxy_config.params, 7, generation + 1, &mut backend)
                        .map(PointField::len)
                },
            )
            .expect("system ran");

        assert_eq!(
            result,
            Err(GalaxyError::ReleaseFailed {
                resource: "point mesh",
                generation,
            })
        );
        assert!(app.world().resource::<LiveGalaxy>().0.current().is_none());
    }
}
