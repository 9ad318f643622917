use crate::prelude::*;
use bevy::diagnostic::DiagnosticsStore;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;

pub struct FpsWidgetPlugin;

impl Plugin for FpsWidgetPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_widget)
            .add_systems(Update, update_widget_system)
            .add_plugins(FrameTimeDiagnosticsPlugin::default());
    }
}

#[derive(Component)]
struct FPSWidget {}

#[derive(Component)]
struct PointsWidget {}

fn setup_widget(mut commands: Commands) {
    let holder = commands
        .spawn((
            Node {
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::FlexStart,
                position_type: PositionType::Absolute,
                justify_content: JustifyContent::FlexStart,
                width: Val::Px(240.),
                right: Val::Percent(1.),
                top: Val::Percent(1.),
                bottom: Val::Auto,
                left: Val::Auto,
                padding: UiRect::all(Val::Px(4.0)),
                ..default()
            },
            BackgroundColor(Color::linear_rgba(0.0, 0.03, 0.08, 0.5)),
            GlobalZIndex(i32::MAX - 1),
        ))
        .id();

    let font = TextFont {
        font_size: 16.0,
        ..default()
    };
    spawn_row(&mut commands, holder, font.clone(), FPSWidget {});
    spawn_row(&mut commands, holder, font, PointsWidget {});
}

fn spawn_row(commands: &mut Commands, holder: Entity, font: TextFont, marker: impl Component) {
    let text = commands.spawn((Text(" N/A".to_string()), font, marker)).id();
    commands
        .spawn((
            Node {
                padding: UiRect::all(Val::Px(4.0)),
                ..Default::default()
            },
            GlobalZIndex(i32::MAX),
        ))
        .add_child(text)
        .insert(ChildOf(holder));
}

fn update_widget_system(
    diagnostics: Res<DiagnosticsStore>,
    point_count: Res<PointCount>,
    mut fps_query: Query<&mut Text, (With<FPSWidget>, Without<PointsWidget>)>,
    mut points_query: Query<&mut Text, (With<PointsWidget>, Without<FPSWidget>)>,
) {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps| fps.smoothed())
        .unwrap_or(0.0);
    let frame_time = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FRAME_TIME)
        .and_then(|fps| fps.smoothed())
        .unwrap_or(0.0);

    for mut text in &mut fps_query {
        let label = "FPS: ";

        let fps_str = format!("{fps:.1} ({frame_time:.2} ms)");
        text.0 = format!("{:>6} {:<8}", label, fps_str);
    }

    if point_count.is_changed() {
        for mut text in &mut points_query {
            let build_ms = point_count.build_time.as_secs_f64() * 1000.0;
            text.0 = format!("{:>6} {} ({build_ms:.1} ms)", "Stars:", point_count.count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn widget_has_one_row_per_readout() {
        let mut world = World::new();
        world.run_system_once(setup_widget).expect("setup ran");

        let rows = world
            .query_filtered::<&ChildOf, With<Text>>()
            .iter(&world)
            .count();
        let fps = world.query_filtered::<(), With<FPSWidget>>().iter(&world).count();
        let points = world
            .query_filtered::<(), With<PointsWidget>>()
            .iter(&world)
            .count();
        assert_eq!((rows, fps, points), (2, 1, 1));
    }
}
