use crate::prelude::*;
use bevy::{color::ColorToPacked, prelude::*};
use bevy_egui::{egui, EguiContexts};

pub struct ConfigEguiPlugin;

impl Plugin for ConfigEguiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ParameterEditor>()
            .add_systems(Startup, configure_visuals_system)
            .add_systems(Update, ui_system);
    }
}

fn configure_visuals_system(mut contexts: EguiContexts) {
    contexts.ctx_mut().set_visuals(egui::Visuals {
        window_corner_radius: 0.0.into(),
        ..Default::default()
    });
}

/// Draft copy of the parameters the panel edits. Edits are only handed to
/// `GalaxyConfig` once the gesture that made them has finished.
#[derive(Resource, Default)]
pub struct ParameterEditor {
    draft: GalaxyParameters,
    dirty: bool,
}

impl ParameterEditor {
    pub fn mark_edited(&mut self) {
        self.dirty = true;
    }

    /// Returns the clamped draft once per finished edit. While `gesture_active`
    /// the edit is held back.
    pub fn try_commit(&mut self, gesture_active: bool) -> Option<GalaxyParameters> {
        if !self.dirty || gesture_active {
            return None;
        }
        self.dirty = false;
        self.draft = self.draft.clamped();
        Some(self.draft.clone())
    }

    /// Replaces the draft when nothing is pending, so external changes to the
    /// committed set show up in the panel.
    pub fn sync_from(&mut self, committed: &GalaxyParameters) {
        if !self.dirty && self.draft != *committed {
            self.draft = committed.clone();
        }
    }
}

fn color_ui(ui: &mut egui::Ui, color: &mut Color, label: &str) -> bool {
    ui.horizontal(|ui| {
        let mut rgb = color.to_srgba().to_u8_array_no_alpha();
        let changed = ui.color_edit_button_srgb(&mut rgb).changed();
        ui.label(label);
        if changed {
            *color = Color::srgb_u8(rgb[0], rgb[1], rgb[2]);
        }
        changed
    })
    .inner
}

fn parameters_ui(params: &mut GalaxyParameters, ui: &mut egui::Ui) -> bool {
    let minval = GalaxyParameters::MIN;
    let maxval = GalaxyParameters::MAX;

    let sliders = [
        ui.add(
            egui::Slider::new(&mut params.count, minval.count..=maxval.count)
                .logarithmic(true)
                .step_by(100.0)
                .text("Star count"),
        ),
        ui.add(
            egui::Slider::new(&mut params.size, minval.size..=maxval.size)
                .step_by(0.001)
                .text("Star size"),
        ),
        ui.add(
            egui::Slider::new(&mut params.radius, minval.radius..=maxval.radius)
                .step_by(0.01)
                .text("Galaxy radius"),
        ),
        ui.add(
            egui::Slider::new(&mut params.branches, minval.branches..=maxval.branches)
                .text("Branches"),
        ),
        ui.add(
            egui::Slider::new(&mut params.spin, minval.spin..=maxval.spin)
                .step_by(0.01)
                .text("Branch spin"),
        ),
        ui.add(
            egui::Slider::new(&mut params.randomness, minval.randomness..=maxval.randomness)
                .step_by(0.001)
                .text("Randomness"),
        ),
        ui.add(
            egui::Slider::new(
                &mut params.randomness_power,
                minval.randomness_power..=maxval.randomness_power,
            )
            .step_by(0.001)
            .text("Randomness power"),
        ),
    ];
    let mut changed = sliders.iter().any(egui::Response::changed);

    ui.separator();
    changed |= color_ui(ui, &mut params.inside_color, "Inside color");
    changed |= color_ui(ui, &mut params.outside_color, "Outside color");
    changed
}

fn ui_system(
    mut contexts: EguiContexts,
    mut editor: ResMut<ParameterEditor>,
    mut galaxy_config: ResMut<GalaxyConfig>,
    point_count: Res<PointCount>,
) {
    let ctx = contexts.ctx_mut();
    editor.sync_from(&galaxy_config.params);

    let mut regenerate = false;
    egui::SidePanel::left("side_panel")
        .default_width(260.0)
        .show(ctx, |ui| {
            ui.heading("Galaxy");

            if parameters_ui(&mut editor.draft, ui) {
                editor.mark_edited();
            }

            ui.separator();
            ui.label(format!("{} points", point_count.count));
            regenerate = ui.button("Regenerate").clicked();
        });

    // a drag or an open text field is still part of the edit
    let gesture_active = ctx.is_using_pointer()
        || ctx.wants_keyboard_input()
        || ctx.input(|input| input.pointer.any_down());

    if let Some(params) = editor.try_commit(gesture_active) {
        galaxy_config.params = params;
    }
    if regenerate {
        galaxy_config.request_regeneration();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_to_commit_without_edits() {
        let mut editor = ParameterEditor::default();
        assert!(editor.try_commit(false).is_none());
    }

    #[test]
    fn edit_is_held_until_gesture_ends() {
        let mut editor = ParameterEditor::default();
        editor.draft.count = 500;
        editor.mark_edited();

        assert!(editor.try_commit(true).is_none());
        editor.draft.count = 900;
        assert!(editor.try_commit(true).is_none());

        let committed = editor.try_commit(false).map(|params| params.count);
        assert_eq!(committed, Some(900));
        assert!(editor.try_commit(false).is_none());
    }

    #[test]
    fn commit_clamps_to_declared_range() {
        let mut editor = ParameterEditor::default();
        editor.draft.randomness_power = 0.25;
        editor.draft.branches = 0;
        editor.mark_edited();

        let Some(params) = editor.try_commit(false) else {
            panic!("edit was not committed");
        };
        assert_eq!(params.randomness_power, 1.0);
        assert_eq!(params.branches, GalaxyParameters::MIN.branches);
    }

    #[test]
    fn pending_draft_survives_sync() {
        let mut editor = ParameterEditor::default();
        editor.draft.spin = 2.0;
        editor.mark_edited();

        editor.sync_from(&GalaxyParameters::default());
        assert_eq!(editor.draft.spin, 2.0);

        editor.try_commit(false);
        let external = GalaxyParameters {
            spin: -1.0,
            ..default()
        };
        editor.sync_from(&external);
        assert_eq!(editor.draft, external);
    }
}
