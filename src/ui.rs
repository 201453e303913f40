//! Tuning panel drawn over the tank.

use egui::Ui;

use crate::aquarium::Aquarium;
use crate::config::{LightColor, Tuning};
use crate::fish::{MAX_SPEED, MIN_SPEED};
use crate::time::Clock;

/// Draw the panel. Edits apply to `aquarium` and `tuning` immediately.
pub fn draw(ctx: &egui::Context, aquarium: &mut Aquarium, tuning: &mut Tuning, clock: &Clock) {
    egui::Window::new("Aquarium")
        .default_width(280.0)
        .resizable(true)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("{:.0} fps", clock.fps()));
                ui.label(
                    egui::RichText::new(format!("t = {:.1}s", clock.elapsed()))
                        .small()
                        .weak(),
                );
            });
            ui.horizontal(|ui| {
                let label = if tuning.paused { "Resume" } else { "Pause" };
                if ui.button(label).clicked() {
                    tuning.paused = !tuning.paused;
                }
                ui.add(
                    egui::Slider::new(&mut tuning.time_scale, 0.0..=4.0)
                        .text("Time Scale")
                        .fixed_decimals(2),
                );
            });

            ui.separator();
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.collapsing("Fish", |ui| fish_panel(ui, aquarium));
                ui.collapsing("Physics", |ui| physics_panel(ui, tuning));
                ui.collapsing("Lighting", |ui| lighting_panel(ui, tuning));
                ui.collapsing("Post-Processing", |ui| post_panel(ui, tuning));
            });
        });
}

fn fish_panel(ui: &mut Ui, aquarium: &mut Aquarium) {
    for agent in aquarium.fish_mut() {
        let id = ui.make_persistent_id(format!("fish_{}", agent.index));
        egui::collapsing_header::CollapsingState::load_with_default_open(ui.ctx(), id, false)
            .show_header(ui, |ui| {
                ui.label(format!("#{} {}", agent.index, agent.name));
            })
            .body(|ui| {
                let mut speed = agent.speed;
                if ui
                    .add(
                        egui::Slider::new(&mut speed, MIN_SPEED..=MAX_SPEED)
                            .text("Speed")
                            .step_by(0.1),
                    )
                    .on_hover_text("Path traversal and thrust multiplier")
                    .changed()
                {
                    agent.set_speed(speed);
                }

                let mut scale = agent.node.scale;
                if ui
                    .add(egui::Slider::new(&mut scale, 0.1..=3.0).text("Scale"))
                    .changed()
                {
                    agent.set_scale(scale);
                }
            });
    }
}

fn physics_panel(ui: &mut Ui, tuning: &mut Tuning) {
    ui.add(
        egui::Slider::new(&mut tuning.physics.gravity, -20.0..=0.0)
            .text("Gravity")
            .fixed_decimals(2),
    );
    ui.add(
        egui::Slider::new(&mut tuning.physics.buoyancy, 0.0..=30.0)
            .text("Buoyancy")
            .fixed_decimals(1),
    )
    .on_hover_text("Saved with the scene, not applied to fish");
}

fn lighting_panel(ui: &mut Ui, tuning: &mut Tuning) {
    let lighting = &mut tuning.lighting;
    light_editor(ui, "Ambient", &mut lighting.ambient, 0.0..=3.0);
    light_editor(ui, "Directional", &mut lighting.directional, 0.0..=3.0);
    light_editor(ui, "Spot", &mut lighting.spot, 0.0..=5.0);
    ui.add(
        egui::Slider::new(&mut lighting.spot_angle, 0.05..=std::f32::consts::FRAC_PI_2)
            .text("Spot Angle"),
    );
    ui.add(egui::Slider::new(&mut lighting.spot_penumbra, 0.0..=1.0).text("Penumbra"));
}

fn light_editor(
    ui: &mut Ui,
    label: &str,
    light: &mut LightColor,
    range: std::ops::RangeInclusive<f32>,
) {
    ui.horizontal(|ui| {
        hex_color_button(ui, &mut light.color);
        ui.add(egui::Slider::new(&mut light.intensity, range).text(label));
    });
}

fn post_panel(ui: &mut Ui, tuning: &mut Tuning) {
    let post = &mut tuning.post;
    ui.add(egui::Slider::new(&mut post.bloom_strength, 0.0..=3.0).text("Bloom Strength"));
    ui.add(egui::Slider::new(&mut post.bloom_threshold, 0.0..=1.0).text("Bloom Threshold"));
    ui.add(egui::Slider::new(&mut post.bloom_radius, 0.0..=1.0).text("Bloom Radius"));
    ui.add(egui::Slider::new(&mut post.vignette, 0.0..=1.0).text("Vignette"));
    ui.horizontal(|ui| {
        ui.label("Water:");
        hex_color_button(ui, &mut post.background);
    });
}

/// Colour picker over a `0xRRGGBB` value.
fn hex_color_button(ui: &mut Ui, hex: &mut u32) -> bool {
    let mut rgb = [(*hex >> 16) as u8, (*hex >> 8) as u8, *hex as u8];
    let changed = ui.color_edit_button_srgb(&mut rgb).changed();
    if changed {
        *hex = (rgb[0] as u32) << 16 | (rgb[1] as u32) << 8 | rgb[2] as u32;
    }
    changed
}
