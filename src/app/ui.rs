use crate::app::SceneApp;
use super::data::TunableKind;
use super::variant::{MeshSource, SceneVariant};

use std::path::Path;
use std::time::Instant;

impl eframe::App for SceneApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Drain hot-reload notifications; the reload waits until they settle
        let now = Instant::now();
        if self.shader_update_receiver.try_iter().count() > 0 {
            self.reload_debounce.record(now);
        }
        if self.reload_debounce.take_due(now) {
            self.try_reload_shaders();
        } else if let Some(wait) = self.reload_debounce.remaining(now) {
            ctx.request_repaint_after(wait);
        }

        self.poll_pending_model();

        egui::SidePanel::right("controls_panel")
            .default_width(250.0)
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading("Controls");
                    ui.add_space(8.0);

                    let mut selected = self.scene.variant();
                    egui::ComboBox::from_label("Scene")
                        .selected_text(selected.label())
                        .show_ui(ui, |ui| {
                            for variant in SceneVariant::ALL {
                                ui.selectable_value(&mut selected, variant, variant.label());
                            }
                        });
                    if selected != self.scene.variant() {
                        self.switch_variant(selected);
                    }

                    ui.separator();

                    // Frame loop
                    ui.horizontal(|ui| {
                        let label = if self.driver.is_running() { "Pause" } else { "Resume" };
                        if ui.button(label).clicked() {
                            if self.driver.is_running() {
                                self.driver.stop();
                            } else {
                                self.driver.start();
                            }
                        }
                        let report = &self.last_report;
                        ui.label(
                            egui::RichText::new(format!(
                                "{:.2}s  frame {}  dt {:.1}ms{}",
                                report.elapsed,
                                report.frame,
                                report.delta * 1000.0,
                                if report.animated { "  animated" } else { "" }
                            ))
                            .family(egui::FontFamily::Monospace)
                            .small(),
                        );
                    });

                    ui.separator();

                    ui.label(egui::RichText::new("Tunables:").strong());
                    self.render_tunables(ui);

                    if matches!(self.scene.variant().config().mesh, MeshSource::Model { .. }) {
                        ui.separator();
                        self.render_model_section(ui);
                    }

                    ui.separator();

                    // Export section
                    ui.label(egui::RichText::new("Export:").strong());
                    ui.horizontal(|ui| {
                        ui.label("Width:");
                        ui.add(egui::DragValue::new(&mut self.export_resolution[0]).speed(10).clamp_range(1..=8192));
                    });
                    ui.horizontal(|ui| {
                        ui.label("Height:");
                        ui.add(egui::DragValue::new(&mut self.export_resolution[1]).speed(10).clamp_range(1..=8192));
                    });
                    ui.add_space(4.0);
                    if ui.button("Export Image").clicked() {
                        self.export_image();
                    }

                    if let Some(error) = &self.last_error {
                        ui.separator();
                        egui::ScrollArea::vertical()
                            .id_source("error_scroll")
                            .max_height(150.0)
                            .show(ui, |ui| {
                                ui.label(egui::RichText::new("Error:").color(egui::Color32::RED).strong());
                                ui.label(
                                    egui::RichText::new(error)
                                        .color(egui::Color32::LIGHT_RED)
                                        .family(egui::FontFamily::Monospace),
                                );
                            });
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::Frame::canvas(ui.style()).show(ui, |ui| {
                self.custom_painting(ui);
            });
        });
    }

    fn on_exit(&mut self, gl: Option<&glow::Context>) {
        self.driver.stop();
        self.pending_model = None;
        if let Some(gl) = gl {
            self.renderer.lock().destroy(gl);
        }
    }
}

impl SceneApp {
    fn render_tunables(&mut self, ui: &mut egui::Ui) {
        for index in 0..self.scene.tunables().len() {
            let tunable = &self.scene.tunables()[index];
            let label = tunable.label.clone();
            let mut kind = tunable.kind.clone();

            let changed = ui
                .horizontal(|ui| match &mut kind {
                    TunableKind::Color(rgb) => {
                        let changed = ui.color_edit_button_rgb(rgb).changed();
                        ui.label(&label);
                        changed
                    }
                    TunableKind::Range { value, min, max, step } => ui
                        .add(
                            egui::Slider::new(value, *min..=*max)
                                .step_by(*step as f64)
                                .text(label.as_str()),
                        )
                        .changed(),
                })
                .inner;

            if changed {
                if let Err(e) = self.scene.set_tunable(index, kind) {
                    log::warn!("Ignoring edit of `{}`: {}", label, e);
                }
            }
        }
    }

    fn render_model_section(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Model:").strong());

        let status = match (&self.pending_model, self.scene.model()) {
            (Some(pending), _) => format!("loading {}", file_label(pending.path())),
            (None, Some(model)) => format!("{} ({} meshes)", file_label(&model.path), model.mesh_count),
            (None, None) => "not loaded".to_string(),
        };

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(status).family(egui::FontFamily::Monospace).small());

            if ui.button("Open").clicked() {
                let start_dir = self
                    .scene
                    .model()
                    .and_then(|m| m.path.parent().map(Path::to_path_buf))
                    .unwrap_or_else(|| Path::new(".").to_path_buf());
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Wavefront OBJ", &["obj"])
                    .set_directory(start_dir)
                    .pick_file()
                {
                    self.open_model(path);
                }
            }
        });
    }
}

fn file_label(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown")
}
