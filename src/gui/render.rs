//! Live view rendering functions.

use eframe::egui::{self, Color32, RichText, Vec2};

use super::state::{GuiState, SessionStatus, VehiclePanel};
use crate::chart::stage_label;

/// Renders the status line and the Stop button. Returns true when Stop was clicked.
pub fn render_controls(ui: &mut egui::Ui, state: &GuiState, frames: u64) -> bool {
    let mut stop_clicked = false;

    ui.horizontal(|ui| {
        ui.label("Status:");

        let status_color = match &state.status {
            SessionStatus::Running { .. } => Color32::from_rgb(0, 120, 200),
            SessionStatus::Finished { .. } => Color32::from_rgb(0, 150, 0),
            SessionStatus::Aborted { .. } => Color32::from_rgb(200, 150, 0),
        };
        ui.label(RichText::new(state.status.status_text()).color(status_color));

        if let Some(elapsed) = state.status.elapsed_text() {
            ui.add_space(12.0);
            ui.label(format!("{}  frame {}", elapsed, frames));
        }

        ui.add_space(20.0);

        ui.add_enabled_ui(state.status.is_running() && !state.stop_requested, |ui| {
            if ui.button(RichText::new("◼ Stop").size(16.0)).clicked() {
                stop_clicked = true;
            }
        });
    });

    ui.label(
        RichText::new(format!("Output: {}", state.session_dir.display()))
            .small()
            .color(Color32::GRAY),
    );

    stop_clicked
}

/// Renders the vehicle charts side by side, each with its latest readings below.
pub fn render_charts(ui: &mut egui::Ui, panels: &[VehiclePanel], chart_size: Vec2) {
    ui.horizontal_wrapped(|ui| {
        for panel in panels {
            ui.vertical(|ui| {
                ui.label(RichText::new(&panel.info.name).strong());

                if let Some(texture) = &panel.texture {
                    ui.image((texture.id(), chart_size));
                } else {
                    let (rect, _response) =
                        ui.allocate_exact_size(chart_size, egui::Sense::hover());
                    ui.painter().rect_filled(rect, 4.0, Color32::from_gray(230));
                }

                match &panel.latest {
                    Some(sample) => {
                        ui.label(format!("T {:+.2} s", sample.time));
                        for (idx, reading) in sample.stages.iter().enumerate() {
                            ui.label(format!(
                                "{}: {} km  {} km/h",
                                stage_label(idx),
                                reading.altitude,
                                reading.speed
                            ));
                        }
                    }
                    None => {
                        ui.label(RichText::new("Waiting for data...").color(Color32::GRAY));
                    }
                }
            });
            ui.add_space(12.0);
        }
    });
}
