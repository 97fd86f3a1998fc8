//! Live view for a running session.
//!
//! Drains the sample channel on every repaint, keeps a telemetry series per
//! vehicle and shows each as a chart texture rendered with plotters.

pub mod render;
pub mod state;

use std::sync::mpsc::Receiver;
use std::time::Duration;

use eframe::egui::{self, Vec2};

use crate::chart::render_to_buffer;
use crate::session::config::ChartConfig;
use crate::session::queue::drain_samples;
use crate::session::{frames_processed, request_abort, SessionHandle};
use crate::telemetry::Sample;

use state::GuiState;

/// Repaint interval while the session runs.
const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

/// Main GUI application struct.
pub struct GuiApp {
    state: GuiState,
    receiver: Receiver<Sample>,
    chart: ChartConfig,
}

impl GuiApp {
    /// Takes over the session's sample channel. The polling thread is
    /// detached; it ends on its own or when Stop is clicked.
    pub fn new(handle: SessionHandle, chart: ChartConfig) -> Self {
        let SessionHandle {
            session_dir,
            vehicles,
            receiver,
            ..
        } = handle;

        Self {
            state: GuiState::new(session_dir, vehicles),
            receiver,
            chart,
        }
    }

    /// Pulls queued samples and notices when the polling loop has finished.
    fn poll_samples(&mut self) {
        let (samples, finished) = drain_samples(&self.receiver);
        self.state.apply_samples(samples);
        if finished {
            self.state.finish(frames_processed());
        }
    }

    /// Redraws the chart textures of vehicles that received samples.
    fn refresh_textures(&mut self, ctx: &egui::Context) {
        let (width, height) = (self.chart.width, self.chart.height);

        for panel in self.state.panels.iter_mut().filter(|p| p.dirty) {
            panel.dirty = false;

            let pixels = match render_to_buffer(&panel.series, width, height) {
                Ok(pixels) => pixels,
                Err(e) => {
                    crate::log(&format!("GUI: Failed to render chart for {}: {}", panel.info.name, e));
                    continue;
                }
            };
            let image = egui::ColorImage::from_rgb([width as usize, height as usize], &pixels);

            match &mut panel.texture {
                Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                None => {
                    panel.texture = Some(ctx.load_texture(
                        format!("chart_{}", panel.info.name),
                        image,
                        egui::TextureOptions::LINEAR,
                    ));
                }
            }
        }
    }

    fn handle_stop(&mut self) {
        request_abort();
        self.state.stop_requested = true;
        crate::log("GUI: Requested session stop");
    }
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_samples();
        self.refresh_textures(ctx);

        if self.state.status.is_running() {
            ctx.request_repaint_after(REPAINT_INTERVAL);
        }

        let chart_size = Vec2::new(self.chart.width as f32, self.chart.height as f32);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Launch Telemetry");
            ui.add_space(8.0);

            if render::render_controls(ui, &self.state, frames_processed()) {
                self.handle_stop();
            }

            ui.separator();

            egui::ScrollArea::both().show(ui, |ui| {
                render::render_charts(ui, &self.state.panels, chart_size);
            });
        });
    }
}

/// Run the live view for a started session.
/// This function blocks until the window is closed.
pub fn run_gui(handle: SessionHandle, chart: ChartConfig) -> eframe::Result<()> {
    let vehicle_count = handle.vehicles.len().max(1) as f32;
    let width = (chart.width as f32 + 24.0) * vehicle_count + 24.0;
    let height = chart.height as f32 + 200.0;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(Vec2::new(width, height))
            .with_min_inner_size(Vec2::new(400.0, 300.0))
            .with_title("Launch Telemetry"),
        ..Default::default()
    };

    crate::log("GUI: Calling eframe::run_native...");

    eframe::run_native(
        "Launch Telemetry",
        options,
        Box::new(move |_cc| Ok(Box::new(GuiApp::new(handle, chart)))),
    )
}
