use eframe::egui;
use egui_plot::{HLine, Line, Plot, PlotPoints, VLine};

use super::plotter::SignalPlotter;
use super::VisualizationConfig;

/// End-of-session window: raw and filtered EEG with deviation markers, and
/// the round results.
pub struct SessionWindow {
    plotter: SignalPlotter,
    config: VisualizationConfig,
}

impl SessionWindow {
    pub fn new(plotter: SignalPlotter, config: VisualizationConfig) -> Self {
        Self { plotter, config }
    }

    /// Blocks until the window is closed. Must run on the main thread.
    pub fn run(plotter: SignalPlotter, config: VisualizationConfig) -> Result<(), eframe::Error> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([config.window_width as f32, config.window_height as f32])
                .with_title("LexInsight - Session EEG"),
            ..Default::default()
        };

        eframe::run_native(
            "LexInsight Session",
            options,
            Box::new(|_cc| Ok(Box::new(SessionWindow::new(plotter, config)))),
        )
    }

    fn plot_signal(
        &self,
        ui: &mut egui::Ui,
        name: &str,
        data: &[(f64, f64)],
        color: egui::Color32,
        mean: Option<f64>,
    ) {
        if data.is_empty() {
            ui.label("No samples recorded.");
            return;
        }

        let points: PlotPoints = data.iter().map(|(t, v)| [*t, *v]).collect();
        let line = Line::new(points).color(color).width(1.0).name(name);

        let markers: Vec<VLine> = if self.config.show_deviations {
            self.plotter
                .deviations()
                .iter()
                .map(|(start, _)| VLine::new(*start).color(egui::Color32::RED).width(1.0))
                .collect()
        } else {
            Vec::new()
        };

        Plot::new(name)
            .height(self.config.plot_height_per_signal as f32)
            .show_axes([true, true])
            .show_grid([true, true])
            .allow_zoom(true)
            .allow_drag(true)
            .allow_scroll(true)
            .show(ui, |plot_ui| {
                plot_ui.line(line);
                if let Some(mean) = mean {
                    plot_ui.hline(HLine::new(mean).color(egui::Color32::GRAY).name("mean"));
                }
                for marker in markers {
                    plot_ui.vline(marker);
                }
            });
    }
}

impl eframe::App for SessionWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("LexInsight - Session EEG");
            ui.label(format!(
                "Mean {:.3} | {} distinct deviation samples",
                self.plotter.mean(),
                self.plotter.deviations().len()
            ));
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                if self.config.show_raw_signal {
                    ui.heading("Raw EEG");
                    self.plot_signal(ui, "raw", self.plotter.raw(), egui::Color32::LIGHT_BLUE, None);
                    ui.add_space(10.0);
                }

                if self.config.show_filtered_signal {
                    ui.heading("Filtered EEG");
                    self.plot_signal(
                        ui,
                        "filtered",
                        self.plotter.filtered(),
                        egui::Color32::LIGHT_GREEN,
                        Some(self.plotter.mean()),
                    );
                    ui.add_space(10.0);
                }

                ui.separator();
                ui.heading("Rounds");
                egui::Grid::new("results").striped(true).show(ui, |ui| {
                    ui.strong("Round");
                    ui.strong("Words");
                    ui.strong("Chosen");
                    ui.strong("Metric");
                    ui.end_row();
                    for result in self.plotter.results() {
                        ui.label(result.index.to_string());
                        ui.label(result.words.join(" / "));
                        ui.label(result.chosen_word.as_str());
                        ui.label(result.metric.to_string());
                        ui.end_row();
                    }
                });
            });
        });
    }
}
