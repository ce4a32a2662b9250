use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use eframe::egui::{ScrollArea, Ui};
use eframe::run_native;
use life::config::{ALIVE_PROBABILITY, COLUMNS, GENERATION_INTERVAL_MS, ROWS};
use life::patterns::{self, PATTERNS};
use life::{AliveProbability, CellState, Pattern, Simulation, SimulationConfig, Snapshot};

const CELL_SIZE: f32 = 16.0;

/// Conway's Game of Life on a bounded board.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Rows on the board
    #[arg(long, default_value_t = ROWS)]
    rows: usize,
    /// Columns on the board
    #[arg(long, default_value_t = COLUMNS)]
    columns: usize,
    /// Milliseconds between generations while running
    #[arg(long, default_value_t = GENERATION_INTERVAL_MS)]
    interval_ms: u64,
    /// Chance that a cell starts alive when randomizing
    #[arg(long, default_value_t = ALIVE_PROBABILITY)]
    alive_probability: f64,
    /// Preset to place on the board at startup (glider, blinker, toad, beacon)
    #[arg(long)]
    pattern: Option<String>,
}

impl Args {
    fn config(&self) -> anyhow::Result<SimulationConfig> {
        let config = SimulationConfig::default()
            .with_size(self.rows, self.columns)
            .with_generation_interval(Duration::from_millis(self.interval_ms))
            .with_alive_probability(AliveProbability::new(self.alive_probability)?);
        config.validate()?;
        Ok(config)
    }

    fn pattern(&self) -> anyhow::Result<Option<&'static Pattern>> {
        self.pattern
            .as_deref()
            .map(|name| patterns::find(name).with_context(|| format!("unknown pattern {name:?}")))
            .transpose()
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.config().context("invalid board configuration")?;
    let pattern = args.pattern()?;
    log::info!("starting {}x{} board", config.rows, config.columns);
    let simulation = Simulation::new(config).context("create simulation")?;
    if let Some(pattern) = pattern {
        simulation.load_pattern(pattern).context("place starting pattern")?;
    }

    run_native(
        "Game of Life GUI",
        eframe::NativeOptions::default(),
        Box::new(move |cc| Ok(Box::new(GuiOfLife::new(cc, simulation, pattern)))),
    )
    .map_err(|err| anyhow::anyhow!("run gui: {err}"))
}

struct GuiOfLife {
    simulation: Simulation,
    // Last snapshot pushed by the simulation; the only board state the view keeps.
    latest: Arc<Mutex<Snapshot>>,
    selected_pattern: usize,
}

impl GuiOfLife {
    fn new(cc: &eframe::CreationContext<'_>, simulation: Simulation, pattern: Option<&Pattern>) -> Self {
        let latest = Arc::new(Mutex::new(Snapshot {
            grid: simulation.grid(),
            generation: simulation.generation(),
        }));

        let ctx = cc.egui_ctx.clone();
        let sink = Arc::clone(&latest);
        simulation.subscribe(move |snapshot| {
            *sink.lock().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
            ctx.request_repaint();
        });

        Self {
            simulation,
            latest,
            selected_pattern: pattern
                .and_then(|pattern| PATTERNS.iter().position(|preset| preset == pattern))
                .unwrap_or(0),
        }
    }

    fn snapshot(&self) -> Snapshot {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn controls(&mut self, ui: &mut Ui, snapshot: &Snapshot) {
        ui.horizontal(|ui| {
            let running = self.simulation.is_running();
            if ui.button(if running { "Stop life" } else { "Start life" }).clicked() {
                self.simulation.toggle_running();
            }
            if ui.add_enabled(!running, egui::Button::new("Step")).clicked() {
                self.simulation.step();
            }
            if ui.button("Random").clicked() {
                self.simulation.randomize_grid();
            }
            if ui.button("Reset").clicked() {
                self.simulation.reset_grid();
            }

            ui.separator();

            egui::ComboBox::from_id_salt("pattern_selector")
                .selected_text(PATTERNS[self.selected_pattern].name)
                .show_ui(ui, |ui| {
                    for (i, pattern) in PATTERNS.iter().enumerate() {
                        ui.selectable_value(&mut self.selected_pattern, i, pattern.name);
                    }
                });
            if ui.button("Apply Pattern").clicked() {
                if let Err(err) = self.simulation.load_pattern(&PATTERNS[self.selected_pattern]) {
                    log::warn!("pattern does not fit: {err}");
                }
            }

            ui.separator();
            ui.label(format!("Generation: {}", snapshot.generation));
            ui.label(format!("Live cells: {}", snapshot.grid.population()));
        });
    }

    fn create_grid(&mut self, ui: &mut Ui, snapshot: &Snapshot) {
        let grid = &snapshot.grid;

        // Calculate the grid starting point
        let (rect, response) = ui.allocate_exact_size(
            egui::vec2(CELL_SIZE * grid.columns() as f32, CELL_SIZE * grid.rows() as f32),
            egui::Sense::click(),
        );

        let painter = ui.painter();
        for (row_index, row) in grid.iter_rows().enumerate() {
            for (col_index, cell) in row.iter().enumerate() {
                let pos = rect.min + egui::vec2(col_index as f32 * CELL_SIZE, row_index as f32 * CELL_SIZE);
                let color = match cell {
                    CellState::Alive => egui::Color32::WHITE,
                    CellState::Dead => egui::Color32::DARK_GRAY,
                };
                painter.rect_filled(
                    egui::Rect::from_min_size(pos, egui::vec2(CELL_SIZE, CELL_SIZE)).shrink(0.5),
                    CELL_SIZE / 4f32,
                    color,
                );
            }
        }

        // Editing is only offered while stopped so clicks never race a generation.
        if response.clicked() && !self.simulation.is_running() {
            if let Some(pos) = response.interact_pointer_pos() {
                let offset = pos - rect.min;
                let row = (offset.y / CELL_SIZE) as usize;
                let col = (offset.x / CELL_SIZE) as usize;
                if let Err(err) = self.simulation.toggle_cell(row, col) {
                    log::warn!("ignoring click: {err}");
                }
            }
        }
    }
}

impl eframe::App for GuiOfLife {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let snapshot = self.snapshot();
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::both().show(ui, |ui| {
                ui.heading("Game of Life");
                self.controls(ui, &snapshot);
                ui.separator();
                self.create_grid(ui, &snapshot);
            });
        });
    }
}
