use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::grid::{CellState, Grid};
use crate::patterns::Pattern;

/// What observers receive after every change to the board.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub grid: Arc<Grid>,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn Fn(&Snapshot) + Send>;

struct State {
    grid: Arc<Grid>,
    generation: u64,
    running: bool,
    // Bumped on every start so a worker from an earlier run never resumes.
    run: u64,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
    worker: Option<JoinHandle<()>>,
}

impl State {
    fn is_current(&self, run: u64) -> bool {
        self.running && self.run == run
    }

    fn replace(&mut self, grid: Grid, generation: u64) {
        self.grid = Arc::new(grid);
        self.generation = generation;
        let snapshot = Snapshot {
            grid: Arc::clone(&self.grid),
            generation,
        };
        // A panicking observer is dropped; the rest still see this snapshot.
        self.observers.retain(|(id, observer)| {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| observer(&snapshot)));
            if delivered.is_err() {
                log::error!("observer {id:?} panicked at generation {generation}, unsubscribing it");
            }
            delivered.is_ok()
        });
    }
}

struct Shared {
    config: SimulationConfig,
    state: Mutex<State>,
    wake: Condvar,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns the current board and drives it one generation per interval while running.
///
/// Every grid replacement happens under a single lock, so generations, edits
/// and resets are applied one at a time and each is published to observers
/// as a complete [`Snapshot`]. Observers run while that lock is held and must
/// not call back into the simulation.
pub struct Simulation {
    shared: Arc<Shared>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Like [`Simulation::new`], drawing randomized boards from `rng`.
    pub fn with_rng<R>(config: SimulationConfig, rng: R) -> Result<Self>
    where
        R: RngCore + Send + 'static,
    {
        config.validate()?;
        let state = State {
            grid: Arc::new(Grid::empty(config.rows, config.columns)),
            generation: 0,
            running: false,
            run: 0,
            observers: Vec::new(),
            next_subscription: 0,
            worker: None,
        };
        Ok(Simulation {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(state),
                wake: Condvar::new(),
                rng: Mutex::new(Box::new(rng)),
            }),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.shared.config
    }

    pub fn grid(&self) -> Arc<Grid> {
        Arc::clone(&self.shared.lock_state().grid)
    }

    pub fn generation(&self) -> u64 {
        self.shared.lock_state().generation
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock_state().running
    }

    pub fn start(&self) {
        let mut state = self.shared.lock_state();
        if state.running {
            return;
        }
        state.running = true;
        state.run += 1;
        let run = state.run;

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("life-generations".into())
            .spawn(move || run_generations(&shared, run));
        match spawned {
            Ok(handle) => {
                log::info!("simulation started at generation {}", state.generation);
                // A worker from an earlier run exits on its own once it sees the new run id.
                state.worker = Some(handle);
            }
            Err(err) => {
                log::error!("failed to spawn generation worker: {err}");
                state.running = false;
            }
        }
    }

    pub fn stop(&self) {
        let mut state = self.shared.lock_state();
        if !state.running {
            return;
        }
        state.running = false;
        log::info!("simulation stopped at generation {}", state.generation);
        drop(state);
        self.shared.wake.notify_all();
    }

    pub fn toggle_running(&self) {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Apply exactly one generation now, whether or not the simulation is running.
    pub fn step(&self) {
        let mut state = self.shared.lock_state();
        advance(&mut state);
    }

    pub fn randomize_grid(&self) {
        let config = &self.shared.config;
        let grid = {
            let mut rng = self.shared.rng.lock().unwrap_or_else(PoisonError::into_inner);
            Grid::random(config.rows, config.columns, config.alive_probability, &mut **rng)
        };
        log::info!("randomized board, population {}", grid.population());
        self.shared.lock_state().replace(grid, 0);
    }

    pub fn reset_grid(&self) {
        let config = &self.shared.config;
        log::info!("reset board");
        self.shared
            .lock_state()
            .replace(Grid::empty(config.rows, config.columns), 0);
    }

    /// Replace the board with `pattern` centred on an otherwise empty grid.
    pub fn load_pattern(&self, pattern: &Pattern) -> Result<()> {
        let config = &self.shared.config;
        let origin = pattern.centered_origin(config.rows, config.columns);
        // A pattern larger than the board is reported from its first cell that falls off.
        let grid = Grid::with_pattern(config.rows, config.columns, pattern, origin.unwrap_or((0, 0)))?;
        log::info!("loaded pattern {}", pattern.name);
        self.shared.lock_state().replace(grid, 0);
        Ok(())
    }

    pub fn edit_cell(&self, row: usize, col: usize, cell: CellState) -> Result<()> {
        let mut state = self.shared.lock_state();
        let grid = state.grid.set_cell(row, col, cell).inspect_err(|err| {
            log::warn!("rejected edit: {err}");
        })?;
        let generation = state.generation;
        state.replace(grid, generation);
        Ok(())
    }

    /// Flip one cell, as a click on the board does.
    pub fn toggle_cell(&self, row: usize, col: usize) -> Result<CellState> {
        let mut state = self.shared.lock_state();
        let cell = state.grid.get(row, col)?.toggled();
        let grid = state.grid.set_cell(row, col, cell)?;
        let generation = state.generation;
        state.replace(grid, generation);
        Ok(cell)
    }

    /// Call `observer` with every snapshot published from now on.
    ///
    /// Observers run while the simulation's lock is held, on whichever thread
    /// replaced the board. Calling back into this `Simulation` from an observer,
    /// even `grid()`, deadlocks; everything an observer needs is in the
    /// [`Snapshot`]. An observer that panics is unsubscribed.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&Snapshot) + Send + 'static,
    {
        let mut state = self.shared.lock_state();
        let id = SubscriptionId(state.next_subscription);
        state.next_subscription += 1;
        state.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.shared.lock_state();
        let before = state.observers.len();
        state.observers.retain(|(subscribed, _)| *subscribed != id);
        state.observers.len() != before
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.stop();
        let worker = self.shared.lock_state().worker.take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                log::error!("generation worker panicked");
            }
        }
    }
}

fn advance(state: &mut State) {
    let next = state.grid.step();
    let generation = state.generation + 1;
    log::debug!("generation {generation}, population {}", next.population());
    state.replace(next, generation);
}

/// Generate, publish, wait, recheck: until `run` is stopped or superseded.
fn run_generations(shared: &Shared, run: u64) {
    let mut state = shared.lock_state();
    while state.is_current(run) {
        advance(&mut state);
        let (guard, _) = shared
            .wake
            .wait_timeout_while(state, shared.config.generation_interval, |state| {
                state.is_current(run)
            })
            .unwrap_or_else(PoisonError::into_inner);
        state = guard;
    }
    log::debug!("generation worker for run {run} finished");
}
