/**
* A live cell dies if it has fewer than two live neighbors.
* A live cell with two or three live neighbors lives on to the next generation.
* A live cell with more than three live neighbors dies.
* A dead cell will be brought back to live if it has exactly three live neighbors.
*
* The board is bounded: cells past the edges count as absent, never wrapped.
*/

pub mod config;
pub mod error;
pub mod grid;
pub mod patterns;
pub mod simulation;

pub use config::{AliveProbability, SimulationConfig};
pub use error::{GridError, Result};
pub use grid::{CellState, Grid};
pub use patterns::Pattern;
pub use simulation::{Simulation, Snapshot, SubscriptionId};
