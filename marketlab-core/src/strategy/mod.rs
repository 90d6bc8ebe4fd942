//! Strategy engine — signal evaluation and position-based trade simulation.

pub mod signal;
pub mod simulator;

pub use signal::{evaluate_signal, Signal};
pub use simulator::{simulate, simulate_prices, SimulationError};
