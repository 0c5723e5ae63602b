pub mod agent;
pub mod battery;
pub mod flex;
pub mod timeseries;

pub use agent::*;
pub use battery::*;
pub use flex::*;
pub use timeseries::*;
