pub mod fleet;
pub mod milp;
pub mod types;

pub use fleet::*;
pub use milp::*;
pub use types::*;
