pub mod change;
pub mod check;
pub mod snapshot;
