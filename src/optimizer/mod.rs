// Optimizer engine: assignment solver, path builder, candidate ranking,
// pool EV model.

pub mod assignment;
pub mod path;
pub mod pool;
pub mod ranking;
