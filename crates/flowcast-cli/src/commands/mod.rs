pub mod energy;
pub mod schedule;
pub mod sleep;
pub mod task;
