//! Health monitoring: derived provider states, the result ring, and the
//! background sweeper that probes enabled providers on a timer.

pub mod monitor;
pub mod sweeper;
