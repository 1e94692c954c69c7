//! gradecast-cli: the `gradecast train` and `gradecast serve` commands.
//!
//! Everything the binary does is reachable from here so that integration
//! tests can drive training and the HTTP router without spawning processes.
pub mod serve;
pub mod train;
pub mod util;
