//! High-level runtime engine settings
//!
//! Selects the gravity correction mode and whether pair evaluation is split
//! across worker threads. Both are fixed once a `Scenario` is initialized.

use crate::configuration::config::CorrectionMode;

#[derive(Debug, Clone)]
pub struct Engine {
    pub correction: CorrectionMode, // newtonian or post-newtonian
    pub parallel: bool, // false = single thread, true = rayon pair partitioning
}
