//! Splash screen dismissal
//!
//! The installer ships a separate splash executable that stays up until the
//! dashboard is ready. Once the app list has been published we look it up by
//! executable name and terminate it.

use sysinfo::System;
use tracing::{info, warn};

/// Kill every process named `name`; returns how many were terminated
pub fn dismiss_splash(name: &str) -> usize {
    let name = name.trim();
    if name.is_empty() {
        return 0;
    }

    let system = System::new_all();
    let mut killed = 0;
    for process in system.processes_by_exact_name(name) {
        if process.kill() {
            killed += 1;
        } else {
            warn!("Could not terminate splash process {} ({})", name, process.pid());
        }
    }

    if killed == 0 {
        info!("No splash process named {} found", name);
    } else {
        info!("Dismissed {} splash process(es)", killed);
    }
    killed
}
