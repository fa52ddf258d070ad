use anyhow::{Error, Result};
use log::{error, warn};

/// Validate and normalize a requested CPU count.
pub fn determine_allowed_cpus(desired: usize) -> Result<usize> {
    if desired == 0 {
        error!("Must select > 0 threads");
        Err(Error::msg("Too few threads selected. Min 1"))
    } else if desired > num_cpus::get() {
        let available = num_cpus::get();
        warn!(
            "Specified {} threads but only {} are available, using {}",
            desired, available, available
        );
        Ok(available)
    } else {
        Ok(desired)
    }
}
