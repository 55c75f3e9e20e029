use crate::error::{Result, WorkshopError};

/// Runtime configuration for the workshop core.
#[derive(Debug, Clone)]
pub struct WorkshopConfig {
    /// Maintenance interval applied to machines created without an explicit gap.
    /// A new machine arrives freshly serviced, so its window starts at creation.
    pub default_maintenance_gap_days: u32,
    /// How many lost machine-claim races the assignment engine absorbs before
    /// reporting no machine available.
    pub machine_claim_retries: u32,
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            default_maintenance_gap_days: 10,
            machine_claim_retries: 1,
        }
    }
}

impl WorkshopConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(gap) = std::env::var("WORKSHOP_DEFAULT_MAINTENANCE_GAP_DAYS") {
            config.default_maintenance_gap_days = gap.parse().map_err(|e| {
                WorkshopError::Configuration(format!("Invalid default_maintenance_gap_days: {e}"))
            })?;
        }

        if let Ok(retries) = std::env::var("WORKSHOP_MACHINE_CLAIM_RETRIES") {
            config.machine_claim_retries = retries.parse().map_err(|e| {
                WorkshopError::Configuration(format!("Invalid machine_claim_retries: {e}"))
            })?;
        }

        Ok(config)
    }
}
