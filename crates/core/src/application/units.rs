// Service & unit inspection
use tracing::info;

use super::constants::RESTART_FAILURE_MARKERS;
use super::RemoteSystemProbe;
use crate::domain::command;
use crate::domain::identifier::{self, ServiceName};
use crate::domain::unit::{self, ServiceUnit, UnitState};
use crate::error::Result;

impl RemoteSystemProbe {
    /// Names of failed service units, `None` when nothing has failed
    pub async fn list_failed_services(&self) -> Result<Option<Vec<String>>> {
        let output = self.run(&command::list_units(Some(&UnitState::Failed))).await?;
        let failed = unit::parse_failed_services(&output);

        info!(failed = failed.len(), "Failed services checked");
        Ok(unit::non_empty(failed))
    }

    /// Every unit name systemd knows about, `None` when the listing is empty
    pub async fn list_all_units(&self) -> Result<Option<Vec<String>>> {
        Ok(self.list_units(None).await?.map(into_names))
    }

    /// Names of units in `loaded` state, `None` when the listing is empty
    pub async fn list_loaded_units(&self) -> Result<Option<Vec<String>>> {
        Ok(self.list_units(Some(&UnitState::Loaded)).await?.map(into_names))
    }

    /// Unit rows of `systemctl list-units --all`, optionally filtered by state
    pub async fn list_units(&self, state: Option<&UnitState>) -> Result<Option<Vec<ServiceUnit>>> {
        let output = self.run(&command::list_units(state)).await?;
        let units = unit::parse_unit_table(&output);

        info!(
            state = state.map(UnitState::as_str).unwrap_or("any"),
            units = units.len(),
            "Units listed"
        );
        Ok(unit::non_empty(units))
    }

    /// Restart each service in order
    ///
    /// Stops at the first restart reporting `Failed`; services restarted
    /// before it stay restarted. Returns true once all of them went through.
    pub async fn reload_service_units<S: AsRef<str>>(&self, services: &[S]) -> Result<bool> {
        let services = identifier::parse_all("service", services, ServiceName::parse)?;

        for service in &services {
            self.run_expecting(&command::restart_unit(service), RESTART_FAILURE_MARKERS)
                .await?;
            info!(service = %service, "Service restarted");
        }
        Ok(true)
    }
}

fn into_names(units: Vec<ServiceUnit>) -> Vec<String> {
    units.into_iter().map(|u| u.name).collect()
}
