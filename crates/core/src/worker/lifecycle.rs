//! Version lifecycle within one registration.
//!
//! A registration has three slots. A version moves
//! `installing -> installed (waiting) -> activating -> active`, and ends
//! `redundant` when its install fails or a newer version replaces it.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::WorkerScript;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Installing,
    Installed,
    Activating,
    Active,
    Redundant,
}

/// One deployed version and where it is in its lifecycle.
#[derive(Debug, Clone)]
pub struct WorkerVersion {
    pub script: Arc<WorkerScript>,
    pub state: WorkerState,
    /// Set once the version asked to skip the waiting phase.
    pub skip_waiting: bool,
}

impl WorkerVersion {
    fn new(script: Arc<WorkerScript>, state: WorkerState) -> Self {
        Self { script, state, skip_waiting: false }
    }

    fn retire(mut self) -> Self {
        self.state = WorkerState::Redundant;
        self
    }
}

/// Serializable view of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VersionStatus {
    pub cache_name: String,
    pub state: WorkerState,
    pub skip_waiting: bool,
}

impl From<&WorkerVersion> for VersionStatus {
    fn from(version: &WorkerVersion) -> Self {
        Self {
            cache_name: version.script.cache_name().to_string(),
            state: version.state,
            skip_waiting: version.skip_waiting,
        }
    }
}

/// Serializable view of the whole registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RegistrationStatus {
    pub installing: Option<VersionStatus>,
    pub waiting: Option<VersionStatus>,
    pub active: Option<VersionStatus>,
}

/// The installing, waiting and active slots of a scope.
#[derive(Debug, Default)]
pub struct Registration {
    installing: Option<WorkerVersion>,
    waiting: Option<WorkerVersion>,
    active: Option<WorkerVersion>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `script` in the installing slot.
    pub fn begin_install(&mut self, script: Arc<WorkerScript>) -> Result<(), Error> {
        if let Some(current) = &self.installing {
            return Err(Error::InvalidState(format!("{} is already installing", current.script.cache_name())));
        }
        self.installing = Some(WorkerVersion::new(script, WorkerState::Installing));
        Ok(())
    }

    /// Drop the installing version after a failed install.
    pub fn install_failed(&mut self) -> Option<WorkerVersion> {
        self.installing.take().map(WorkerVersion::retire)
    }

    /// Move the installing version to the waiting slot.
    ///
    /// Returns the version it replaced in that slot, now redundant.
    pub fn install_succeeded(&mut self) -> Option<WorkerVersion> {
        let mut installed = self.installing.take()?;
        installed.state = WorkerState::Installed;
        self.waiting.replace(installed).map(WorkerVersion::retire)
    }

    /// Flag the waiting version (or, before it gets there, the installing
    /// one) to activate without waiting. Returns false if neither exists.
    pub fn skip_waiting(&mut self) -> bool {
        match self.waiting.as_mut().or(self.installing.as_mut()) {
            Some(version) => {
                version.skip_waiting = true;
                true
            }
            None => false,
        }
    }

    /// A waiting version may activate now: it asked to skip waiting, or
    /// there is nothing active for it to wait on.
    pub fn ready_to_activate(&self) -> bool {
        self.waiting
            .as_ref()
            .is_some_and(|waiting| waiting.skip_waiting || self.active.is_none())
    }

    /// Promote the waiting version into the active slot as `activating`.
    ///
    /// Returns the promoted script and the version it displaced.
    pub fn begin_activate(&mut self) -> Option<(Arc<WorkerScript>, Option<WorkerVersion>)> {
        let mut next = self.waiting.take()?;
        next.state = WorkerState::Activating;
        let script = next.script.clone();
        let previous = self.active.replace(next).map(WorkerVersion::retire);
        Some((script, previous))
    }

    /// Mark the activating version active.
    pub fn finish_activate(&mut self) {
        if let Some(active) = self.active.as_mut()
            && active.state == WorkerState::Activating
        {
            active.state = WorkerState::Active;
        }
    }

    /// Install `script` straight into the active slot, for a version that
    /// was already activated by an earlier run.
    pub fn restore_active(&mut self, script: Arc<WorkerScript>) {
        self.active = Some(WorkerVersion::new(script, WorkerState::Active));
    }

    /// Script of the version controlling pages, if any.
    pub fn active_script(&self) -> Option<Arc<WorkerScript>> {
        self.active.as_ref().map(|v| v.script.clone())
    }

    pub fn status(&self) -> RegistrationStatus {
        RegistrationStatus {
            installing: self.installing.as_ref().map(VersionStatus::from),
            waiting: self.waiting.as_ref().map(VersionStatus::from),
            active: self.active.as_ref().map(VersionStatus::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::version::CacheName;

    fn script(tag: &str) -> Arc<WorkerScript> {
        let config = Arc::new(AppConfig { cache_version: tag.into(), date_suffix: Some(false), ..Default::default() });
        let today = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Arc::new(WorkerScript::from_config(config, today).unwrap())
    }

    #[test]
    fn test_first_install_activates_without_skip() {
        let mut reg = Registration::new();
        reg.begin_install(script("v1")).unwrap();
        assert_eq!(reg.status().installing.unwrap().state, WorkerState::Installing);

        assert!(reg.install_succeeded().is_none());
        assert_eq!(reg.status().waiting.unwrap().state, WorkerState::Installed);
        assert!(reg.ready_to_activate());

        let (promoted, previous) = reg.begin_activate().unwrap();
        assert_eq!(promoted.cache_name(), &CacheName::new("offline-app", "v1"));
        assert!(previous.is_none());
        assert_eq!(reg.status().active.as_ref().unwrap().state, WorkerState::Activating);

        reg.finish_activate();
        assert_eq!(reg.status().active.unwrap().state, WorkerState::Active);
    }

    #[test]
    fn test_second_version_waits_until_skip() {
        let mut reg = Registration::new();
        reg.restore_active(script("v1"));

        reg.begin_install(script("v2")).unwrap();
        reg.install_succeeded();
        assert!(!reg.ready_to_activate());

        assert!(reg.skip_waiting());
        assert!(reg.ready_to_activate());

        let (_, previous) = reg.begin_activate().unwrap();
        let previous = previous.unwrap();
        assert_eq!(previous.state, WorkerState::Redundant);
        assert_eq!(previous.script.cache_name().as_str(), "offline-app-v1");
    }

    #[test]
    fn test_failed_install_keeps_active() {
        let mut reg = Registration::new();
        reg.restore_active(script("v1"));
        reg.begin_install(script("v2")).unwrap();

        let failed = reg.install_failed().unwrap();
        assert_eq!(failed.state, WorkerState::Redundant);

        let status = reg.status();
        assert!(status.installing.is_none());
        assert!(status.waiting.is_none());
        assert_eq!(status.active.unwrap().cache_name, "offline-app-v1");
    }

    #[test]
    fn test_concurrent_install_rejected() {
        let mut reg = Registration::new();
        reg.begin_install(script("v1")).unwrap();
        assert!(matches!(reg.begin_install(script("v2")), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_skip_waiting_with_nothing_pending() {
        let mut reg = Registration::new();
        assert!(!reg.skip_waiting());
        assert!(reg.begin_activate().is_none());
    }
}
