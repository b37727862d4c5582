//! Mission and target registry

use crate::context::MissionContext;
use crate::error::{OrchestratorError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A runnable mission body.
///
/// The body's job is to queue commands on the context; the orchestrator
/// executes them after the body returns.
#[async_trait::async_trait]
pub trait Mission: Send + Sync {
    async fn run(&self, ctx: &mut MissionContext) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
impl<F> Mission for F
where
    F: Fn(&mut MissionContext) -> anyhow::Result<()> + Send + Sync,
{
    async fn run(&self, ctx: &mut MissionContext) -> anyhow::Result<()> {
        (self)(ctx)
    }
}

/// Type alias for a shared mission body
pub type SharedMission = Arc<dyn Mission>;

/// Pins a closure to the mission signature so its argument and return types
/// can be inferred at the call site.
pub fn mission_fn<F>(f: F) -> F
where
    F: Fn(&mut MissionContext) -> anyhow::Result<()> + Send + Sync,
{
    f
}

/// Named missions and targets
pub struct Registry<C> {
    missions: HashMap<String, SharedMission>,
    targets: HashMap<String, Vec<C>>,
}

impl<C: Clone> Registry<C> {
    pub fn new() -> Self {
        Self {
            missions: HashMap::new(),
            targets: HashMap::new(),
        }
    }

    /// Store `configs` under `name`, replacing any earlier registration
    pub fn register_target(&mut self, name: impl Into<String>, configs: Vec<C>) -> Result<()> {
        let name = validate_name(name.into(), "target")?;
        debug!(target_name = %name, hosts = configs.len(), "Registered target");
        self.targets.insert(name, configs);
        Ok(())
    }

    /// Store `mission` under `name`, replacing any earlier registration
    pub fn register_mission(&mut self, name: impl Into<String>, mission: SharedMission) -> Result<()> {
        let name = validate_name(name.into(), "mission")?;
        debug!(mission = %name, "Registered mission");
        self.missions.insert(name, mission);
        Ok(())
    }

    pub fn mission(&self, name: &str) -> Option<SharedMission> {
        self.missions.get(name).cloned()
    }

    pub fn target(&self, name: &str) -> Option<&[C]> {
        self.targets.get(name).map(Vec::as_slice)
    }

    /// Registered mission names, sorted
    pub fn mission_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.missions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered target names, sorted
    pub fn target_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Forget every mission and target
    pub fn clear(&mut self) {
        self.missions.clear();
        self.targets.clear();
    }
}

impl<C: Clone> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_name(name: String, kind: &'static str) -> Result<String> {
    if name.trim().is_empty() {
        return Err(OrchestratorError::InvalidName { kind });
    }
    Ok(name)
}
