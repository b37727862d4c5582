//! Rocketfile loading
//!
//! A rocketfile declares targets and missions in YAML:
//!
//! ```yaml
//! targets:
//!   production:
//!     - host: web1.example.com
//!       username: deploy
//!     - host: web2.example.com
//!       port: 2222
//! missions:
//!   default:
//!     - local: git push origin main
//!     - with: cd /srv/app
//!       steps:
//!         - remote: git pull
//!         - remote: make restart
//! ```

use anyhow::{Context, Result};
use liftoff_orchestrator::{ConnectionProvider, MissionContext, Mission, Orchestrator};
use liftoff_types::HostConfig;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Default rocketfile name, resolved against the working directory
pub const DEFAULT_ROCKETFILE: &str = "rocketfile.yml";

/// One step of a scripted mission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Step {
    Remote {
        remote: String,
    },
    Local {
        local: String,
    },
    /// Steps run with `with` prefixed to every command
    Scope {
        with: String,
        steps: Vec<Step>,
    },
}

/// Every key a step may carry; exactly one shape must be filled in
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStep {
    remote: Option<String>,
    local: Option<String>,
    with: Option<String>,
    steps: Option<Vec<Step>>,
}

impl TryFrom<RawStep> for Step {
    type Error = String;

    fn try_from(raw: RawStep) -> Result<Self, Self::Error> {
        match (raw.remote, raw.local, raw.with, raw.steps) {
            (Some(remote), None, None, None) => Ok(Step::Remote { remote }),
            (None, Some(local), None, None) => Ok(Step::Local { local }),
            (None, None, Some(with), Some(steps)) => Ok(Step::Scope { with, steps }),
            (None, None, Some(with), None) => Err(format!("scope '{with}' has no steps")),
            (None, None, None, Some(_)) => Err("steps given without a `with` prefix".to_string()),
            (None, None, None, None) => {
                Err("a step needs one of `remote`, `local` or `with`".to_string())
            }
            _ => Err("a step must be exactly one of `remote`, `local` or `with`".to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawStep::deserialize(deserializer)?;
        Step::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Parsed rocketfile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rocketfile {
    #[serde(default)]
    pub targets: BTreeMap<String, Vec<HostConfig>>,
    #[serde(default)]
    pub missions: BTreeMap<String, Vec<Step>>,
}

impl Rocketfile {
    /// Read and parse the rocketfile at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rocketfile: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse rocketfile: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let rocketfile: Self = serde_yaml::from_str(contents)?;
        Ok(rocketfile)
    }

    /// Register every target and mission on `orchestrator`
    pub fn install<P>(self, orchestrator: &mut Orchestrator<P>) -> Result<()>
    where
        P: ConnectionProvider<Config = HostConfig>,
    {
        let (targets, missions) = (self.targets.len(), self.missions.len());

        for (name, hosts) in self.targets {
            orchestrator
                .register_target(name.clone(), hosts)
                .with_context(|| format!("Invalid target '{name}'"))?;
        }
        for (name, steps) in self.missions {
            orchestrator
                .register_mission(name.clone(), ScriptedMission::new(steps))
                .with_context(|| format!("Invalid mission '{name}'"))?;
        }

        info!(targets, missions, "Installed rocketfile");
        Ok(())
    }
}

/// A mission whose body replays a list of steps
#[derive(Debug, Clone)]
pub struct ScriptedMission {
    steps: Vec<Step>,
}

impl ScriptedMission {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

#[async_trait::async_trait]
impl Mission for ScriptedMission {
    async fn run(&self, ctx: &mut MissionContext) -> Result<()> {
        apply(&self.steps, ctx);
        Ok(())
    }
}

fn apply(steps: &[Step], ctx: &mut MissionContext) {
    for step in steps {
        match step {
            Step::Remote { remote } => ctx.remote(remote),
            Step::Local { local } => ctx.local(local),
            Step::Scope { with, steps } => ctx.with_scope(with.as_str(), |ctx| apply(steps, ctx)),
        }
    }
}
