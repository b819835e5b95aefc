//! Update directive dispatcher
//!
//! One call per directive. Each action kind is a single pass:
//!
//! | action    | local state consulted          | work                                   |
//! |-----------|--------------------------------|----------------------------------------|
//! | install   | presence, versionCode          | fetch+apply if absent or server newer  |
//! | upgrade   | none                           | none (deliberate no-op)                |
//! | uninstall | none                           | remove                                 |
//! | downgrade | presence, versionCode          | remove then fetch+apply if server <= local, fetch+apply if absent |
//! | fota/cota | OTA version property           | fetch+apply (recovery) if server newer |
//!
//! Unknown actions are ignored.

use crate::error::{OtaError, Result};
use crate::exec::CommandRunner;
use crate::fetcher::{ArtifactFetcher, ArtifactKind};
use crate::inventory::PackageInventory;
use crate::pipeline::{Applied, ApplyPipeline};
use crate::props::PropertyReader;
use ota_common::{
    parse_build_stamp, plan_ota, plan_package, ActionKind, AgentConfig, Plan, SkipReason,
    UpdateDirective,
};
use tracing::{debug, info, warn};

/// Result of processing one directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Recognised no-op or unknown action
    NoOp,
    /// Versions already reconciled
    Skipped(SkipReason),
    /// Package removed
    Removed { package: String },
    /// Artifact fetched, verified and applied
    Applied(Applied),
    /// Installed package removed, then artifact fetched, verified and applied
    Replaced(Applied),
}

impl Outcome {
    pub fn describe(&self) -> String {
        match self {
            Outcome::NoOp => "no-op".to_string(),
            Outcome::Skipped(reason) => format!("skipped: {}", reason.as_str()),
            Outcome::Removed { package } => format!("removed {}", package),
            Outcome::Applied(applied) => describe_applied(applied),
            Outcome::Replaced(applied) => format!("replaced, {}", describe_applied(applied)),
        }
    }
}

fn describe_applied(applied: &Applied) -> String {
    match applied {
        Applied::PackageInstalled { package, .. } => format!("installed {}", package),
        Applied::RecoveryScheduled { artifact } => {
            format!("recovery scheduled with {}", artifact.display())
        }
    }
}

/// Reconciliation against local state; reads the device, never changes it
pub struct Planner<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a AgentConfig,
}

impl<'a> Planner<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a AgentConfig) -> Self {
        Self { runner, config }
    }

    /// Work required for `directive`
    pub fn plan(&self, directive: &UpdateDirective) -> Result<Plan> {
        match directive.action {
            ActionKind::Install | ActionKind::Downgrade => {
                let state = self.inventory().state(&directive.package_name)?;
                Ok(plan_package(directive.action, state, directive.version_code))
            }
            ActionKind::Uninstall => Ok(Plan::Remove),
            ActionKind::Fota | ActionKind::Cota => {
                let local = self.local_ota_stamp(directive.action)?;
                let server = parse_build_stamp(&directive.build_date).map_err(|e| {
                    OtaError::VersionParse {
                        source_name: "directive buildDate".to_string(),
                        raw: e.raw,
                    }
                })?;
                debug!("{} local {} server {}", directive.action, local, server);
                Ok(plan_ota(server, local))
            }
            ActionKind::Upgrade => Ok(Plan::NoOp),
            ActionKind::Unknown => {
                warn!("Ignoring directive with unknown action");
                Ok(Plan::NoOp)
            }
        }
    }

    fn local_ota_stamp(&self, action: ActionKind) -> Result<u64> {
        let keys = match action {
            ActionKind::Cota => &self.config.ota.cota_keys,
            _ => &self.config.ota.fota_keys,
        };
        let raw = PropertyReader::new(self.runner, &self.config.tools.getprop).first_of(keys)?;
        parse_build_stamp(&raw).map_err(|e| OtaError::VersionParse {
            source_name: keys.join("|"),
            raw: e.raw,
        })
    }

    fn inventory(&self) -> PackageInventory<'_> {
        PackageInventory::new(self.runner, &self.config.tools)
    }
}

pub struct Dispatcher<'a> {
    planner: Planner<'a>,
    runner: &'a dyn CommandRunner,
    fetcher: &'a dyn ArtifactFetcher,
    config: &'a AgentConfig,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        fetcher: &'a dyn ArtifactFetcher,
        config: &'a AgentConfig,
    ) -> Self {
        Self {
            planner: Planner::new(runner, config),
            runner,
            fetcher,
            config,
        }
    }

    /// Plan and execute one directive
    pub fn process(&self, directive: &UpdateDirective) -> Result<Outcome> {
        self.note_forced(directive);
        let plan = self.plan(directive)?;
        debug!("{}: {}", directive.label(), plan);
        self.execute(directive, plan)
    }

    /// See [`Planner::plan`]
    pub fn plan(&self, directive: &UpdateDirective) -> Result<Plan> {
        self.planner.plan(directive)
    }

    /// Carry out a plan produced by [`plan`](Self::plan)
    pub fn execute(&self, directive: &UpdateDirective, plan: Plan) -> Result<Outcome> {
        match plan {
            Plan::NoOp => Ok(Outcome::NoOp),
            Plan::Skip { reason } => {
                info!("{}: nothing to do, {}", directive.label(), reason.as_str());
                Ok(Outcome::Skipped(reason))
            }
            Plan::Remove => {
                self.inventory().uninstall(&directive.package_name)?;
                Ok(Outcome::Removed {
                    package: directive.package_name.clone(),
                })
            }
            Plan::FetchAndApply => {
                let applied = self.apply(directive)?;
                Ok(Outcome::Applied(applied))
            }
            Plan::RemoveThenFetchAndApply => {
                self.inventory().uninstall(&directive.package_name)?;
                let applied = self.apply(directive)?;
                Ok(Outcome::Replaced(applied))
            }
        }
    }

    /// `isForced` is carried by the server payload but has no effect yet
    fn note_forced(&self, directive: &UpdateDirective) {
        if directive.is_forced {
            debug!("{}: isForced set, not consulted", directive.label());
        }
    }

    fn apply(&self, directive: &UpdateDirective) -> Result<Applied> {
        ApplyPipeline::new(self.runner, self.fetcher, self.config)
            .run(directive, expected_artifact_kind(directive.action))
    }

    fn inventory(&self) -> PackageInventory<'_> {
        PackageInventory::new(self.runner, &self.config.tools)
    }
}

/// Artifact kind an action is able to apply
pub fn expected_artifact_kind(action: ActionKind) -> ArtifactKind {
    if action.is_ota_action() {
        ArtifactKind::Firmware
    } else {
        ArtifactKind::Package
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_artifact_kind_by_action() {
        assert_eq!(expected_artifact_kind(ActionKind::Fota), ArtifactKind::Firmware);
        assert_eq!(expected_artifact_kind(ActionKind::Cota), ArtifactKind::Firmware);
        assert_eq!(expected_artifact_kind(ActionKind::Install), ArtifactKind::Package);
        assert_eq!(expected_artifact_kind(ActionKind::Downgrade), ArtifactKind::Package);
    }

    #[test]
    fn test_outcome_describe() {
        assert_eq!(Outcome::NoOp.describe(), "no-op");
        assert_eq!(
            Outcome::Removed { package: "a.b".to_string() }.describe(),
            "removed a.b"
        );
    }
}
