//! Reconciliation decisions
//!
//! Turns (action, local state, server target) into the work the dispatcher
//! must carry out. No I/O happens here; callers gather local state first.

use crate::directive::ActionKind;
use crate::version::{compare_versions, needs_downgrade, needs_upgrade};
use serde::Serialize;
use std::fmt;

/// What the device currently has for a package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageState {
    NotInstalled,
    Installed { version_code: i64 },
}

/// Why a recognised directive resolved to no work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Installed version is equal to or newer than the server's
    UpToDate,
    /// Downgrade requested but the server's version is newer than installed
    ServerNewer,
    /// Local firmware stamp is equal to or newer than the server's
    FirmwareCurrent,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpToDate => "installed version is current",
            Self::ServerNewer => "server version is newer than installed",
            Self::FirmwareCurrent => "firmware is current",
        }
    }
}

/// Work required for one directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum Plan {
    /// Deliberately empty branch (`upgrade`) or an unrecognised action
    NoOp,
    /// Reconciliation found nothing to do
    Skip { reason: SkipReason },
    /// Download, verify and apply the artifact
    FetchAndApply,
    /// Remove the installed package, then download, verify and apply
    RemoveThenFetchAndApply,
    /// Remove the package only
    Remove,
}

impl Plan {
    /// Whether the plan downloads anything
    pub fn fetches(&self) -> bool {
        matches!(self, Self::FetchAndApply | Self::RemoveThenFetchAndApply)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOp => f.write_str("no-op"),
            Self::Skip { reason } => write!(f, "skip ({})", reason.as_str()),
            Self::FetchAndApply => f.write_str("fetch and apply"),
            Self::RemoveThenFetchAndApply => f.write_str("remove, then fetch and apply"),
            Self::Remove => f.write_str("remove"),
        }
    }
}

/// Decide a package action
pub fn plan_package(action: ActionKind, state: PackageState, server_version: i64) -> Plan {
    match action {
        ActionKind::Install => match state {
            PackageState::NotInstalled => Plan::FetchAndApply,
            PackageState::Installed { version_code } => {
                if needs_upgrade(compare_versions(server_version, version_code)) {
                    Plan::FetchAndApply
                } else {
                    Plan::Skip {
                        reason: SkipReason::UpToDate,
                    }
                }
            }
        },
        ActionKind::Downgrade => match state {
            PackageState::NotInstalled => Plan::FetchAndApply,
            PackageState::Installed { version_code } => {
                if needs_downgrade(compare_versions(server_version, version_code)) {
                    Plan::RemoveThenFetchAndApply
                } else {
                    Plan::Skip {
                        reason: SkipReason::ServerNewer,
                    }
                }
            }
        },
        ActionKind::Uninstall => Plan::Remove,
        ActionKind::Upgrade | ActionKind::Unknown | ActionKind::Fota | ActionKind::Cota => {
            Plan::NoOp
        }
    }
}

/// Decide an OTA action from parsed build stamps
pub fn plan_ota(server_stamp: u64, local_stamp: u64) -> Plan {
    if needs_upgrade(compare_versions(server_stamp, local_stamp)) {
        Plan::FetchAndApply
    } else {
        Plan::Skip {
            reason: SkipReason::FirmwareCurrent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn installed(v: i64) -> PackageState {
        PackageState::Installed { version_code: v }
    }

    #[test]
    fn test_install_not_installed_always_fetches() {
        assert_eq!(
            plan_package(ActionKind::Install, PackageState::NotInstalled, 1),
            Plan::FetchAndApply
        );
    }

    #[test]
    fn test_install_only_when_server_is_newer() {
        assert_eq!(plan_package(ActionKind::Install, installed(4), 5), Plan::FetchAndApply);
        assert_eq!(
            plan_package(ActionKind::Install, installed(5), 5),
            Plan::Skip { reason: SkipReason::UpToDate }
        );
        assert_eq!(
            plan_package(ActionKind::Install, installed(6), 5),
            Plan::Skip { reason: SkipReason::UpToDate }
        );
    }

    #[test]
    fn test_downgrade_removes_when_server_older_or_equal() {
        assert_eq!(
            plan_package(ActionKind::Downgrade, installed(5), 3),
            Plan::RemoveThenFetchAndApply
        );
        assert_eq!(
            plan_package(ActionKind::Downgrade, installed(3), 3),
            Plan::RemoveThenFetchAndApply
        );
    }

    #[test]
    fn test_downgrade_skips_disguised_upgrade() {
        assert_eq!(
            plan_package(ActionKind::Downgrade, installed(2), 3),
            Plan::Skip { reason: SkipReason::ServerNewer }
        );
    }

    #[test]
    fn test_downgrade_not_installed_fetches() {
        assert_eq!(
            plan_package(ActionKind::Downgrade, PackageState::NotInstalled, 3),
            Plan::FetchAndApply
        );
    }

    #[test]
    fn test_uninstall_is_unconditional() {
        assert_eq!(plan_package(ActionKind::Uninstall, PackageState::NotInstalled, 0), Plan::Remove);
        assert_eq!(plan_package(ActionKind::Uninstall, installed(9), 1), Plan::Remove);
    }

    #[test]
    fn test_upgrade_is_noop() {
        assert_eq!(plan_package(ActionKind::Upgrade, installed(1), 99), Plan::NoOp);
        assert!(!Plan::NoOp.fetches());
    }

    #[test]
    fn test_plan_ota() {
        assert_eq!(plan_ota(20240301, 20240115), Plan::FetchAndApply);
        assert_eq!(
            plan_ota(20240301, 20240301),
            Plan::Skip { reason: SkipReason::FirmwareCurrent }
        );
        assert_eq!(
            plan_ota(20240101, 20240301),
            Plan::Skip { reason: SkipReason::FirmwareCurrent }
        );
    }
}
