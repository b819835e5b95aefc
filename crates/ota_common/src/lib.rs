//! Shared types for the device update agent
//!
//! Directive model, version reconciliation and configuration. Nothing in
//! this crate talks to the network or runs external programs.

pub mod config;
pub mod directive;
pub mod paths;
pub mod plan;
pub mod version;

pub use config::{AgentConfig, BatchConfig, DeviceConfig, OtaConfig, PathsConfig, ServerConfig, ToolsConfig};
pub use directive::{parse_directives, ActionKind, UpdateDirective};
pub use plan::{plan_ota, plan_package, PackageState, Plan, SkipReason};
pub use version::{
    compare_versions, is_server_higher, needs_downgrade, needs_upgrade, normalize_build_stamp,
    parse_build_stamp, BuildStampError,
};
