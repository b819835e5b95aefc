//! Device-side update agent
//!
//! Requests pending update directives from the update server and reconciles
//! each one against local package and firmware state: install, upgrade,
//! uninstall, downgrade, fota, cota.

pub mod batch;
pub mod client;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod exec;
pub mod fetcher;
pub mod inventory;
pub mod pipeline;
pub mod props;
pub mod verifier;

pub use batch::{run_batch, BatchReport, DirectiveReport, FailurePolicy};
pub use client::UpdateClient;
pub use device::{DeviceProbe, DeviceReport};
pub use dispatcher::{Dispatcher, Outcome, Planner};
pub use error::{OtaError, Result};
pub use exec::{CommandResult, CommandRunner, ExecutionStatus, SystemRunner};
pub use fetcher::{ArtifactFetcher, ArtifactKind, FetchedArtifact, HttpFetcher};
pub use pipeline::Applied;
