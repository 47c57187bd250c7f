//! The upload engine
//!
//! Three cooperating pieces, all driven through the [`RemoteStore`] seam:
//!
//! - `resumable`: the per-file chunked transfer state machine, including
//!   transient-server retries and credential rotation on quota errors
//! - `mirror`: the depth-first directory walk that recreates the local tree
//!   as remote folders
//! - `engine`: the orchestrator that dispatches file vs. directory uploads,
//!   runs the progress ticker, and normalizes terminal outcomes
//!
//! [`RemoteStore`]: crate::store::RemoteStore

mod engine;
mod mirror;
mod resumable;
mod session;

pub use engine::{ProgressFn, UploadKind, UploadOutcome, UploadReport, Uploader, UploaderOptions};
pub use mirror::{MirrorOutcome, MirrorStats};
pub use session::TransferSession;

#[cfg(test)]
pub(crate) mod testing;
