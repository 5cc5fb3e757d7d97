//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the sync engine and an external
//! system (time, ids, filesystem, LLM, source control, issue tracker).
//! Implementations live in `src/adapters/`.

pub mod clock;
pub mod filesystem;
pub mod id_gen;
pub mod llm;
pub mod scm;
pub mod tracker;

use std::error::Error;
use std::future::Future;
use std::pin::Pin;

pub use clock::Clock;
pub use filesystem::FileSystem;
pub use id_gen::IdGenerator;
pub use llm::{CompletionFuture, CompletionRequest, CompletionResponse, LlmClient};
pub use scm::{CommitDetail, ScmIssue, ScmProject, SourceControl};
pub use tracker::{IssueTracker, IssueUpdate, NamedRef, NewIssue, TrackerIssue, TrackerProject};

/// Error type returned by every port.
pub type PortError = Box<dyn Error + Send + Sync>;

/// Boxed future returned by async ports, keeping the traits dyn-compatible.
pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PortError>> + Send + 'a>>;
