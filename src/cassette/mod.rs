//! Cassettes: YAML files of recorded port interactions.
//!
//! Recording adapters append to a [`recorder::CassetteRecorder`]; replaying
//! adapters pull from a [`replayer::CassetteReplayer`]. A cassette recorded
//! against live GitLab, Redmine, and LLM endpoints can be replayed offline
//! with `tracksync process --replay <dir>`.

pub mod format;
pub mod recorder;
pub mod replayer;
pub mod session;
