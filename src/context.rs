//! Service context bundling all port trait objects.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::adapters::live::clock::LiveClock;
use crate::adapters::live::filesystem::LiveFileSystem;
use crate::adapters::live::gitlab::GitlabClient;
use crate::adapters::live::id_gen::LiveIdGenerator;
use crate::adapters::live::llm::LiveLlmClient;
use crate::adapters::live::redmine::RedmineClient;
use crate::adapters::recording::{
    RecordingClock, RecordingIdGenerator, RecordingIssueTracker, RecordingLlmClient,
    RecordingSourceControl,
};
use crate::adapters::replaying::{
    ReplayingClock, ReplayingIdGenerator, ReplayingIssueTracker, ReplayingLlmClient,
    ReplayingSourceControl, SharedReplayer,
};
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::config::Settings;
use crate::ports::{Clock, FileSystem, IdGenerator, IssueTracker, LlmClient, SourceControl};

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors
/// wire up different adapter implementations (live, recording, replaying).
pub struct ServiceContext {
    /// Clock for audit timestamps and issue start dates.
    pub clock: Box<dyn Clock>,
    /// Filesystem holding the ledger.
    pub fs: Box<dyn FileSystem>,
    /// ID generator for run identifiers.
    pub id_gen: Box<dyn IdGenerator>,
    /// LLM client for classification.
    pub llm: Box<dyn LlmClient>,
    /// Source-control host (GitLab).
    pub scm: Box<dyn SourceControl>,
    /// Issue tracker (Redmine).
    pub tracker: Box<dyn IssueTracker>,
}

impl ServiceContext {
    /// Creates a live context talking to the configured services.
    #[must_use]
    pub fn live(settings: &Settings) -> Self {
        Self {
            clock: Box::new(LiveClock),
            fs: Box::new(LiveFileSystem),
            id_gen: Box::new(LiveIdGenerator),
            llm: Box::new(LiveLlmClient::new(&settings.llm)),
            scm: Box::new(GitlabClient::new(&settings.gitlab)),
            tracker: Box::new(RedmineClient::new(&settings.redmine)),
        }
    }

    /// Creates a live context whose port traffic is recorded into `session`.
    ///
    /// The filesystem stays unrecorded. Drop the context before calling
    /// [`RecordingSession::finish`].
    #[must_use]
    pub fn recording(settings: &Settings, session: &RecordingSession) -> Self {
        let live = Self::live(settings);
        Self {
            clock: Box::new(RecordingClock::new(live.clock, Arc::clone(&session.clock))),
            fs: live.fs,
            id_gen: Box::new(RecordingIdGenerator::new(live.id_gen, Arc::clone(&session.id_gen))),
            llm: Box::new(RecordingLlmClient::new(live.llm, Arc::clone(&session.llm))),
            scm: Box::new(RecordingSourceControl::new(live.scm, Arc::clone(&session.scm))),
            tracker: Box::new(RecordingIssueTracker::new(
                live.tracker,
                Arc::clone(&session.tracker),
            )),
        }
    }

    /// Creates a replaying context from a cassette file or a directory of
    /// per-port cassettes.
    ///
    /// All recorded ports are served by one replayer; the filesystem is
    /// live so ledger state lands wherever the caller points it.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let cassette = Cassette::load(path)?;
        let replayer: SharedReplayer = Arc::new(Mutex::new(CassetteReplayer::new(&cassette)));
        Ok(Self {
            clock: Box::new(ReplayingClock::new(Arc::clone(&replayer))),
            fs: Box::new(LiveFileSystem),
            id_gen: Box::new(ReplayingIdGenerator::new(Arc::clone(&replayer))),
            llm: Box::new(ReplayingLlmClient::new(Arc::clone(&replayer))),
            scm: Box::new(ReplayingSourceControl::new(Arc::clone(&replayer))),
            tracker: Box::new(ReplayingIssueTracker::new(replayer)),
        })
    }
}
