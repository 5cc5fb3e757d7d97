//! Recording session managing per-port cassette recorders.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::format::CASSETTE_SUFFIX;
use super::recorder::CassetteRecorder;

/// Port names written by a recording session, one cassette file each.
pub const RECORDED_PORTS: [&str; 5] = ["llm", "scm", "tracker", "clock", "id_gen"];

/// Shared handle to one port's recorder.
pub type SharedRecorder = Arc<Mutex<CassetteRecorder>>;

/// Manages per-port `CassetteRecorder` instances for a recording session.
///
/// All cassettes are stored in a timestamped directory below the base
/// directory. The filesystem port is not recorded: ledger files are state,
/// not upstream traffic.
pub struct RecordingSession {
    /// Recorder for LLM interactions.
    pub llm: SharedRecorder,
    /// Recorder for source-control interactions.
    pub scm: SharedRecorder,
    /// Recorder for issue tracker interactions.
    pub tracker: SharedRecorder,
    /// Recorder for clock interactions.
    pub clock: SharedRecorder,
    /// Recorder for ID generator interactions.
    pub id_gen: SharedRecorder,
    output_dir: PathBuf,
}

impl RecordingSession {
    /// Create a new recording session in `<base>/<timestamp>/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory already exists or cannot be created.
    pub fn new(base: &Path) -> Result<Self, String> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let output_dir = base.join(&timestamp);

        if output_dir.exists() {
            return Err(format!("Cassette directory already exists: {}", output_dir.display()));
        }
        std::fs::create_dir_all(&output_dir)
            .map_err(|e| format!("Failed to create cassette directory: {e}"))?;

        let make_recorder = |port: &str| -> SharedRecorder {
            let path = output_dir.join(format!("{port}{CASSETTE_SUFFIX}"));
            Arc::new(Mutex::new(CassetteRecorder::new(path, format!("{timestamp}-{port}"))))
        };

        Ok(Self {
            llm: make_recorder("llm"),
            scm: make_recorder("scm"),
            tracker: make_recorder("tracker"),
            clock: make_recorder("clock"),
            id_gen: make_recorder("id_gen"),
            output_dir,
        })
    }

    /// Directory the cassettes are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Finish all recorders and write cassette files to disk.
    ///
    /// Every recording adapter must have been dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if an adapter still holds a recorder or a cassette
    /// file cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorders = [self.llm, self.scm, self.tracker, self.clock, self.id_gen];
        for (recorder, port) in recorders.into_iter().zip(RECORDED_PORTS) {
            let recorder = Arc::try_unwrap(recorder)
                .map_err(|_| format!("Recording adapter for {port} still has references"))?
                .into_inner()
                .map_err(|e| format!("Recorder lock for {port} poisoned: {e}"))?;
            recorder.finish().map_err(|e| format!("Failed to write {port} cassette: {e}"))?;
        }
        Ok(self.output_dir)
    }
}
