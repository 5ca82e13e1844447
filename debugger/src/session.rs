//! A client's view of one program run.
//!
//! A session runs a program eagerly, keeps the full trace, and hands the
//! snapshots out one at a time through a cursor.

use std::path::Path;

use mockasm_asm::{EngineConfig, EngineError, Execution, Program, Snapshot, SourceFile, Trace};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SessionError};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Created, nothing run yet.
    Ready,
    /// The last run completed and its trace can be stepped through.
    Completed,
    /// The last run failed.
    Failed,
}

#[derive(Debug, Clone)]
pub struct Session {
    /// Source of the last run, if it could be read.
    source: Option<SourceFile>,
    /// Program of the last successful run.
    program: Option<Program>,
    /// Complete trace when `Completed`, partial (possibly empty) when `Failed`.
    trace: Trace,
    cursor: usize,
    status: SessionStatus,
    failure: Option<EngineError>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            source: None,
            program: None,
            trace: Trace::default(),
            cursor: 0,
            status: SessionStatus::Ready,
            failure: None,
        }
    }

    /// Loads, assembles and executes the file at `path`, replacing whatever
    /// the session held before. On success the cursor is on the first
    /// snapshot.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn run(&mut self, path: impl AsRef<Path>, config: &EngineConfig) -> Result<&Snapshot> {
        self.source = None;
        let result = match SourceFile::load(path) {
            Ok(source) => {
                self.source = Some(source.clone());
                Execution::from_source(source, config)
            }
            Err(err) => Err(err.into()),
        };
        self.finish_run(result)
    }

    /// Same as [`Session::run`], for source text that is already in memory.
    pub fn run_source(&mut self, source: SourceFile, config: &EngineConfig) -> Result<&Snapshot> {
        self.source = Some(source.clone());
        let result = Execution::from_source(source, config);
        self.finish_run(result)
    }

    fn finish_run(
        &mut self,
        result: std::result::Result<Execution, EngineError>,
    ) -> Result<&Snapshot> {
        self.cursor = 0;
        match result {
            Ok(execution) => {
                let (program, trace) = execution.into_parts();
                info!(
                    steps = trace.len(),
                    output = ?trace.output(),
                    "run completed"
                );
                self.program = Some(program);
                self.trace = trace;
                self.status = SessionStatus::Completed;
                self.failure = None;
                self.current().ok_or(SessionError::NoMoreSteps)
            }
            Err(err) => {
                warn!(line_num = ?err.line_num(), %err, "run failed");
                self.program = None;
                self.trace = match &err {
                    EngineError::Execution(failure) => failure.partial_trace.clone(),
                    _ => Trace::default(),
                };
                self.status = SessionStatus::Failed;
                self.failure = Some(err.clone());
                Err(err.into())
            }
        }
    }

    /// Moves the cursor to the next snapshot and returns it.
    ///
    /// A failed session refuses every call with `SessionFailed`. On the last
    /// snapshot the cursor stays where it is and `NoMoreSteps` is returned.
    pub fn step_next(&mut self) -> Result<&Snapshot> {
        match self.status {
            SessionStatus::Failed => return Err(SessionError::SessionFailed),
            SessionStatus::Ready => return Err(SessionError::NoActiveRun),
            SessionStatus::Completed => {}
        }

        if self.cursor + 1 >= self.trace.len() {
            return Err(SessionError::NoMoreSteps);
        }
        self.cursor += 1;
        debug!(cursor = self.cursor, "stepped");
        self.current().ok_or(SessionError::NoMoreSteps)
    }

    /// Snapshot under the cursor, if the last run completed.
    pub fn current(&self) -> Option<&Snapshot> {
        match self.status {
            SessionStatus::Completed => self.trace.get(self.cursor),
            SessionStatus::Ready | SessionStatus::Failed => None,
        }
    }

    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    pub const fn trace(&self) -> &Trace {
        &self.trace
    }

    pub const fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// Text of the last program run, if it could be read.
    pub fn source_code(&self) -> Option<&str> {
        self.source.as_ref().map(SourceFile::text)
    }

    /// Why the last run failed.
    pub const fn failure(&self) -> Option<&EngineError> {
        self.failure.as_ref()
    }

    /// Program output of the last completed run.
    pub fn output(&self) -> Option<i32> {
        match self.status {
            SessionStatus::Completed => self.trace.output(),
            SessionStatus::Ready | SessionStatus::Failed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(code: &str) -> Session {
        let mut session = Session::new();
        session
            .run_source(SourceFile::from_text(code), &EngineConfig::default())
            .unwrap();
        session
    }

    #[test]
    fn test_cursor_moves_forward_only() {
        let mut session = completed("mov ax, 1\nmov ax, 2\nhlt");
        assert_eq!(session.current().unwrap().line_num, 1);
        assert_eq!(session.step_next().unwrap().line_num, 2);
        assert_eq!(session.step_next().unwrap().line_num, 3);
        assert_eq!(session.step_next(), Err(SessionError::NoMoreSteps));
        assert_eq!(session.step_next(), Err(SessionError::NoMoreSteps));
        assert_eq!(session.cursor(), 2);
        assert_eq!(session.output(), Some(2));
    }

    #[test]
    fn test_new_session_has_no_run() {
        let mut session = Session::new();
        assert_eq!(session.status(), SessionStatus::Ready);
        assert_eq!(session.step_next(), Err(SessionError::NoActiveRun));
        assert!(session.current().is_none());
    }

    #[test]
    fn test_failed_session_never_advances() {
        let mut session = Session::new();
        let err = session
            .run_source(
                SourceFile::from_text("mov ax, 1\npop bx"),
                &EngineConfig::default(),
            )
            .unwrap_err();
        assert!(matches!(err, SessionError::Run(EngineError::Execution(_))));
        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(session.trace().len(), 1);

        for _ in 0..3 {
            assert_eq!(session.step_next(), Err(SessionError::SessionFailed));
        }
        assert_eq!(session.cursor(), 0);
        assert!(session.current().is_none());
        assert_eq!(session.failure().and_then(EngineError::line_num), Some(2));
    }

    #[test]
    fn test_new_run_replaces_the_old_one() {
        let mut session = completed("nop\nnop\nhlt");
        session.step_next().unwrap();
        session.step_next().unwrap();

        session
            .run_source(SourceFile::from_text("mov ax, 9"), &EngineConfig::default())
            .unwrap();
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.trace().len(), 1);
        assert_eq!(session.source_code(), Some("mov ax, 9"));

        // A failing run replaces a completed one too.
        let err = session
            .run_source(SourceFile::from_text("bogus"), &EngineConfig::default())
            .unwrap_err();
        assert!(matches!(err, SessionError::Run(EngineError::Assemble(_))));
        assert!(session.trace().is_empty());
        assert!(session.program().is_none());

        // And a successful run clears the failure.
        session
            .run_source(SourceFile::from_text("hlt"), &EngineConfig::default())
            .unwrap();
        assert_eq!(session.status(), SessionStatus::Completed);
        assert!(session.failure().is_none());
    }
}
