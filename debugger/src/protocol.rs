//! Requests and responses exchanged with a debugger client.
//!
//! Every message is a single JSON object. Responses keep the field names the
//! browser front end reads: `icon`, `title`, `text`, `output`, `source_code`,
//! `sequence_of_execution` and `current_sequence`.

use mockasm_asm::{EngineError, LoadError, Snapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    config::DebuggerConfig,
    error::SessionError,
    session::Session,
    store::SessionStore,
};

pub const DEFAULT_SESSION: &str = "default";

fn default_session() -> String {
    DEFAULT_SESSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Request {
    /// Runs the file at `path` and returns the first snapshot.
    GetOutput {
        #[serde(default = "default_session")]
        session: String,
        #[serde(default)]
        path: String,
    },
    /// Advances the session to its next snapshot.
    NextOutput {
        #[serde(default = "default_session")]
        session: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Run {
        icon: Icon,
        title: String,
        text: String,
        /// Decimal value of `AX` when the program halted.
        output: String,
        source_code: String,
        sequence_of_execution: Snapshot,
    },
    Step {
        icon: Icon,
        source_code: String,
        current_sequence: Snapshot,
    },
    Error {
        icon: Icon,
        title: String,
        text: String,
    },
}

impl Response {
    pub fn error(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Error {
            icon: Icon::Error,
            title: title.into(),
            text: text.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Error { .. })
    }

    /// Response for a successful run, with the session's first snapshot.
    fn run(session: &Session) -> Self {
        match session.current() {
            Some(snapshot) => Self::Run {
                icon: Icon::Success,
                title: "Success".to_string(),
                text: "Code executed successfully!".to_string(),
                output: session
                    .output()
                    .map(|output| output.to_string())
                    .unwrap_or_default(),
                source_code: session.source_code().unwrap_or_default().to_string(),
                sequence_of_execution: snapshot.clone(),
            },
            None => Self::from(&SessionError::NoActiveRun),
        }
    }

    fn step(session: &Session) -> Self {
        match session.current() {
            Some(snapshot) => Self::Step {
                icon: Icon::Success,
                source_code: session.source_code().unwrap_or_default().to_string(),
                current_sequence: snapshot.clone(),
            },
            None => Self::from(&SessionError::NoActiveRun),
        }
    }
}

impl From<&SessionError> for Response {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::Run(EngineError::Load(LoadError::PathInvalid)) => {
                Self::error("Error", "ASM code file path is required!")
            }
            SessionError::Run(EngineError::Load(err)) => Self::error("File error", err.to_string()),
            SessionError::Run(EngineError::Assemble(err)) => {
                Self::error("Syntax error", err.to_string())
            }
            SessionError::Run(EngineError::Execution(failure)) => {
                Self::error("Runtime error", failure.to_string())
            }
            SessionError::SessionFailed => Self::error(
                "Error",
                "The last run failed, fix the program and run it again.",
            ),
            SessionError::NoActiveRun => Self::error("Error", "Run a program before stepping."),
            SessionError::NoMoreSteps => {
                Self::error("End of execution", "There are no more steps to execute.")
            }
        }
    }
}

/// Serves one request against the store.
#[instrument(level = "debug", skip(store, config))]
pub fn handle(store: &SessionStore, config: &DebuggerConfig, request: Request) -> Response {
    let evicted = store.evict_expired();
    if evicted > 0 {
        debug!(evicted, "dropped idle sessions before serving request");
    }

    match request {
        Request::GetOutput { session, path } => {
            store.run(&session, &path, &config.engine, |result, session| match result {
                Ok(()) => Response::run(session),
                Err(err) => Response::from(&err),
            })
        }
        Request::NextOutput { session } => store
            .step_next(&session, |result, session| match result {
                Ok(()) => Response::step(session),
                Err(err) => Response::from(&err),
            })
            .unwrap_or_else(|| Response::from(&SessionError::NoActiveRun)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_format() {
        let request: Request =
            serde_json::from_str(r#"{"op": "get-output", "session": "s1", "path": "a.asm"}"#)
                .unwrap();
        assert_eq!(
            request,
            Request::GetOutput {
                session: "s1".to_string(),
                path: "a.asm".to_string()
            }
        );

        let request: Request = serde_json::from_str(r#"{"op": "next-output"}"#).unwrap();
        assert_eq!(
            request,
            Request::NextOutput {
                session: DEFAULT_SESSION.to_string()
            }
        );

        assert!(serde_json::from_str::<Request>(r#"{"op": "rewind"}"#).is_err());
    }

    #[test]
    fn test_error_format() {
        let response = Response::from(&SessionError::NoMoreSteps);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({
                "icon": "error",
                "title": "End of execution",
                "text": "There are no more steps to execute."
            })
        );
        assert!(!response.is_success());
    }

    #[test]
    fn test_missing_path() {
        let store = SessionStore::new(DebuggerConfig::default().session_ttl);
        let response = handle(
            &store,
            &DebuggerConfig::default(),
            Request::GetOutput {
                session: DEFAULT_SESSION.to_string(),
                path: "  ".to_string(),
            },
        );
        assert_eq!(
            response,
            Response::error("Error", "ASM code file path is required!")
        );

        // The failed run still replaced the session.
        let response = handle(
            &store,
            &DebuggerConfig::default(),
            Request::NextOutput {
                session: DEFAULT_SESSION.to_string(),
            },
        );
        assert_eq!(response, Response::from(&SessionError::SessionFailed));
    }
}
