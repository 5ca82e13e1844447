//! Stepping debugger for mockasm programs.
//!
//! A [`Session`] runs a program once, keeps its whole execution trace and
//! replays it one snapshot at a time. The [`SessionStore`] holds one session
//! per client and [`protocol`] turns requests into responses.

pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod store;

pub use config::{DebuggerConfig, DEFAULT_SESSION_TTL};
pub use error::{Result, SessionError};
pub use protocol::{handle, Request, Response};
pub use session::{Session, SessionStatus};
pub use store::{SessionId, SessionStore};
