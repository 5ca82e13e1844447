use std::time::Duration;

use mockasm_asm::EngineConfig;

/// Default idle time after which a session is dropped.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Configuration of a debugger instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebuggerConfig {
    /// Limits applied to every program run.
    pub engine: EngineConfig,
    /// Sessions idle for longer than this are evicted.
    pub session_ttl: Duration,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}
