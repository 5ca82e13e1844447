use std::time::{Duration, Instant};

use dashmap::DashMap;
use mockasm_asm::EngineConfig;
use tracing::debug;

use crate::{
    error::Result,
    session::{Session, SessionStatus},
};

/// Identifier chosen by the client to name its session.
pub type SessionId = String;

#[derive(Debug)]
struct Entry {
    session: Session,
    last_used: Instant,
}

/// The sessions of every connected client.
///
/// Each entry is locked independently, so `step_next` calls on one session
/// are serialized while other sessions proceed.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<SessionId, Entry>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Runs the program at `path` in the session `id`, replacing any previous
    /// session under that id. `f` sees the outcome and the new session.
    pub fn run<T>(
        &self,
        id: &str,
        path: &str,
        config: &EngineConfig,
        f: impl FnOnce(Result<()>, &Session) -> T,
    ) -> T {
        // Runs outside of the map, so a long run does not hold a shard lock.
        // The last run to finish wins.
        let mut session = Session::new();
        let result = session.run(path, config).map(|_| ());
        let out = f(result, &session);
        self.sessions.insert(
            id.to_string(),
            Entry {
                session,
                last_used: Instant::now(),
            },
        );
        out
    }

    /// Advances the cursor of session `id`. Returns `None` if there is no
    /// such session.
    pub fn step_next<T>(&self, id: &str, f: impl FnOnce(Result<()>, &Session) -> T) -> Option<T> {
        let mut entry = self.sessions.get_mut(id)?;
        entry.last_used = Instant::now();
        let result = entry.session.step_next().map(|_| ());
        Some(f(result, &entry.session))
    }

    /// Status of session `id`, if it exists.
    pub fn status(&self, id: &str) -> Option<SessionStatus> {
        self.sessions.get(id).map(|entry| entry.session.status())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Drops the sessions that have not been used for longer than the TTL.
    /// Returns how many were dropped.
    pub fn evict_expired(&self) -> usize {
        self.evict_idle_since(Instant::now())
    }

    fn evict_idle_since(&self, now: Instant) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now.saturating_duration_since(entry.last_used) <= self.ttl);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            debug!(evicted, remaining = self.sessions.len(), "evicted idle sessions");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::error::SessionError;

    fn program_file(code: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(code.as_bytes()).unwrap();
        file
    }

    fn run(store: &SessionStore, id: &str, file: &NamedTempFile) -> Result<usize> {
        let path = file.path().to_str().unwrap();
        store.run(id, path, &EngineConfig::default(), |result, session| {
            result.map(|()| session.current().map_or(0, |snapshot| snapshot.line_num))
        })
    }

    #[test]
    fn test_sessions_are_independent() {
        let store = SessionStore::new(Duration::from_secs(60));
        let file = program_file("nop\nnop\nhlt");
        run(&store, "a", &file).unwrap();
        run(&store, "b", &file).unwrap();

        let step = |id: &str| {
            store.step_next(id, |result, session| {
                let line_num = session.current().map(|snapshot| snapshot.line_num);
                (result.map(|()| line_num.unwrap_or(0)), session.cursor())
            })
        };
        assert_eq!(step("a"), Some((Ok(2), 1)));
        assert_eq!(step("a"), Some((Ok(3), 2)));
        assert_eq!(step("b"), Some((Ok(2), 1)));
        assert_eq!(step("a"), Some((Err(SessionError::NoMoreSteps), 2)));
        assert_eq!(step("missing"), None);

        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert_eq!(step("a"), None);
        assert_eq!(step("b"), Some((Ok(3), 2)));
    }

    #[test]
    fn test_run_replaces_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let good = program_file("nop\nhlt");
        let bad = program_file("jmp nowhere");

        run(&store, "a", &good).unwrap();
        assert!(run(&store, "a", &bad).is_err());
        assert_eq!(store.status("a"), Some(SessionStatus::Failed));
        assert_eq!(store.len(), 1);

        let stepped = store.step_next("a", |result, _| result);
        assert_eq!(stepped, Some(Err(SessionError::SessionFailed)));
    }

    #[test]
    fn test_evict_expired() {
        let store = SessionStore::new(Duration::from_secs(60));
        let file = program_file("hlt");
        run(&store, "a", &file).unwrap();
        run(&store, "b", &file).unwrap();

        assert_eq!(store.evict_expired(), 0);
        let later = Instant::now() + Duration::from_secs(61);
        assert_eq!(store.evict_idle_since(later), 2);
        assert!(store.is_empty());
    }
}
