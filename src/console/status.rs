use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Last known state of the backing game server. Lives for the whole
/// process; `game_alias`/`map`/`players` are best-effort caches that
/// keep their previous value when a refresh cannot produce a field.
#[derive(Debug, Clone, Serialize)]
pub struct ServerStatus {
    pub connected: bool,
    pub restarting: bool,
    pub game_alias: String,
    pub map: String,
    pub players: u32,
    pub last_modified: DateTime<Utc>,
}

impl Default for ServerStatus {
    fn default() -> Self {
        Self {
            connected: false,
            restarting: false,
            game_alias: "deathmatch".to_string(),
            map: "de_mirage".to_string(),
            players: 0,
            last_modified: Utc::now(),
        }
    }
}

/// Sole access path to the shared status record. Every read and write
/// goes through a method here; the lock is never held across an await.
#[derive(Clone, Default)]
pub struct SharedStatus {
    inner: Arc<Mutex<ServerStatus>>,
}

impl SharedStatus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ServerStatus> {
        // A poisoned lock means a panic mid-update; the record only
        // holds plain fields, so keep serving the last written values.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> ServerStatus {
        self.lock().clone()
    }

    pub fn is_restarting(&self) -> bool {
        self.lock().restarting
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.lock().last_modified
    }

    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }

    pub fn set_restarting(&self, restarting: bool) {
        self.lock().restarting = restarting;
    }

    pub fn set_map(&self, map: String) {
        self.lock().map = map;
    }

    pub fn set_players(&self, players: u32) {
        self.lock().players = players;
    }

    pub fn set_game_alias(&self, alias: String) {
        self.lock().game_alias = alias;
    }

    /// Record the moment of a successful mutation; only the mutation
    /// path calls this, never a status refresh.
    pub fn touch_modified(&self) {
        self.lock().last_modified = Utc::now();
    }
}

#[cfg(test)]
impl SharedStatus {
    /// Shift `last_modified` into the past to place a test outside
    /// the cooldown window.
    pub(crate) fn backdate_modified(&self, secs: i64) {
        self.lock().last_modified = Utc::now() - chrono::TimeDelta::seconds(secs);
    }
}
