use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use serde::Deserialize;
use std::time::Duration;

use super::arbiter::ConsoleOp;
use super::cooldown::slowdown_over;
use super::error::{ConsoleError, ConsoleResult};
use super::resolver;
use super::status::{ServerStatus, SharedStatus};
use super::transport::ConsoleSession;

/// Shape of the `status_json` reply; only the fields the relay cares
/// about, everything else is ignored.
#[derive(Debug, Deserialize)]
struct StatusReport {
    #[serde(default)]
    server: ServerBlock,
}

#[derive(Debug, Default, Deserialize)]
struct ServerBlock {
    map: Option<String>,
    clients_human: Option<u32>,
}

/// Two-step status exchange: `status_json` for map/players, then the
/// raw `game_alias` echo for the current mode. Updates are merged per
/// field so a partial reply never wipes the cached values.
pub struct StatusRefresh;

#[async_trait]
impl ConsoleOp for StatusRefresh {
    type Output = ServerStatus;

    async fn run(
        &mut self,
        session: &mut dyn ConsoleSession,
        status: &SharedStatus,
    ) -> ConsoleResult<ServerStatus> {
        let raw = session
            .execute("status_json")
            .await?
            .ok_or(ConsoleError::OutOfService)?;
        let report: StatusReport =
            serde_json::from_str(&raw).context("malformed status_json reply")?;
        if let Some(map) = report.server.map {
            status.set_map(map);
        }
        status.set_players(report.server.clients_human.unwrap_or(0));

        let raw_alias = session
            .execute("game_alias")
            .await?
            .ok_or(ConsoleError::OutOfService)?;
        match resolver::resolve_raw_alias(&raw_alias) {
            Some(alias) => status.set_game_alias(alias.to_string()),
            // unresolvable alias output keeps the cached mode
            None => debug!("unresolvable game_alias output: {}", raw_alias.trim()),
        }

        Ok(status.snapshot())
    }
}

/// Cooldown-gated mode/map change. Classification happens before any
/// console command; the command itself is fire-and-forget, absence of
/// a transport error counts as success.
pub struct ChangeAliasOrMap {
    target: String,
    cooldown: Duration,
}

impl ChangeAliasOrMap {
    pub fn new(target: impl Into<String>, cooldown: Duration) -> Self {
        Self {
            target: target.into(),
            cooldown,
        }
    }
}

#[async_trait]
impl ConsoleOp for ChangeAliasOrMap {
    type Output = ();

    async fn run(
        &mut self,
        session: &mut dyn ConsoleSession,
        status: &SharedStatus,
    ) -> ConsoleResult<()> {
        let kind = resolver::classify(&self.target)
            .ok_or_else(|| ConsoleError::InvalidInput(self.target.clone()))?;

        if !slowdown_over(Utc::now(), status.last_modified(), self.cooldown) {
            return Err(ConsoleError::Slowdown);
        }

        session
            .execute(&format!("{} {}", kind.command(), self.target))
            .await?;
        status.touch_modified();
        Ok(())
    }
}
