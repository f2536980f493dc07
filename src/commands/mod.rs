//! The three entry points the chat/operator surface invokes, plus the
//! user-visible message layer. Transports deliver a validated verb and
//! argument; everything console-side goes through the arbiter.

use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::console::protocol::{ChangeAliasOrMap, StatusRefresh};
use crate::console::restart::RestartKickoff;
use crate::console::resolver::{ACCEPTED_ALIASES, MAP_POOL};
use crate::console::{
    ConsoleError, ConsoleResult, RecoveryPolicy, RestartOrchestrator, ServerStatus, SessionArbiter,
};

pub struct Dispatcher {
    arbiter: Arc<SessionArbiter>,
    orchestrator: Arc<RestartOrchestrator>,
    cooldown: Duration,
    recovery: RecoveryPolicy,
    group_id: String,
}

impl Dispatcher {
    pub fn new(
        arbiter: Arc<SessionArbiter>,
        orchestrator: Arc<RestartOrchestrator>,
        cooldown: Duration,
    ) -> Self {
        let config = AppConfig::get();
        Self::with_policy(
            arbiter,
            orchestrator,
            cooldown,
            RecoveryPolicy {
                retries: config.restart.retries,
                delay: Duration::from_secs(config.restart.retry_delay_secs),
            },
            config.chat.group_id.clone(),
        )
    }

    pub fn with_policy(
        arbiter: Arc<SessionArbiter>,
        orchestrator: Arc<RestartOrchestrator>,
        cooldown: Duration,
        recovery: RecoveryPolicy,
        group_id: String,
    ) -> Self {
        Self {
            arbiter,
            orchestrator,
            cooldown,
            recovery,
            group_id,
        }
    }

    /// Commands are only honored from the configured group/channel.
    pub fn is_allowed(&self, chat_id: &str) -> bool {
        chat_id == self.group_id
    }

    pub async fn query_status(&self) -> ConsoleResult<ServerStatus> {
        let status = self.arbiter.with_session(StatusRefresh).await?;
        info!("status refreshed: {}", serde_json::to_string(&status).unwrap_or_default());
        Ok(status)
    }

    pub async fn change_to(&self, target: &str) -> ConsoleResult<()> {
        self.arbiter
            .with_session(ChangeAliasOrMap::new(target, self.cooldown))
            .await?;
        info!("server changing mode or map to {}", target);
        Ok(())
    }

    /// Fire the restart trigger under the exclusive gate. A caller
    /// announces progress only once this has succeeded, then drives
    /// `recover_after_restart`.
    pub async fn kickoff_restart(&self) -> ConsoleResult<()> {
        self.arbiter
            .with_session(RestartKickoff::new(self.orchestrator.clone()))
            .await
    }

    /// Poll until the server answers or the retry budget runs out.
    pub async fn recover_after_restart(&self) -> ConsoleResult<ServerStatus> {
        self.orchestrator.recover(&self.arbiter, self.recovery).await
    }

    /// Daily unconditional restart window, gated like everything else.
    pub async fn run_scheduled(&self, grace: Duration) {
        self.orchestrator.run_scheduled(&self.arbiter, grace).await;
    }
}

pub fn format_status(status: &ServerStatus) -> String {
    format!(
        "服务器正在运行，模式：{}，地图：{}，服务器中当前有{}位玩家。",
        status.game_alias, status.map, status.players
    )
}

pub fn restart_started_message() -> &'static str {
    "开始尝试重启服务器，请稍等。重启可能需要3-5分钟（需要更新时更长），请耐心等待。"
}

pub fn change_requested_message(target: &str) -> String {
    format!(
        "服务器正在更换模式或地图至：{}，请稍等。如需继续更改模式或地图，请等待30秒。",
        target
    )
}

/// One user-visible line per error kind; unclassified failures get a
/// generic fallback and a log entry.
pub fn describe_error(err: &ConsoleError) -> String {
    match err {
        ConsoleError::Restarting => "服务器正在重启，请耐心等待。".to_string(),
        ConsoleError::Locked => "当前有正在进行的操作，请等待其完成。".to_string(),
        ConsoleError::OutOfService => "服务器挂惹".to_string(),
        ConsoleError::Slowdown => "切换模式或地图需等待30秒。".to_string(),
        ConsoleError::InvalidInput(_) => format!(
            "请输入正确的模式或地图代号：\n模式：{}\n地图：{}",
            ACCEPTED_ALIASES.join("  "),
            MAP_POOL.join("  ")
        ),
        ConsoleError::Other(inner) => {
            error!("unclassified console failure: {:#}", inner);
            "未知错误。".to_string()
        }
    }
}
