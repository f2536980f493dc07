use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

use super::arbiter::{ConsoleOp, SessionArbiter};
use super::error::{ConsoleError, ConsoleResult};
use super::protocol::StatusRefresh;
use super::status::{ServerStatus, SharedStatus};
use super::transport::ConsoleSession;

/// Out-of-band "restart the backing server process" collaborator.
#[async_trait]
pub trait RestartTrigger: Send + Sync {
    async fn restart(&self) -> Result<()>;
}

/// Production trigger: `docker compose restart` in the container
/// directory of the game server.
pub struct ComposeRestart {
    dir: PathBuf,
}

impl ComposeRestart {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl RestartTrigger for ComposeRestart {
    async fn restart(&self) -> Result<()> {
        let output = Command::new("docker")
            .args(["compose", "restart"])
            .current_dir(&self.dir)
            .output()
            .await
            .context("failed to spawn docker compose")?;
        if !output.status.success() {
            bail!(
                "docker compose restart exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// How many refresh attempts the interactive recovery loop makes and
/// how long it sleeps before each one.
#[derive(Debug, Clone, Copy)]
pub struct RecoveryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

/// Owns the `restarting` flag and the two ways it gets cleared: the
/// strict interactive recovery loop, and the deliberately lax daily
/// scheduled path.
pub struct RestartOrchestrator {
    status: SharedStatus,
    trigger: Arc<dyn RestartTrigger>,
}

impl RestartOrchestrator {
    pub fn new(status: SharedStatus, trigger: Arc<dyn RestartTrigger>) -> Self {
        Self { status, trigger }
    }

    /// Mark the server restarting and fire the external trigger. On
    /// trigger failure the flag stays set and the error propagates;
    /// driving recovery is the caller's job.
    pub async fn begin_restart(&self) -> Result<()> {
        self.status.set_restarting(true);
        self.trigger.restart().await
    }

    /// Clear the restarting flag. Callers confirm the server is
    /// responsive first; the scheduled path skips that on purpose.
    pub fn finish_restart(&self) {
        self.status.set_restarting(false);
    }

    /// Interactive recovery: wait, poll a status refresh through the
    /// arbiter, clear the flag on first success. Per-attempt failures
    /// only get logged; exhausting the budget reports failure once and
    /// leaves `restarting` set for an operator (or the daily path) to
    /// resolve.
    pub async fn recover(
        &self,
        arbiter: &SessionArbiter,
        policy: RecoveryPolicy,
    ) -> ConsoleResult<ServerStatus> {
        for attempt in 1..=policy.retries {
            tokio::time::sleep(policy.delay).await;
            match arbiter.with_session_during_restart(StatusRefresh).await {
                Ok(status) => {
                    self.finish_restart();
                    info!("server came back after restart (attempt {})", attempt);
                    return Ok(status);
                }
                Err(err) => {
                    warn!(
                        "server not ready after restart (attempt {}/{}): {}",
                        attempt, policy.retries, err
                    );
                }
            }
        }
        error!(
            "server did not come back after {} refresh attempts, restarting flag left set",
            policy.retries
        );
        Err(ConsoleError::OutOfService)
    }

    /// Daily unconditional path. The kickoff goes through the arbiter
    /// so the trigger can never fire while another operation holds
    /// the console session; a refused gate skips the cycle until the
    /// next day. Once the restart has begun, the grace period and the
    /// flag clear are unconditional, regardless of confirmed health.
    pub async fn run_scheduled(self: &Arc<Self>, arbiter: &SessionArbiter, grace: Duration) {
        if let Err(err) = arbiter.with_session(RestartKickoff::new(self.clone())).await {
            warn!("scheduled restart kickoff failed: {}", err);
            if !self.status.is_restarting() {
                // the gate refused or the console was unreachable
                // before the trigger could fire; nothing to wait out
                return;
            }
            // the restart did begin (or a stale flag is stuck from an
            // exhausted recovery); let the grace window clear it
        }
        tokio::time::sleep(grace).await;
        self.finish_restart();
        info!("scheduled restart window closed");
    }
}

/// Fires the restart trigger under the arbiter's exclusive gate, so a
/// restart cannot kick off while another operation is mid-flight.
pub struct RestartKickoff {
    orchestrator: Arc<RestartOrchestrator>,
}

impl RestartKickoff {
    pub fn new(orchestrator: Arc<RestartOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl ConsoleOp for RestartKickoff {
    type Output = ();

    async fn run(
        &mut self,
        _session: &mut dyn ConsoleSession,
        _status: &SharedStatus,
    ) -> ConsoleResult<()> {
        self.orchestrator.begin_restart().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::transport::testing::MockConnector;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakeTrigger {
        fail: AtomicBool,
        fired: AtomicUsize,
    }

    impl FakeTrigger {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                fail: AtomicBool::new(false),
                fired: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RestartTrigger for FakeTrigger {
        async fn restart(&self) -> Result<()> {
            self.fired.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(anyhow!("compose unavailable"));
            }
            Ok(())
        }
    }

    const FULL_STATUS: &str = r#"{"server":{"map":"de_mirage","clients_human":0}}"#;

    fn quick_policy(retries: u32) -> RecoveryPolicy {
        RecoveryPolicy {
            retries,
            delay: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_begin_restart_sets_flag() {
        let status = SharedStatus::new();
        let trigger = FakeTrigger::new();
        let orchestrator = RestartOrchestrator::new(status.clone(), trigger.clone());

        orchestrator.begin_restart().await.unwrap();
        assert!(status.is_restarting());
        assert_eq!(trigger.fired.load(Ordering::SeqCst), 1);

        orchestrator.finish_restart();
        assert!(!status.is_restarting());
    }

    #[tokio::test]
    async fn test_trigger_failure_leaves_flag_set() {
        let status = SharedStatus::new();
        let trigger = FakeTrigger::new();
        trigger.fail.store(true, Ordering::SeqCst);
        let orchestrator = RestartOrchestrator::new(status.clone(), trigger.clone());

        assert!(orchestrator.begin_restart().await.is_err());
        assert!(status.is_restarting());
    }

    #[tokio::test]
    async fn test_recover_clears_flag_on_first_success() {
        let status = SharedStatus::new();
        status.set_restarting(true);
        let connector = Arc::new(MockConnector::new());
        // two dead polls, then the server answers
        connector.push_reply(Ok(None));
        connector.push_reply(Ok(None));
        connector.push_text(FULL_STATUS);
        connector.push_text("game_type = 1, game_mode = 2");
        let arbiter = SessionArbiter::new(connector.clone(), status.clone());
        let orchestrator = RestartOrchestrator::new(status.clone(), FakeTrigger::new());

        let snap = orchestrator
            .recover(&arbiter, quick_policy(5))
            .await
            .unwrap();
        assert!(!status.is_restarting());
        assert_eq!(snap.game_alias, "deathmatch");
    }

    #[tokio::test]
    async fn test_recover_exhaustion_reports_once_and_keeps_flag() {
        let status = SharedStatus::new();
        status.set_restarting(true);
        let connector = Arc::new(MockConnector::new());
        for _ in 0..3 {
            connector.push_reply(Ok(None));
        }
        let arbiter = SessionArbiter::new(connector.clone(), status.clone());
        let orchestrator = RestartOrchestrator::new(status.clone(), FakeTrigger::new());

        let err = orchestrator
            .recover(&arbiter, quick_policy(3))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::OutOfService));
        assert!(status.is_restarting());
        assert_eq!(connector.connect_count(), 3);
    }

    #[tokio::test]
    async fn test_scheduled_path_clears_flag_unconditionally() {
        let status = SharedStatus::new();
        let connector = Arc::new(MockConnector::new());
        let arbiter = SessionArbiter::new(connector.clone(), status.clone());
        let trigger = FakeTrigger::new();
        // the server "never comes back": the trigger itself fails
        trigger.fail.store(true, Ordering::SeqCst);
        let orchestrator = Arc::new(RestartOrchestrator::new(status.clone(), trigger.clone()));

        orchestrator
            .run_scheduled(&arbiter, Duration::from_millis(10))
            .await;
        assert!(!status.is_restarting());
        assert_eq!(trigger.fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scheduled_kickoff_skips_cycle_while_op_in_flight() {
        let status = SharedStatus::new();
        let connector = Arc::new(MockConnector::new());
        let arbiter = Arc::new(SessionArbiter::new(connector.clone(), status.clone()));
        let trigger = FakeTrigger::new();
        let orchestrator = Arc::new(RestartOrchestrator::new(status.clone(), trigger.clone()));

        struct ParkOp {
            entered: Arc<tokio::sync::Notify>,
            release: Arc<tokio::sync::Notify>,
        }

        #[async_trait]
        impl ConsoleOp for ParkOp {
            type Output = ();

            async fn run(
                &mut self,
                _session: &mut dyn ConsoleSession,
                _status: &SharedStatus,
            ) -> ConsoleResult<()> {
                self.entered.notify_one();
                self.release.notified().await;
                Ok(())
            }
        }

        let entered = Arc::new(tokio::sync::Notify::new());
        let release = Arc::new(tokio::sync::Notify::new());
        let parked = tokio::spawn({
            let arbiter = arbiter.clone();
            let entered = entered.clone();
            let release = release.clone();
            async move {
                arbiter
                    .with_session(ParkOp { entered, release })
                    .await
            }
        });
        entered.notified().await;

        // the daily timer fires mid-exchange: the trigger must not go
        // off while the session is held, and the flag stays clear
        orchestrator
            .run_scheduled(&arbiter, Duration::from_millis(5))
            .await;
        assert_eq!(trigger.fired.load(Ordering::SeqCst), 0);
        assert!(!status.is_restarting());

        release.notify_one();
        parked.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_scheduled_path_unwedges_stuck_flag() {
        let status = SharedStatus::new();
        // a flag left set by an exhausted recovery loop
        status.set_restarting(true);
        let connector = Arc::new(MockConnector::new());
        let arbiter = SessionArbiter::new(connector.clone(), status.clone());
        let trigger = FakeTrigger::new();
        let orchestrator = Arc::new(RestartOrchestrator::new(status.clone(), trigger.clone()));

        orchestrator
            .run_scheduled(&arbiter, Duration::from_millis(5))
            .await;
        // the kickoff is refused, but the grace window still clears
        // the stale flag
        assert_eq!(trigger.fired.load(Ordering::SeqCst), 0);
        assert!(!status.is_restarting());
    }

    #[tokio::test]
    async fn test_kickoff_runs_under_the_gate() {
        let status = SharedStatus::new();
        let connector = Arc::new(MockConnector::new());
        let arbiter = SessionArbiter::new(connector.clone(), status.clone());
        let trigger = FakeTrigger::new();
        let orchestrator = Arc::new(RestartOrchestrator::new(status.clone(), trigger.clone()));

        arbiter
            .with_session(RestartKickoff::new(orchestrator))
            .await
            .unwrap();
        assert!(status.is_restarting());
        assert_eq!(trigger.fired.load(Ordering::SeqCst), 1);
        assert_eq!(connector.connect_count(), 1);
    }
}
