use async_trait::async_trait;
use log::warn;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::error::{ConsoleError, ConsoleResult};
use super::status::SharedStatus;
use super::transport::{ConsoleConnector, ConsoleSession};

/// One administrative operation run against an authenticated console
/// session. The shared status is only reachable through the handle the
/// arbiter passes in.
#[async_trait]
pub trait ConsoleOp: Send {
    type Output: Send;

    async fn run(
        &mut self,
        session: &mut dyn ConsoleSession,
        status: &SharedStatus,
    ) -> ConsoleResult<Self::Output>;
}

/// Serializes every operation that touches the remote console or the
/// shared status record. The one-permit semaphore is the single-flight
/// gate: a second caller fails fast with `Locked` instead of queuing,
/// and the check-and-set is atomic.
pub struct SessionArbiter {
    connector: Arc<dyn ConsoleConnector>,
    status: SharedStatus,
    gate: Semaphore,
}

impl SessionArbiter {
    pub fn new(connector: Arc<dyn ConsoleConnector>, status: SharedStatus) -> Self {
        Self {
            connector,
            status,
            gate: Semaphore::new(1),
        }
    }

    pub fn status(&self) -> &SharedStatus {
        &self.status
    }

    /// Acquire the console, run `op`, release. Fails fast with
    /// `Restarting` or `Locked` without opening a session.
    pub async fn with_session<O: ConsoleOp>(&self, op: O) -> ConsoleResult<O::Output> {
        self.run_gated(op, false).await
    }

    /// Same as `with_session` but ignores the restarting flag. Only
    /// the restart recovery loop may use this: it owns the flag and
    /// has to poll the server while the flag is still set.
    pub(crate) async fn with_session_during_restart<O: ConsoleOp>(
        &self,
        op: O,
    ) -> ConsoleResult<O::Output> {
        self.run_gated(op, true).await
    }

    async fn run_gated<O: ConsoleOp>(
        &self,
        mut op: O,
        during_restart: bool,
    ) -> ConsoleResult<O::Output> {
        if !during_restart && self.status.is_restarting() {
            return Err(ConsoleError::Restarting);
        }
        let _permit = self
            .gate
            .try_acquire()
            .map_err(|_| ConsoleError::Locked)?;
        // the flag may have been set by a restart kickoff that held
        // the permit between the first check and our acquisition
        if !during_restart && self.status.is_restarting() {
            return Err(ConsoleError::Restarting);
        }

        let mut session = match self.connector.connect().await {
            Ok(session) => session,
            Err(err) => {
                warn!("console authentication failed: {:#}", err);
                return Err(ConsoleError::OutOfService);
            }
        };
        self.status.set_connected(true);

        let result = op.run(session.as_mut(), &self.status).await;

        // A close failure must never mask the operation's result.
        if let Err(err) = session.disconnect().await {
            warn!("failed to close console session: {:#}", err);
        }
        self.status.set_connected(false);
        result
    }
}
