use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use rcon::Connection;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::ConsoleConfig;

/// Opens an authenticated console session. Connecting and
/// authenticating is a single round trip; any failure here is treated
/// as the console being unreachable.
#[async_trait]
pub trait ConsoleConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn ConsoleSession>>;
}

/// One authenticated, short-lived console connection, used for exactly
/// one operation. `execute` returns `None` when the console sends no
/// payload back.
#[async_trait]
pub trait ConsoleSession: Send {
    async fn execute(&mut self, command: &str) -> Result<Option<String>>;

    async fn disconnect(&mut self) -> Result<()>;
}

/// Production connector over the Source RCON protocol.
pub struct RconConnector {
    config: ConsoleConfig,
}

impl RconConnector {
    pub fn new(config: ConsoleConfig) -> Self {
        Self { config }
    }

    fn round_trip_timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }
}

#[async_trait]
impl ConsoleConnector for RconConnector {
    async fn connect(&self) -> Result<Box<dyn ConsoleSession>> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let conn = timeout(
            self.round_trip_timeout(),
            Connection::<TcpStream>::builder().connect(addr.as_str(), &self.config.password),
        )
        .await
        .context("console authentication timed out")?
        .with_context(|| format!("console authentication against {} failed", addr))?;

        Ok(Box::new(RconSession {
            conn: Some(conn),
            timeout: self.round_trip_timeout(),
            max_packet_size: self.config.max_packet_size,
        }))
    }
}

struct RconSession {
    conn: Option<Connection<TcpStream>>,
    timeout: Duration,
    max_packet_size: usize,
}

#[async_trait]
impl ConsoleSession for RconSession {
    async fn execute(&mut self, command: &str) -> Result<Option<String>> {
        let conn = match self.conn.as_mut() {
            Some(conn) => conn,
            None => bail!("console session already closed"),
        };
        let response = timeout(self.timeout, conn.cmd(command))
            .await
            .with_context(|| format!("console command timed out: {}", command))?
            .with_context(|| format!("console command failed: {}", command))?;

        // 0 means no bound, matching the connection options of the
        // original deployment.
        if self.max_packet_size > 0 && response.len() > self.max_packet_size {
            bail!(
                "console response exceeds packet bound ({} > {})",
                response.len(),
                self.max_packet_size
            );
        }

        if response.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(response))
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        // The protocol has no goodbye packet; dropping the connection
        // closes the underlying stream.
        self.conn.take();
        Ok(())
    }
}
