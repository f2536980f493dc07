use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::select;

use super::driver::Driver;
use crate::app::AppState;
use crate::commands;

/// Line-oriented operator console on stdin. Stands in for the chat
/// transport: `status`, `restart`, anything else is treated as a
/// mode/map target.
pub struct ConsoleCliDriver {
    state: AppState,
}

impl ConsoleCliDriver {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    async fn handle_line(&self, line: &str) {
        let dispatcher = &self.state.dispatcher;
        let reply = match line {
            "" | "help" => {
                "commands: status | restart | <alias-or-map>".to_string()
            }
            "status" => match dispatcher.query_status().await {
                Ok(status) => commands::format_status(&status),
                Err(err) => commands::describe_error(&err),
            },
            // the notice only goes out once the kickoff has actually
            // made it through the gate
            "restart" | "重启" => match dispatcher.kickoff_restart().await {
                Ok(()) => {
                    println!("{}", commands::restart_started_message());
                    match dispatcher.recover_after_restart().await {
                        Ok(status) => commands::format_status(&status),
                        Err(err) => commands::describe_error(&err),
                    }
                }
                Err(err) => commands::describe_error(&err),
            },
            target => match dispatcher.change_to(target).await {
                Ok(()) => commands::change_requested_message(target),
                Err(err) => commands::describe_error(&err),
            },
        };
        println!("{}", reply);
    }
}

#[async_trait::async_trait]
impl Driver for ConsoleCliDriver {
    async fn run(&self) {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let stop = self.state.stop_notify.clone();
        info!("operator console ready");
        loop {
            select! {
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => self.handle_line(line.trim()).await,
                        Ok(None) => {
                            // stdin closed; keep the daemon running for
                            // the scheduler
                            info!("stdin closed, operator console stopped");
                            stop.notified().await;
                            break;
                        }
                        Err(err) => {
                            warn!("could not read operator console: {}", err);
                            break;
                        }
                    }
                }
                _ = stop.notified() => break,
            }
        }
    }

    fn name(&self) -> &'static str {
        "console-cli"
    }
}
