use log::debug;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::commands::Dispatcher;
use crate::config::{self, AppConfig};
use crate::console::restart::ComposeRestart;
use crate::console::transport::RconConnector;
use crate::console::{RestartOrchestrator, SessionArbiter, SharedStatus};
use crate::drivers::{ConsoleCliDriver, GracefulShutdown, SchedulerDriver};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct ApplicationState {
    pub stop_notify: Arc<Notify>,
    pub dispatcher: Dispatcher,
}
pub type AppState = Arc<ApplicationState>;

fn init_app_state() -> AppState {
    let config = AppConfig::get();
    debug!(
        "config loaded: {}",
        serde_json::to_string_pretty(&config).unwrap_or_default()
    );

    let status = SharedStatus::new();
    let connector = Arc::new(RconConnector::new(config.console.clone()));
    let arbiter = Arc::new(SessionArbiter::new(connector, status.clone()));
    let trigger = Arc::new(ComposeRestart::new(config.restart.compose_dir.clone()));
    let orchestrator = Arc::new(RestartOrchestrator::new(status, trigger));
    let dispatcher = Dispatcher::new(arbiter, orchestrator, config::cooldown());

    Arc::new(ApplicationState {
        stop_notify: Arc::new(Notify::new()),
        dispatcher,
    })
}

pub async fn run_app() -> anyhow::Result<()> {
    let state = init_app_state();
    log::info!("cs2-relay v{} running", VERSION);

    let mut gs = GracefulShutdown::new();
    gs.add_driver(ConsoleCliDriver::new(state.clone()));
    gs.add_driver(SchedulerDriver::new(state.clone()));

    gs.watch(state.stop_notify.clone()).await;
    log::info!("Bye.");
    Ok(())
}
