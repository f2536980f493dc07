use chrono::{DateTime, Local, TimeDelta};
use log::{info, warn};
use std::time::Duration;
use tokio::select;

use super::driver::Driver;
use crate::app::AppState;
use crate::config::AppConfig;

/// Fires the unconditional daily restart at the configured local hour.
pub struct SchedulerDriver {
    state: AppState,
}

impl SchedulerDriver {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

/// Next wall-clock occurrence of `hour:00:00` strictly after `now`.
fn next_run(now: DateTime<Local>, hour: u32) -> DateTime<Local> {
    let hour = hour % 24;
    let mut candidate = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .unwrap_or_else(|| now.naive_local());
    if candidate <= now.naive_local() {
        candidate += TimeDelta::days(1);
    }
    match candidate.and_local_timezone(Local) {
        chrono::LocalResult::Single(dt) => dt,
        // DST gap/fold: settle for an hour later
        _ => now + TimeDelta::hours(1),
    }
}

#[async_trait::async_trait]
impl Driver for SchedulerDriver {
    async fn run(&self) {
        let config = &AppConfig::get().restart;
        let grace = Duration::from_secs(config.grace_secs);
        let stop = self.state.stop_notify.clone();

        loop {
            let now = Local::now();
            let at = next_run(now, config.hour);
            let wait = (at - now).to_std().unwrap_or(Duration::ZERO);
            info!("next scheduled restart at {}", at.format("%Y-%m-%d %H:%M"));

            select! {
                _ = tokio::time::sleep(wait) => {
                    info!("scheduled restart starting");
                    self.state.dispatcher.run_scheduled(grace).await;
                }
                _ = stop.notified() => {
                    warn!("scheduler stopping");
                    break;
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "daily-restart"
    }
}
