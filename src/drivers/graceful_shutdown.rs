use log::{debug, info};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinSet;

use super::driver::Driver;

/// Supervises the drivers and turns ctrl+c into the shared stop
/// notification they all watch.
pub struct GracefulShutdown {
    drivers: Vec<Arc<dyn Driver>>,
}

impl GracefulShutdown {
    pub fn new() -> Self {
        Self { drivers: vec![] }
    }

    pub fn add_driver(&mut self, driver: impl Driver + 'static) {
        self.drivers.push(Arc::new(driver));
    }

    pub async fn watch(mut self, stop_notify: Arc<Notify>) {
        let shutdown = async move {
            tokio::signal::ctrl_c()
                .await
                .expect("graceful shutdown can't install ctrl+c signal handler");
            info!("shutdown signal received");
            stop_notify.notify_waiters();
        };

        let mut join_set = JoinSet::new();
        for driver in self.drivers.drain(..) {
            debug!("starting driver: {}", driver.name());
            join_set.spawn(async move {
                driver.run().await;
            });
        }

        join_set.spawn(shutdown);
        debug!("graceful shutdown start watching");
        join_set.join_all().await;
    }
}
