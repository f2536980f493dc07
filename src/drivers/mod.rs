mod console_cli;
mod driver;
mod graceful_shutdown;
mod scheduler;

pub use console_cli::ConsoleCliDriver;
pub use graceful_shutdown::GracefulShutdown;
pub use scheduler::SchedulerDriver;
