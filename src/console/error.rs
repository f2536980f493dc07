// Error kinds surfaced by console operations. Everything the outer
// command surface tells a user apart from success goes through here;
// anything else is an unclassified `Other` and only gets a generic
// user-visible fallback.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("server is restarting")]
    Restarting,
    #[error("another console operation is in flight")]
    Locked,
    #[error("console is out of service")]
    OutOfService,
    #[error("unknown game alias or map: {0}")]
    InvalidInput(String),
    #[error("mode/map change cooldown has not elapsed")]
    Slowdown,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;
