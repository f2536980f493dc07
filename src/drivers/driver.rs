#[async_trait::async_trait]
pub trait Driver: Send + Sync {
    /// Runs until the application's stop notify fires.
    async fn run(&self);

    fn name(&self) -> &'static str;
}
