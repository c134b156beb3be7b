use async_trait::async_trait;

use crate::types::signal::Signal;

/// Pluggable destination for generated signals.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn publish(&self, signal: &Signal) -> anyhow::Result<()>;
}

/// Discards every signal. Used when no sink is wired in.
pub struct NoopSink;

#[async_trait]
impl SignalSink for NoopSink {
    async fn publish(&self, _signal: &Signal) -> anyhow::Result<()> {
        Ok(())
    }
}
