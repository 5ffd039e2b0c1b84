use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::{error::AppError, models::trip::Position};

const SAMPLE_BUFFER: usize = 64;

/// Source of live coordinate samples (a GPS or platform location service).
/// Subscribers receive every sample in delivery order; cancellation is by
/// dropping the receiver or aborting the consuming task.
#[async_trait]
pub trait PositionFeed: Send + Sync {
    /// Errors with [`AppError::UnsupportedEnvironment`] when no live feed
    /// exists on this host.
    async fn subscribe(&self) -> Result<mpsc::Receiver<Position>, AppError>;
}

/// In-process feed fed by explicit [`ChannelFeed::push`] calls. Used by tests
/// and simulations; also the model for platform adapters, which only need to
/// push into one of these from their native callback.
#[derive(Clone)]
pub struct ChannelFeed {
    source: Option<broadcast::Sender<Position>>,
}

impl ChannelFeed {
    pub fn new() -> Self {
        let (source, _) = broadcast::channel(SAMPLE_BUFFER);
        Self {
            source: Some(source),
        }
    }

    /// A feed whose `subscribe` always fails, modeling a host without a
    /// location service.
    pub fn unavailable() -> Self {
        Self { source: None }
    }

    /// Delivers one sample to every active subscriber. Samples pushed while
    /// nobody is subscribed are dropped, matching a live feed.
    pub fn push(&self, sample: Position) {
        if let Some(source) = &self.source {
            let _ = source.send(sample);
        }
    }
}

impl Default for ChannelFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PositionFeed for ChannelFeed {
    async fn subscribe(&self) -> Result<mpsc::Receiver<Position>, AppError> {
        let Some(source) = &self.source else {
            return Err(AppError::UnsupportedEnvironment);
        };
        let mut samples = source.subscribe();
        let (tx, rx) = mpsc::channel(SAMPLE_BUFFER);
        tokio::spawn(async move {
            loop {
                match samples.recv().await {
                    Ok(sample) => {
                        if tx.send(sample).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(rx)
    }
}
