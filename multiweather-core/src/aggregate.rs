//! Fan-out aggregation over a set of temperature providers.
//!
//! Every provider is queried on its own task. Outcomes are merged through one
//! channel in completion order: the first failure is returned as-is, otherwise the
//! mean of all readings. Tasks still running after a failure are not cancelled;
//! they finish in the background and their outcome is dropped.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::provider::TemperatureProvider;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("no weather providers configured")]
    EmptyProviderSet,

    /// A provider task ended (panicked) without delivering an outcome.
    #[error("a weather provider stopped without reporting a temperature")]
    LostOutcome,

    /// The first failure observed, unchanged.
    #[error(transparent)]
    Provider(anyhow::Error),
}

/// Ordered, immutable set of providers shared by every aggregation.
#[derive(Debug, Clone)]
pub struct ProviderSet {
    providers: Arc<[Arc<dyn TemperatureProvider>]>,
}

impl ProviderSet {
    pub fn new(providers: Vec<Arc<dyn TemperatureProvider>>) -> Self {
        Self { providers: providers.into() }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<dyn TemperatureProvider>> {
        self.providers.iter()
    }

    /// Mean temperature at `location` in Kelvin across all providers, or the first
    /// provider error to arrive.
    ///
    /// When several outcomes are ready at once, which one is seen first is up to the
    /// scheduler.
    pub async fn temperature(&self, location: &str) -> Result<f64, AggregateError> {
        let n = self.providers.len();
        if n == 0 {
            return Err(AggregateError::EmptyProviderSet);
        }

        // Capacity n: a task finishing after we returned never waits on the channel.
        let (tx, mut rx) = mpsc::channel::<anyhow::Result<f64>>(n);

        for provider in self.providers.iter() {
            let provider = Arc::clone(provider);
            let location = location.to_owned();
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = provider.temperature(&location).await;
                // Err only once the receiver is gone; the outcome is orphaned.
                let _ = tx.send(outcome).await;
            });
        }
        drop(tx);

        let mut sum = 0.0;
        for _ in 0..n {
            match rx.recv().await {
                Some(Ok(kelvin)) => sum += kelvin,
                Some(Err(err)) => return Err(AggregateError::Provider(err)),
                None => return Err(AggregateError::LostOutcome),
            }
        }

        Ok(sum / n as f64)
    }
}
