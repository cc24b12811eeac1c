//! Usage metering seam toward the external billing collaborator
//!
//! The pipeline reports one tick per completed session; entitlement refresh
//! and reconciliation are the collaborator's concern, not the core's.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::account::AccountId;

#[async_trait]
pub trait UsageMeter: Send + Sync {
    /// Record that one session for this account reached `Completed`. Called
    /// at most once per session; the caller guards idempotence.
    async fn record_completed_session(&self, account: &AccountId) -> Result<()>;
}

/// Process-local meter used in development and tests.
#[derive(Default)]
pub struct InMemoryUsageMeter {
    counts: Mutex<HashMap<AccountId, u64>>,
}

impl InMemoryUsageMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn total_for(&self, account: &AccountId) -> u64 {
        let counts = self.counts.lock().await;
        counts.get(account).copied().unwrap_or(0)
    }
}

#[async_trait]
impl UsageMeter for InMemoryUsageMeter {
    async fn record_completed_session(&self, account: &AccountId) -> Result<()> {
        let mut counts = self.counts.lock().await;
        let total = counts.entry(account.clone()).or_insert(0);
        *total += 1;
        debug!("usage for {} is now {}", account, total);
        Ok(())
    }
}
