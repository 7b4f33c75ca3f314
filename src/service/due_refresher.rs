use crate::backend::SocietyBackend;
use crate::domain::due::DuePayment;
use crate::service::notifier::{Notice, Notifier};
use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

struct CachedDue {
    seq: u64,
    loaded_at: chrono::DateTime<chrono::Utc>,
    due: DuePayment,
}

#[derive(Clone)]
pub struct DueRefresher {
    pub backend: Arc<dyn SocietyBackend>,
    pub notifier: Arc<dyn Notifier>,
    issued: Arc<AtomicU64>,
    inner: Arc<RwLock<Option<CachedDue>>>,
}

impl DueRefresher {
    pub fn new(backend: Arc<dyn SocietyBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            notifier,
            issued: Arc::new(AtomicU64::new(0)),
            inner: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn current(&self) -> Option<DuePayment> {
        self.inner.read().await.as_ref().map(|c| c.due.clone())
    }

    pub async fn last_loaded_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.inner.read().await.as_ref().map(|c| c.loaded_at)
    }

    pub async fn current_or_load(&self) -> Result<DuePayment> {
        if let Some(due) = self.current().await {
            return Ok(due);
        }
        self.refresh().await
    }

    /// On failure the previous due stays in place. A fetch issued before the
    /// one already cached is discarded and the newer due is returned.
    pub async fn refresh(&self) -> Result<DuePayment> {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let due = match self.backend.get_next_due().await {
            Ok(due) => due,
            Err(e) => {
                tracing::warn!("due refresh failed, keeping previous value: {}", e);
                self.notifier.notify(Notice::DueLoadFailed {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        if let Err(violation) = due.check_totals() {
            tracing::warn!(payment_id = ?due.payment_id, "due payment failed sanity check: {}", violation);
        }

        let mut write = self.inner.write().await;
        if let Some(newer) = write.as_ref().filter(|c| c.seq > seq) {
            tracing::debug!(seq, cached_seq = newer.seq, "discarding out-of-order due refresh");
            return Ok(newer.due.clone());
        }
        tracing::info!(payment_id = ?due.payment_id, has_due = due.has_due, total = %due.total_amount, seq, "due refreshed");
        *write = Some(CachedDue {
            seq,
            loaded_at: chrono::Utc::now(),
            due: due.clone(),
        });
        Ok(due)
    }

    pub fn schedule(&self, delay: Duration) -> JoinHandle<()> {
        let this = self.clone();
        tracing::debug!(delay_ms = delay.as_millis() as u64, "scheduling due refresh");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = this.refresh().await;
        })
    }
}
