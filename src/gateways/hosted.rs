//! Checkout hosted in the user's browser. `open` publishes a session; the
//! browser runs the widget and posts its native events back through `deliver`.

use crate::gateways::{CheckoutHandlers, CheckoutOptions, CheckoutWidget, NativeCheckoutEvent};
use anyhow::{anyhow, bail, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(15 * 60);

struct HostedSession {
    options: CheckoutOptions,
    handlers: CheckoutHandlers,
    opened_at: Instant,
}

pub struct HostedCheckout {
    pub script_url: String,
    pub timeout_ms: u64,
    pub session_ttl: Duration,
    pub client: reqwest::Client,
    sessions: Mutex<HashMap<String, HostedSession>>,
}

impl HostedCheckout {
    pub fn new(script_url: &str, timeout_ms: u64) -> Self {
        Self {
            script_url: script_url.to_string(),
            timeout_ms,
            session_ttl: DEFAULT_SESSION_TTL,
            client: reqwest::Client::new(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn open_session(&self) -> Option<CheckoutOptions> {
        self.expire_stale();
        self.sessions
            .lock()
            .values()
            .max_by_key(|s| s.opened_at)
            .map(|s| s.options.clone())
    }

    /// Returns whether the event ended the checkout.
    pub fn deliver(&self, order_id: &str, event: NativeCheckoutEvent) -> Result<bool> {
        self.expire_stale();
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get(order_id)
            .ok_or_else(|| anyhow!("no open checkout for order {}", order_id))?;

        let resolved = session.handlers.dispatch(event);
        if resolved || session.handlers.is_resolved() {
            sessions.remove(order_id);
        }
        Ok(resolved)
    }

    pub fn expire_stale(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        let stale: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| now.duration_since(s.opened_at) >= self.session_ttl)
            .map(|(order_id, _)| order_id.clone())
            .collect();

        for order_id in &stale {
            if let Some(session) = sessions.remove(order_id) {
                tracing::warn!(order_id = %order_id, "checkout abandoned by the browser, dismissing");
                session.handlers.on_dismiss();
            }
        }
        stale.len()
    }

    pub fn spawn_expiry(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            loop {
                tick.tick().await;
                this.expire_stale();
            }
        })
    }
}

#[async_trait::async_trait]
impl CheckoutWidget for HostedCheckout {
    fn name(&self) -> &'static str {
        "hosted"
    }

    async fn load(&self) -> Result<()> {
        let resp = self
            .client
            .get(&self.script_url)
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!("checkout script returned HTTP {}", resp.status().as_u16());
        }
        tracing::info!(url = %self.script_url, "checkout script reachable");
        Ok(())
    }

    fn open(&self, options: CheckoutOptions, handlers: CheckoutHandlers) -> Result<()> {
        let order_id = options.order_id.clone();
        self.sessions.lock().insert(
            order_id.clone(),
            HostedSession {
                options,
                handlers,
                opened_at: Instant::now(),
            },
        );
        tracing::info!(order_id = %order_id, "checkout session published");
        Ok(())
    }
}
