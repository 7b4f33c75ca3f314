use crate::gateways::{CheckoutHandlers, CheckoutOptions, CheckoutWidget};
use anyhow::{bail, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum CheckoutScript {
    Succeed(String),
    Fail(String),
    Error(String),
    Dismiss,
    FireAll(String),
    Vanish,
    Hold,
}

pub struct ScriptedCheckout {
    pub script: Mutex<CheckoutScript>,
    pub load_failure: Mutex<Option<String>>,
    pub open_failure: Mutex<Option<String>>,
    pub load_latency: Duration,
    pub loads: AtomicU32,
    pub opens: AtomicU32,
    pub last_options: Mutex<Option<CheckoutOptions>>,
    pub held: Mutex<Option<CheckoutHandlers>>,
}

impl ScriptedCheckout {
    pub fn new(script: CheckoutScript) -> Self {
        Self {
            script: Mutex::new(script),
            load_failure: Mutex::new(None),
            open_failure: Mutex::new(None),
            load_latency: Duration::ZERO,
            loads: AtomicU32::new(0),
            opens: AtomicU32::new(0),
            last_options: Mutex::new(None),
            held: Mutex::new(None),
        }
    }

    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }

    pub fn set_script(&self, script: CheckoutScript) {
        *self.script.lock() = script;
    }

    pub fn load_count(&self) -> u32 {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn open_count(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn held_handlers(&self) -> Option<CheckoutHandlers> {
        self.held.lock().clone()
    }
}

#[async_trait::async_trait]
impl CheckoutWidget for ScriptedCheckout {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn load(&self) -> Result<()> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.load_latency.is_zero() {
            tokio::time::sleep(self.load_latency).await;
        }
        let failure = self.load_failure.lock().clone();
        if let Some(message) = failure {
            bail!(message);
        }
        Ok(())
    }

    fn open(&self, options: CheckoutOptions, handlers: CheckoutHandlers) -> Result<()> {
        if let Some(message) = self.open_failure.lock().clone() {
            bail!(message);
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock() = Some(options);

        let script = self.script.lock().clone();
        match script {
            CheckoutScript::Succeed(reference) => {
                handlers.on_success(&reference);
            }
            CheckoutScript::Fail(reason) => {
                handlers.on_failed(&reason);
            }
            CheckoutScript::Error(reason) => {
                handlers.on_error(&reason);
            }
            CheckoutScript::Dismiss => {
                handlers.on_dismiss();
            }
            CheckoutScript::FireAll(reference) => {
                handlers.on_success(&reference);
                handlers.on_failed("late failure");
                handlers.on_dismiss();
            }
            CheckoutScript::Vanish => drop(handlers),
            CheckoutScript::Hold => *self.held.lock() = Some(handlers),
        }
        Ok(())
    }
}
