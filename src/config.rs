use crate::reconcile::policy::VerificationPolicy;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendMode {
    Http,
    Mock,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub backend_base_url: String,
    pub backend_api_token: Option<String>,
    pub backend_mode: BackendMode,
    pub gateway_key_id: Option<String>,
    pub checkout_script_url: String,
    pub gateway_timeout_ms: u64,
    pub checkout_session_ttl_ms: u64,
    pub verify_settle_delay_ms: u64,
    pub verify_retry_delay_ms: u64,
    pub verify_max_retries: u32,
    pub presumed_refresh_delay_ms: u64,
    pub catch_up_refresh_delay_ms: u64,
    pub merchant_name: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            backend_base_url: std::env::var("BACKEND_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080/api".to_string()),
            backend_api_token: std::env::var("BACKEND_API_TOKEN").ok().filter(|t| !t.is_empty()),
            backend_mode: match std::env::var("BACKEND_MODE").as_deref() {
                Ok("mock") | Ok("MOCK") => BackendMode::Mock,
                _ => BackendMode::Http,
            },
            gateway_key_id: std::env::var("RAZORPAY_KEY_ID").ok().filter(|k| !k.is_empty()),
            checkout_script_url: std::env::var("CHECKOUT_SCRIPT_URL")
                .unwrap_or_else(|_| "https://checkout.razorpay.com/v1/checkout.js".to_string()),
            gateway_timeout_ms: env_u64("GATEWAY_TIMEOUT_MS", 2500),
            checkout_session_ttl_ms: env_u64("CHECKOUT_SESSION_TTL_MS", 900_000),
            verify_settle_delay_ms: env_u64("VERIFY_SETTLE_DELAY_MS", 2000),
            verify_retry_delay_ms: env_u64("VERIFY_RETRY_DELAY_MS", 2000),
            verify_max_retries: std::env::var("VERIFY_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(3),
            presumed_refresh_delay_ms: env_u64("PRESUMED_REFRESH_DELAY_MS", 5000),
            catch_up_refresh_delay_ms: env_u64("CATCH_UP_REFRESH_DELAY_MS", 15000),
            merchant_name: std::env::var("MERCHANT_NAME")
                .unwrap_or_else(|_| "Society Maintenance".to_string()),
        }
    }

    pub fn verification_policy(&self) -> VerificationPolicy {
        VerificationPolicy {
            max_retries: self.verify_max_retries.max(1),
            settle_delay: Duration::from_millis(self.verify_settle_delay_ms),
            retry_delay: Duration::from_millis(self.verify_retry_delay_ms),
            presumed_refresh_delay: Duration::from_millis(self.presumed_refresh_delay_ms),
            catch_up_refresh_delay: Duration::from_millis(self.catch_up_refresh_delay_ms),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default)
}
