use crate::backend::SocietyBackend;
use crate::domain::due::DuePayment;
use crate::domain::payment::{PaymentOrder, VerificationResponse};
use anyhow::{bail, Result};
use serde::de::DeserializeOwned;

pub struct HttpBackend {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, api_token: Option<String>, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            timeout_ms,
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .timeout(std::time::Duration::from_millis(self.timeout_ms));
        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .or_else(|| v.pointer("/error/message"))
                    .and_then(|m| m.as_str())
                    .map(ToString::to_string)
            })
            .unwrap_or_else(|| body.chars().take(200).collect());
        bail!("HTTP_{}: {}", status.as_u16(), message)
    }
}

#[async_trait::async_trait]
impl SocietyBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn get_next_due(&self) -> Result<DuePayment> {
        self.send(self.request(reqwest::Method::GET, "/payments/rent/next-due"))
            .await
    }

    async fn create_order(&self, payment_id: &str) -> Result<PaymentOrder> {
        let path = format!("/payments/rent/{}/order", payment_id);
        self.send(
            self.request(reqwest::Method::POST, &path)
                .json(&serde_json::json!({ "paymentId": payment_id })),
        )
        .await
    }

    async fn verify_payment(&self, payment_id: &str) -> Result<VerificationResponse> {
        let path = format!("/payments/rent/{}/verify", payment_id);
        self.send(
            self.request(reqwest::Method::POST, &path)
                .json(&serde_json::json!({ "paymentId": payment_id })),
        )
        .await
    }
}
