//! services/app/src/adapters/email.rs
//!
//! This module contains the adapter for verification-code delivery via the
//! EmailJS REST API. It implements the `EmailDeliveryService` port from the
//! `core` crate. When the EmailJS credentials are absent it runs in
//! simulation mode: the code is logged instead of sent and delivery is
//! reported as successful, keeping onboarding fully usable without live keys.

use crate::config::EmailJsConfig;
use async_trait::async_trait;
use serde::Serialize;
use studyspark_core::ports::{EmailDeliveryService, PortError, PortResult};
use tracing::{info, warn};

const EMAILJS_SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

//=========================================================================================
// Request Shape
//=========================================================================================

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams<'a>,
}

/// Field names match the placeholders in the EmailJS template.
#[derive(Serialize)]
struct TemplateParams<'a> {
    email: &'a str,
    user_name: &'a str,
    otp_code: &'a str,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct EmailJsAdapter {
    http: reqwest::Client,
    config: Option<EmailJsConfig>,
}

impl EmailJsAdapter {
    /// Creates a new `EmailJsAdapter`. Pass `None` for simulation mode.
    pub fn new(http: reqwest::Client, config: Option<EmailJsConfig>) -> Self {
        if config.is_none() {
            warn!("EmailJS keys missing; verification emails will be simulated");
        }
        Self { http, config }
    }
}

//=========================================================================================
// `EmailDeliveryService` Trait Implementation
//=========================================================================================

#[async_trait]
impl EmailDeliveryService for EmailJsAdapter {
    async fn send_code(&self, recipient: &str, display_name: &str, code: &str) -> PortResult<()> {
        let Some(config) = &self.config else {
            info!(recipient, code, "[SIMULATION] verification code");
            return Ok(());
        };

        let request = SendRequest {
            service_id: &config.service_id,
            template_id: &config.template_id,
            user_id: &config.public_key,
            template_params: TemplateParams {
                email: recipient,
                user_name: display_name,
                otp_code: code,
            },
        };

        let response = self
            .http
            .post(EMAILJS_SEND_URL)
            .json(&request)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "EmailJS returned {status}: {detail}"
            )));
        }

        info!(recipient, "verification email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_config_simulates_successful_delivery() {
        let adapter = EmailJsAdapter::new(reqwest::Client::new(), None);
        adapter
            .send_code("ada@school.edu", "Ada Lovelace", "424242")
            .await
            .unwrap();
    }

    #[test]
    fn request_body_uses_template_parameter_names() {
        let request = SendRequest {
            service_id: "svc",
            template_id: "tpl",
            user_id: "key",
            template_params: TemplateParams {
                email: "ada@school.edu",
                user_name: "Ada",
                otp_code: "424242",
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["template_params"]["otp_code"], "424242");
        assert_eq!(json["template_params"]["user_name"], "Ada");
        assert_eq!(json["user_id"], "key");
    }
}
