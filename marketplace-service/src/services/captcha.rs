use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use crate::config::RecaptchaConfig;

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// A missing token never verifies.
    async fn verify(&self, token: Option<&str>) -> bool;
}

/// Google reCAPTCHA v2 `siteverify` client.
pub struct RecaptchaVerifier {
    client: reqwest::Client,
    secret_key: Secret<String>,
    verify_url: String,
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

impl RecaptchaVerifier {
    pub fn new(config: &RecaptchaConfig) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build reCAPTCHA client: {}", e))?;

        Ok(Self {
            client,
            secret_key: config.secret_key.clone(),
            verify_url: config.verify_url.clone(),
        })
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    async fn verify(&self, token: Option<&str>) -> bool {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return false;
        };

        let response = self
            .client
            .post(&self.verify_url)
            .form(&[
                ("secret", self.secret_key.expose_secret().as_str()),
                ("response", token),
            ])
            .send()
            .await;

        let body = match response {
            Ok(res) => res.json::<SiteVerifyResponse>().await,
            Err(e) => {
                tracing::error!(error = %e, "CAPTCHA verification request failed");
                return false;
            }
        };

        match body {
            Ok(result) => {
                if !result.success {
                    tracing::warn!(error_codes = ?result.error_codes, "CAPTCHA rejected");
                }
                result.success
            }
            Err(e) => {
                tracing::error!(error = %e, "CAPTCHA verification response unreadable");
                false
            }
        }
    }
}

/// Offline verifier for local development and tests. With an expected token
/// only that token passes; otherwise any non-empty token passes.
#[derive(Debug, Clone, Default)]
pub struct StaticCaptchaVerifier {
    expected: Option<String>,
}

impl StaticCaptchaVerifier {
    pub fn allow_any() -> Self {
        Self { expected: None }
    }

    pub fn expecting(token: impl Into<String>) -> Self {
        Self {
            expected: Some(token.into()),
        }
    }
}

#[async_trait]
impl CaptchaVerifier for StaticCaptchaVerifier {
    async fn verify(&self, token: Option<&str>) -> bool {
        match (token.filter(|t| !t.is_empty()), &self.expected) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(token), Some(expected)) => token == expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_token_never_verifies() {
        assert!(!StaticCaptchaVerifier::allow_any().verify(None).await);
        assert!(!StaticCaptchaVerifier::allow_any().verify(Some("")).await);
    }

    #[tokio::test]
    async fn expected_token_must_match() {
        let verifier = StaticCaptchaVerifier::expecting("ok-token");
        assert!(verifier.verify(Some("ok-token")).await);
        assert!(!verifier.verify(Some("forged")).await);
    }

    #[tokio::test]
    async fn recaptcha_without_token_skips_network() {
        let verifier = RecaptchaVerifier::new(&RecaptchaConfig {
            secret_key: Secret::new("unused".to_string()),
            verify_url: "http://127.0.0.1:9/siteverify".to_string(),
            enabled: true,
        })
        .unwrap();
        assert!(!verifier.verify(None).await);
    }
}
