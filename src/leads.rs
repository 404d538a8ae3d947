//! Lead capture: validate the sign-up form and relay it to Web3Forms.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};
use url::Url;
use utoipa::ToSchema;

use crate::coerce::lenient_text;
use crate::error::AppError;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

pub const CONFIRMATION_MESSAGE: &str =
    "Thank you for applying. Our team will contact you within 24 hours.";

/// The care-manager sign-up form. Every field except `employment_status` is required.
///
/// Null or numeric values (a phone sent as a number) are read as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadForm {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub current_role: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub experience: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub employment_status: String,
}

impl LeadForm {
    /// Names of required fields that are blank, in form order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let required = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("email", &self.email),
            ("currentRole", &self.current_role),
            ("experience", &self.experience),
            ("city", &self.city),
        ];
        required
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }

    /// Checks the form before anything is sent.
    pub fn validate(&self) -> Result<(), AppError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::MissingFields(missing));
        }
        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err(AppError::InvalidRequest(format!(
                "'{}' is not a valid email address",
                self.email.trim()
            )));
        }
        Ok(())
    }

    /// Form fields as sent to the relay, `access_key` first.
    pub fn to_relay_fields<'a>(&'a self, access_key: &'a str) -> Vec<(&'static str, &'a str)> {
        vec![
            ("access_key", access_key),
            ("name", self.name.trim()),
            ("phone", self.phone.trim()),
            ("email", self.email.trim()),
            ("currentRole", self.current_role.trim()),
            ("experience", self.experience.trim()),
            ("city", self.city.trim()),
            ("employmentStatus", self.employment_status.trim()),
        ]
    }
}

/// Result of a successful submission: a confirmation and the reset form.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeadReceipt {
    pub success: bool,
    pub message: String,
    /// Empty form to render after success
    pub form: LeadForm,
}

/// Client for the third-party form relay.
#[derive(Debug, Clone)]
pub struct LeadRelay {
    http: Client,
    endpoint: Url,
    access_key: Option<String>,
}

impl LeadRelay {
    pub fn new(endpoint: Url, access_key: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, endpoint, access_key))
    }

    pub fn with_client(http: Client, endpoint: Url, access_key: Option<String>) -> Self {
        Self {
            http,
            endpoint,
            access_key,
        }
    }

    /// Validates and submits `form` once. No retries.
    pub async fn submit(&self, form: &LeadForm) -> Result<LeadReceipt, AppError> {
        form.validate()?;

        let access_key = self.access_key.as_deref().ok_or_else(|| {
            error!("Lead submission attempted without WEB3FORMS_ACCESS_KEY");
            AppError::ConfigError("form relay access key is not configured".to_string())
        })?;

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form.to_relay_fields(access_key))
            .send()
            .await
            .map_err(|e| {
                error!("Lead relay unreachable: {}", e);
                AppError::SubmissionFailed(e.to_string())
            })?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            error!("Lead relay returned unreadable body (status {}): {}", status, e);
            AppError::SubmissionFailed(e.to_string())
        })?;

        let accepted = body.get("success").and_then(Value::as_bool).unwrap_or(false);
        if !accepted {
            let reason = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no reason given")
                .to_string();
            warn!("Lead relay rejected submission (status {}): {}", status, reason);
            return Err(AppError::SubmissionRejected(reason));
        }

        info!("Lead captured for city '{}'", form.city.trim());
        Ok(LeadReceipt {
            success: true,
            message: CONFIRMATION_MESSAGE.to_string(),
            form: LeadForm::default(),
        })
    }
}
