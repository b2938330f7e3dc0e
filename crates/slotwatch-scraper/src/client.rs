//! Two-stage HTTP choreography against the appointment site.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use slotwatch_core::{Office, WatchSettings};

use crate::challenge::run_challenge;
use crate::error::ScraperError;

const DRIVE_TEST_PATH: &str = "/wasapp/foa/findDriveTest.do";
const OFFICE_VISIT_PATH: &str = "/wasapp/foa/findOfficeVisit.do";

/// HTTP client for the appointment site's gated results flow.
///
/// Each fetch is a fixed choreography: a form POST to the site root that
/// returns an interstitial challenge page, script execution to recover the
/// hidden form (see [`crate::challenge`]), then a second POST of the recovered
/// fields to the mode-specific results path.
///
/// No internal retry and no total request deadline — retries belong to the
/// poll scheduler, and the transport's own connection behavior is the only
/// timeout (a connect timeout is configured, nothing more).
pub struct AppointmentClient {
    client: Client,
    base_url: String,
}

impl AppointmentClient {
    /// Creates a client for the given site origin.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        user_agent: &str,
        connect_timeout_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Runs the full three-stage exchange for one office and returns the raw
    /// HTML of the results page.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Http`] — transport failure during either POST.
    /// - [`ScraperError::UnexpectedStatus`] — non-2xx response from the site.
    /// - [`ScraperError::Challenge`] — the interstitial page could not be
    ///   resolved; fatal for this office's turn, not retried mid-pipeline.
    pub async fn fetch_appointment_page(
        &self,
        office: &Office,
        settings: &WatchSettings,
    ) -> Result<String, ScraperError> {
        let interstitial = self.initial_request(office, settings).await?;
        let fields = run_challenge(&interstitial)?;
        self.results_request(&fields, settings.drive_test).await
    }

    /// Stage 1: POST the base form fields (with per-office overrides) to the
    /// site root; the response is the interstitial challenge page.
    async fn initial_request(
        &self,
        office: &Office,
        settings: &WatchSettings,
    ) -> Result<String, ScraperError> {
        let mut form: BTreeMap<String, String> = settings.form_fields.clone();
        form.insert("officeId".to_string(), office.id.clone());
        form.insert("numberItems".to_string(), "1".to_string());
        if settings.drive_test {
            form.insert("requestedTask".to_string(), "DT".to_string());
        } else {
            form.insert("taskRWT".to_string(), "true".to_string());
        }

        let url = format!("{}/", self.base_url);
        self.post_form(&url, &form, settings.drive_test).await
    }

    /// Stage 3: POST the recovered challenge fields to the mode path.
    async fn results_request(
        &self,
        fields: &[(String, String)],
        drive_test: bool,
    ) -> Result<String, ScraperError> {
        let url = format!("{}{}", self.base_url, Self::result_path(drive_test));
        self.post_form(&url, fields, drive_test).await
    }

    async fn post_form<T: Serialize + ?Sized>(
        &self,
        url: &str,
        form: &T,
        drive_test: bool,
    ) -> Result<String, ScraperError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::REFERER, self.referer(drive_test))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }

    fn result_path(drive_test: bool) -> &'static str {
        if drive_test {
            DRIVE_TEST_PATH
        } else {
            OFFICE_VISIT_PATH
        }
    }

    fn referer(&self, drive_test: bool) -> String {
        format!("{}{}", self.base_url, Self::result_path(drive_test))
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
