use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::AppError;
use crate::posting::{coerce_posting_list, coerce_single_posting, JobPosting};

/// HTTP client for the upstream job-post API.
#[derive(Debug, Clone)]
pub struct JobPostClient {
    http: Client,
    base_url: Url,
}

impl JobPostClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, AppError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, mut base_url: Url) -> Self {
        // join() drops the last segment unless the base ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET {base}/api/jobpost/getposts/?site={site}`
    pub fn posts_url(&self, site: &str) -> Result<Url, AppError> {
        let mut url = self.base_url.join("api/jobpost/getposts/")?;
        url.query_pairs_mut().append_pair("site", site);
        Ok(url)
    }

    /// `GET {base}/api/jobpost/getpostid/{id}`
    pub fn post_url(&self, id: &str) -> Result<Url, AppError> {
        let mut url = self.base_url.join("api/jobpost/getpostid/")?;
        url.path_segments_mut()
            .map_err(|_| AppError::ConfigError(format!("base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    /// Fetches every posting published under `site`.
    ///
    /// Transport failures, non-success statuses and bodies that are not JSON
    /// are errors. JSON of the wrong shape is not; it coerces to an empty list.
    pub async fn try_fetch_posts(&self, site: &str) -> Result<Vec<JobPosting>, AppError> {
        let url = self.posts_url(site)?;
        info!("Fetching job postings from: {}", url);

        let response = self.http.get(url.clone()).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::UpstreamError(format!(
                "job-post API returned status {} for {}",
                status, url
            )));
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)?;
        let postings = coerce_posting_list(&body);
        info!("Fetched {} job postings for site '{}'", postings.len(), site);
        Ok(postings)
    }

    /// Like [`try_fetch_posts`](Self::try_fetch_posts) but degrades any failure
    /// to an empty list after logging it.
    pub async fn fetch_posts(&self, site: &str) -> Vec<JobPosting> {
        match self.try_fetch_posts(site).await {
            Ok(postings) => postings,
            Err(e) => {
                error!("Error fetching jobs for site '{}': {}", site, e);
                Vec::new()
            }
        }
    }

    /// Fetches a single posting. `Ok(None)` means the API answered but
    /// returned nothing that looks like a posting.
    pub async fn try_fetch_post(&self, id: &str) -> Result<Option<JobPosting>, AppError> {
        let url = self.post_url(id)?;
        debug!("Fetching job detail from: {}", url);

        let response = self.http.get(url.clone()).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            warn!("job-post API returned status {} for {}", status, url);
            return Err(AppError::UpstreamError(format!(
                "job-post API returned status {} for {}",
                status, url
            )));
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)?;
        Ok(coerce_single_posting(&body))
    }

    /// Collapses every failure mode into "not found", logging the cause.
    pub async fn fetch_post(&self, id: &str) -> Option<JobPosting> {
        match self.try_fetch_post(id).await {
            Ok(posting) => posting,
            Err(e) => {
                error!("Error fetching job details for '{}': {}", id, e);
                None
            }
        }
    }
}
