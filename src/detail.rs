//! Detail resolver: one posting by id, plus the values the detail page shows.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::apply::{application_url, ApplyVia};
use crate::client::JobPostClient;
use crate::format::{format_salary_range, long_date, relative_date};
use crate::posting::JobPosting;

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    /// The fetch failed, or succeeded without returning a posting
    NotFound,
    Loaded(Box<JobPosting>),
}

impl DetailState {
    pub fn is_loading(&self) -> bool {
        matches!(self, DetailState::Loading)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DetailState::NotFound)
    }

    pub fn job(&self) -> Option<&JobPosting> {
        match self {
            DetailState::Loaded(job) => Some(job),
            _ => None,
        }
    }
}

impl From<Option<JobPosting>> for DetailState {
    fn from(job: Option<JobPosting>) -> Self {
        match job {
            Some(job) => DetailState::Loaded(Box::new(job)),
            None => DetailState::NotFound,
        }
    }
}

/// A posting together with its presentation values.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobDetailView {
    pub job: JobPosting,
    /// e.g. "₹5,00,000 - ₹8,00,000"
    pub salary: Option<String>,
    /// Long posted date, e.g. "16 October 2026"
    pub posted_on: Option<String>,
    /// Long closing date
    pub closes_on: Option<String>,
    /// "Today", "Tomorrow", "In 3 days", ...
    pub closes_relative: Option<String>,
    /// Application URL with `jobId` set, when the posting has a usable link
    pub apply_url: Option<String>,
    /// User-facing notice when no application URL can be built
    pub apply_notice: Option<String>,
}

impl JobDetailView {
    pub fn build(job: JobPosting, now: DateTime<Utc>) -> Self {
        let (apply_url, apply_notice) = match application_url(&job, ApplyVia::Detail) {
            Ok(url) => (Some(url.to_string()), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            salary: job.salary_range.as_ref().map(format_salary_range),
            posted_on: job.created_at.map(long_date),
            closes_on: job.closing_date.map(long_date),
            closes_relative: job.closing_date.map(|date| relative_date(date, now)),
            apply_url,
            apply_notice,
            job,
        }
    }
}

/// Identifies one detail fetch; stale results are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailTicket(u64);

/// Tracks the posting shown for the current route id.
#[derive(Debug)]
pub struct DetailResolver {
    client: JobPostClient,
    id: Option<String>,
    state: DetailState,
    issued: u64,
    latest: Option<DetailTicket>,
}

impl DetailResolver {
    pub fn new(client: JobPostClient) -> Self {
        Self {
            client,
            id: None,
            state: DetailState::Loading,
            issued: 0,
            latest: None,
        }
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn current_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Starts resolving `id`; `None` if `id` is already the current one.
    pub fn begin(&mut self, id: &str) -> Option<DetailTicket> {
        if self.id.as_deref() == Some(id) {
            debug!("job {} already requested", id);
            return None;
        }
        self.issued += 1;
        let ticket = DetailTicket(self.issued);
        self.latest = Some(ticket);
        self.id = Some(id.to_string());
        self.state = DetailState::Loading;
        Some(ticket)
    }

    pub fn complete(&mut self, ticket: DetailTicket, job: Option<JobPosting>) -> bool {
        if self.latest != Some(ticket) {
            warn!("discarding stale detail response for ticket {:?}", ticket);
            return false;
        }
        self.state = DetailState::from(job);
        true
    }

    pub async fn resolve(&mut self, id: &str) -> &DetailState {
        if let Some(ticket) = self.begin(id) {
            let job = self.client.fetch_post(id).await;
            info!("job {} resolved: found = {}", id, job.is_some());
            self.complete(ticket, job);
        }
        &self.state
    }
}
