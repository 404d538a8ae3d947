use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::apply::{application_url, ApplicationLink, ApplyVia};
use crate::detail::{DetailResolver, DetailState, JobDetailView};
use crate::error::AppError;
use crate::format::{format_salary_range, relative_date};
use crate::listings::{JobFilters, ListingStats, ListingsSnapshot, Selection};
use crate::posting::{JobLocation, JobPosting};
use crate::AppState;

/// Number of locations shown on a card before collapsing into "+N more".
const CARD_LOCATIONS: usize = 2;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListingsQuery {
    /// Site tag whose postings are listed (default: configured site)
    #[serde(default)]
    site: Option<String>,
    /// Case-insensitive text matched against title, description and department
    #[serde(default)]
    search: Option<String>,
    /// Job type, or "all"
    #[serde(default, rename = "type")]
    job_type: Option<String>,
    /// City, country or Onsite/Hybrid/Remote, or "all"
    #[serde(default)]
    location: Option<String>,
    /// Department, or "all"
    #[serde(default)]
    department: Option<String>,
    /// Maximum number of cards; 0 shows everything (default: configured value)
    #[serde(default)]
    max_items: Option<usize>,
    /// Fetch the site's postings again even if they are already held
    #[serde(default)]
    refresh: bool,
}

impl ListingsQuery {
    fn filters(&self) -> JobFilters {
        JobFilters {
            search: self.search.clone().unwrap_or_default(),
            job_type: Selection::parse(self.job_type.as_deref()),
            location: Selection::parse(self.location.as_deref()),
            department: Selection::parse(self.department.as_deref()),
        }
    }
}

/// One posting as rendered in the listings grid.
#[derive(Debug, Serialize, ToSchema)]
pub struct JobCard {
    pub id: String,
    pub title: String,
    pub job_type: String,
    pub department: String,
    pub description: String,
    /// First two locations
    pub locations: Vec<JobLocation>,
    /// Locations not shown on the card
    pub more_locations: usize,
    pub salary: Option<String>,
    /// Relative closing date, e.g. "In 2 days"
    pub closes: Option<String>,
    /// Quick-apply URL (with jobId and jobTitle), when the posting has a link
    pub apply_url: Option<String>,
    /// Path of the detail view
    pub detail_path: String,
}

impl JobCard {
    fn from_posting(posting: &JobPosting, now: chrono::DateTime<Utc>) -> Self {
        Self {
            id: posting.id.clone(),
            title: posting.title.clone(),
            job_type: posting.job_type.as_str().to_string(),
            department: posting.department.clone(),
            description: posting.description.clone(),
            locations: posting.locations.iter().take(CARD_LOCATIONS).cloned().collect(),
            more_locations: posting.locations.len().saturating_sub(CARD_LOCATIONS),
            salary: posting.salary_range.as_ref().map(format_salary_range),
            closes: posting.closing_date.map(|date| relative_date(date, now)),
            apply_url: application_url(posting, ApplyVia::Card).ok().map(String::from),
            detail_path: format!("/jobs/{}", posting.id),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListingsResponse {
    /// Site the postings were fetched for
    pub site: String,
    /// Whether any filter is active
    pub filters_active: bool,
    /// Labels of the active filters
    pub active_filters: Vec<String>,
    /// True when nothing survived the filters ("No Jobs Found")
    pub no_jobs: bool,
    /// True when the list was capped at max_items
    pub has_more: bool,
    /// Visible cards, in upstream order
    pub jobs: Vec<JobCard>,
    /// Counts over the full, unfiltered list
    pub stats: ListingStats,
}

/// List job postings for a site, filtered and capped
#[utoipa::path(
    get,
    path = "/jobs",
    params(ListingsQuery),
    responses(
        (status = 200, description = "Filtered postings; an upstream failure yields an empty list", body = ListingsResponse)
    ),
    description = "Fetches all postings for a site once and holds them; requests that only change search, type, location, department or max_items are answered from the held list. Filters apply in that order, then the list is truncated to max_items."
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListingsQuery>,
) -> Json<ListingsResponse> {
    let site = query
        .site
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| state.config.default_site.clone());
    let max_items = match query.max_items.unwrap_or(state.config.default_max_items) {
        0 => None,
        n => Some(n),
    };

    let postings = state.listings.postings_for(&site, query.refresh).await;
    let snapshot = ListingsSnapshot::loading(site, max_items)
        .with_postings(postings)
        .with_filters(query.filters());

    let now = Utc::now();
    let jobs: Vec<JobCard> = snapshot
        .visible()
        .into_iter()
        .map(|posting| JobCard::from_posting(posting, now))
        .collect();

    info!(
        "Listing {} of {} postings for site '{}'",
        jobs.len(),
        snapshot.postings().len(),
        snapshot.site()
    );

    Json(ListingsResponse {
        site: snapshot.site().to_string(),
        filters_active: snapshot.has_active_filters(),
        active_filters: snapshot.filters().active_labels(),
        no_jobs: snapshot.is_empty_state(),
        has_more: snapshot.has_more(),
        jobs,
        stats: snapshot.stats(),
    })
}

async fn resolve_job(state: &AppState, id: &str) -> Result<JobPosting, AppError> {
    let mut resolver = DetailResolver::new(state.jobs.clone());
    match resolver.resolve(id).await {
        DetailState::Loaded(job) => Ok(job.as_ref().clone()),
        DetailState::NotFound | DetailState::Loading => Err(AppError::JobNotFound(id.to_string())),
    }
}

/// Get a single job posting with its display values
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    params(("id" = String, Path, description = "Job posting id")),
    responses(
        (status = 200, description = "Posting found", body = JobDetailView),
        (status = 404, description = "Posting not found or upstream unavailable")
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobDetailView>, AppError> {
    let job = resolve_job(&state, &id).await?;
    Ok(Json(JobDetailView::build(job, Utc::now())))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApplyQuery {
    /// "detail" (default) or "card"; card links also carry jobTitle
    #[serde(default)]
    via: ApplyVia,
}

/// Build the external application link for a posting
#[utoipa::path(
    get,
    path = "/jobs/{id}/apply",
    params(("id" = String, Path, description = "Job posting id"), ApplyQuery),
    responses(
        (status = 200, description = "Link to open in a new tab", body = ApplicationLink),
        (status = 404, description = "Posting not found"),
        (status = 422, description = "Application link not available for this position")
    )
)]
pub async fn apply_to_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ApplyQuery>,
) -> Result<Json<ApplicationLink>, AppError> {
    let job = resolve_job(&state, &id).await?;
    let url = application_url(&job, query.via)?;
    Ok(Json(ApplicationLink::new_tab(url)))
}
