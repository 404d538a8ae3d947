//! Listings fetch-and-filter pipeline.
//!
//! The full list for a site is fetched once; everything after that is a pure
//! recomputation over an immutable [`ListingsSnapshot`]. The service keeps a
//! single [`SharedListings`] so filter-only requests never reach the network.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use crate::client::JobPostClient;
use crate::posting::JobPosting;

/// A dropdown-style filter value. `"all"` (or nothing) disables the filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") | Some("all") => Selection::All,
            Some(value) => Selection::Only(value.to_string()),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Selection::All => None,
            Selection::Only(value) => Some(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobFilters {
    /// Case-insensitive substring over title, description and department
    pub search: String,
    pub job_type: Selection,
    /// Matches a location's city, country or kind
    pub location: Selection,
    pub department: Selection,
}

impl JobFilters {
    pub fn is_active(&self) -> bool {
        !self.search.is_empty()
            || !self.job_type.is_all()
            || !self.location.is_all()
            || !self.department.is_all()
    }

    /// Labels for the active filters, in the order they are applied.
    pub fn active_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        if !self.search.is_empty() {
            labels.push(format!("Search: \"{}\"", self.search));
        }
        for selection in [&self.job_type, &self.location, &self.department] {
            if let Some(value) = selection.value() {
                labels.push(value.to_string());
            }
        }
        labels
    }
}

fn matches_search(posting: &JobPosting, needle_lower: &str) -> bool {
    posting.title.to_lowercase().contains(needle_lower)
        || posting.description.to_lowercase().contains(needle_lower)
        || posting.department.to_lowercase().contains(needle_lower)
}

/// Applies search, type, location and department in that order, then
/// truncates to `max_items`. Original order is preserved.
pub fn filter_postings<'a>(
    postings: &'a [JobPosting],
    filters: &JobFilters,
    max_items: Option<usize>,
) -> Vec<&'a JobPosting> {
    let mut filtered: Vec<&JobPosting> = postings.iter().collect();

    if !filters.search.is_empty() {
        let needle = filters.search.to_lowercase();
        filtered.retain(|p| matches_search(p, &needle));
    }

    if let Some(job_type) = filters.job_type.value() {
        filtered.retain(|p| p.job_type.as_str() == job_type);
    }

    if let Some(location) = filters.location.value() {
        filtered.retain(|p| p.has_location(location));
    }

    if let Some(department) = filters.department.value() {
        filtered.retain(|p| p.department == department);
    }

    // Truncation must come last so no valid match is dropped early
    if let Some(max) = max_items {
        filtered.truncate(max);
    }

    filtered
}

/// Headline numbers shown under the listings, always over the full list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ListingStats {
    /// Number of postings fetched for the site
    pub open_positions: usize,
    /// Distinct departments
    pub departments: usize,
    /// Distinct cities across all locations
    pub cities: usize,
    /// Postings with at least one remote location
    pub remote_roles: usize,
}

impl ListingStats {
    pub fn from_postings(postings: &[JobPosting]) -> Self {
        let departments: HashSet<&str> = postings.iter().map(|p| p.department.as_str()).collect();
        let cities: HashSet<&str> = postings
            .iter()
            .flat_map(|p| p.locations.iter().map(|loc| loc.city.as_str()))
            .collect();
        Self {
            open_positions: postings.len(),
            departments: departments.len(),
            cities: cities.len(),
            remote_roles: postings.iter().filter(|p| p.is_remote()).count(),
        }
    }
}

/// Immutable view of the listings state. Every input event produces a new one.
#[derive(Debug, Clone)]
pub struct ListingsSnapshot {
    site: String,
    postings: Arc<Vec<JobPosting>>,
    filters: JobFilters,
    max_items: Option<usize>,
    loading: bool,
}

impl ListingsSnapshot {
    /// A snapshot for `site` that is still waiting on its fetch.
    pub fn loading(site: impl Into<String>, max_items: Option<usize>) -> Self {
        Self {
            site: site.into(),
            postings: Arc::new(Vec::new()),
            filters: JobFilters::default(),
            max_items,
            loading: true,
        }
    }

    pub fn with_postings(&self, postings: impl Into<Arc<Vec<JobPosting>>>) -> Self {
        Self {
            postings: postings.into(),
            loading: false,
            ..self.clone()
        }
    }

    pub fn with_filters(&self, filters: JobFilters) -> Self {
        Self {
            filters,
            ..self.clone()
        }
    }

    pub fn with_site(&self, site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            postings: Arc::new(Vec::new()),
            loading: true,
            ..self.clone()
        }
    }

    pub fn cleared(&self) -> Self {
        self.with_filters(JobFilters::default())
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn postings(&self) -> &[JobPosting] {
        &self.postings
    }

    /// The full list, shared rather than copied.
    pub fn shared_postings(&self) -> Arc<Vec<JobPosting>> {
        Arc::clone(&self.postings)
    }

    pub fn filters(&self) -> &JobFilters {
        &self.filters
    }

    pub fn max_items(&self) -> Option<usize> {
        self.max_items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_active_filters(&self) -> bool {
        self.filters.is_active()
    }

    pub fn visible(&self) -> Vec<&JobPosting> {
        filter_postings(&self.postings, &self.filters, self.max_items)
    }

    /// The "no jobs found" state: loaded, and nothing survives the filters.
    pub fn is_empty_state(&self) -> bool {
        !self.loading && self.visible().is_empty()
    }

    /// Whether the visible list was capped, so a "view all" link makes sense.
    pub fn has_more(&self) -> bool {
        match self.max_items {
            Some(max) => max > 0 && self.visible().len() >= max,
            None => false,
        }
    }

    pub fn stats(&self) -> ListingStats {
        ListingStats::from_postings(&self.postings)
    }
}

/// Identifies one fetch; only the most recently issued ticket may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Owns a listings snapshot and decides when the network is touched.
///
/// A fetch is issued when the site changes (or on first load); filter
/// changes never fetch.
#[derive(Debug)]
pub struct ListingsSession {
    client: JobPostClient,
    snapshot: ListingsSnapshot,
    fetched_site: Option<String>,
    issued: u64,
    latest: Option<FetchTicket>,
}

impl ListingsSession {
    pub fn new(client: JobPostClient, site: impl Into<String>, max_items: Option<usize>) -> Self {
        Self {
            client,
            snapshot: ListingsSnapshot::loading(site, max_items),
            fetched_site: None,
            issued: 0,
            latest: None,
        }
    }

    pub fn snapshot(&self) -> &ListingsSnapshot {
        &self.snapshot
    }

    pub fn client(&self) -> &JobPostClient {
        &self.client
    }

    /// Starts a fetch for `site` unless that site is already the current one.
    pub fn begin_fetch(&mut self, site: &str) -> Option<FetchTicket> {
        if self.fetched_site.as_deref() == Some(site) {
            debug!("site '{}' already requested; not fetching again", site);
            return None;
        }
        self.issued += 1;
        let ticket = FetchTicket(self.issued);
        self.latest = Some(ticket);
        self.fetched_site = Some(site.to_string());
        self.snapshot = self.snapshot.with_site(site);
        Some(ticket)
    }

    /// Applies a fetch result. Returns false (and drops the result) when a
    /// newer fetch has been issued since `ticket`.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        postings: impl Into<Arc<Vec<JobPosting>>>,
    ) -> bool {
        let postings = postings.into();
        if self.latest != Some(ticket) {
            warn!(
                "discarding stale listings response ({} postings) for ticket {:?}",
                postings.len(),
                ticket
            );
            return false;
        }
        self.snapshot = self.snapshot.with_postings(postings);
        true
    }

    /// Records a failed fetch: the site shows an empty list, and the next
    /// request for it fetches again.
    pub fn fail_fetch(&mut self, ticket: FetchTicket) -> bool {
        if self.latest != Some(ticket) {
            debug!("ignoring failure of stale ticket {:?}", ticket);
            return false;
        }
        self.fetched_site = None;
        self.snapshot = self.snapshot.with_postings(Vec::<JobPosting>::new());
        true
    }

    /// Forgets which site was fetched, so the next load goes to the network.
    pub fn invalidate(&mut self) {
        self.fetched_site = None;
    }

    /// Loads the snapshot's current site if it has not been fetched yet.
    pub async fn load(&mut self) -> &ListingsSnapshot {
        let site = self.snapshot.site().to_string();
        self.select_site(&site).await
    }

    pub async fn select_site(&mut self, site: &str) -> &ListingsSnapshot {
        if let Some(ticket) = self.begin_fetch(site) {
            match self.client.try_fetch_posts(site).await {
                Ok(postings) => {
                    info!("site '{}' loaded with {} postings", site, postings.len());
                    self.complete_fetch(ticket, postings);
                }
                Err(e) => {
                    error!("Error fetching jobs for site '{}': {}", site, e);
                    self.fail_fetch(ticket);
                }
            }
        }
        &self.snapshot
    }

    pub fn set_filters(&mut self, filters: JobFilters) -> &ListingsSnapshot {
        self.snapshot = self.snapshot.with_filters(filters);
        &self.snapshot
    }

    pub fn clear_filters(&mut self) -> &ListingsSnapshot {
        self.snapshot = self.snapshot.cleared();
        &self.snapshot
    }
}

/// One [`ListingsSession`] shared by every request the service handles.
///
/// The lock is never held across a network call: the ticket is taken under
/// the lock, the fetch runs unlocked, and the result lands only if no other
/// request switched site in the meantime.
#[derive(Debug, Clone)]
pub struct SharedListings {
    client: JobPostClient,
    session: Arc<Mutex<ListingsSession>>,
}

impl SharedListings {
    pub fn new(client: JobPostClient, site: impl Into<String>, max_items: Option<usize>) -> Self {
        let session = ListingsSession::new(client.clone(), site, max_items);
        Self {
            client,
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Copy of the current session snapshot.
    pub async fn snapshot(&self) -> ListingsSnapshot {
        self.session.lock().await.snapshot().clone()
    }

    /// Full posting list for `site`. The network is only touched when `site`
    /// differs from the last one loaded, the last fetch failed, or `refresh`
    /// is set.
    pub async fn postings_for(&self, site: &str, refresh: bool) -> Arc<Vec<JobPosting>> {
        let ticket = {
            let mut session = self.session.lock().await;
            if refresh {
                session.invalidate();
            }
            match session.begin_fetch(site) {
                Some(ticket) => ticket,
                None if !session.snapshot().is_loading() => {
                    return session.snapshot().shared_postings();
                }
                None => {
                    // Another request is fetching this site; answer with our own copy
                    drop(session);
                    debug!("site '{}' fetch already in flight; fetching alongside", site);
                    return Arc::new(self.client.fetch_posts(site).await);
                }
            }
        };

        let result = self.client.try_fetch_posts(site).await;

        let mut session = self.session.lock().await;
        match result {
            Ok(postings) => {
                info!("site '{}' loaded with {} postings", site, postings.len());
                let postings = Arc::new(postings);
                session.complete_fetch(ticket, Arc::clone(&postings));
                postings
            }
            Err(e) => {
                error!("Error fetching jobs for site '{}': {}", site, e);
                session.fail_fetch(ticket);
                Arc::new(Vec::new())
            }
        }
    }
}
