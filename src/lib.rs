use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
// Conditionally import SwaggerUi only when needed (not test)
#[cfg(not(test))]
use utoipa_swagger_ui::SwaggerUi;
// Conditionally import CORS only when needed (not test)
#[cfg(not(test))]
use tower_http::cors::{Any, CorsLayer};
use std::sync::Arc;
use std::time::Duration;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use utoipa::OpenApi;

pub mod apply;
pub mod client;
mod coerce;
pub mod config;
pub mod detail;
pub mod earnings;
pub mod error;
pub mod format;
pub mod leads;
pub mod listings;
pub mod posting;
pub mod routes;

use crate::client::JobPostClient;
use crate::config::Config;
use crate::error::AppError;
use crate::leads::LeadRelay;
use crate::listings::SharedListings;
use crate::routes::*;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jobs: JobPostClient,
    /// Listings for the most recently requested site, shared by all requests
    pub listings: SharedListings,
    pub leads: LeadRelay,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let jobs = JobPostClient::new(config.jobs_api_base_url.clone(), config.http_timeout)?;
        let leads = LeadRelay::new(
            config.web3forms_endpoint.clone(),
            config.web3forms_access_key.clone(),
            config.http_timeout,
        )?;
        let listings = SharedListings::new(
            jobs.clone(),
            config.default_site.clone(),
            Some(config.default_max_items),
        );
        Ok(Self {
            config: Arc::new(config),
            jobs,
            listings,
            leads,
        })
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    )
)]
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Service is healthy")
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CAREERDESK API",
        version = "0.1.0",
        description = "Job listings, lead capture and earnings calculator for the care-professional landing page"
    ),
    paths(
        health_check,
        routes::jobs::list_jobs,
        routes::jobs::get_job,
        routes::jobs::apply_to_job,
        routes::leads::submit_lead,
        routes::earnings::calculate_earnings
    ),
    components(schemas(
        posting::JobPosting,
        posting::JobLocation,
        posting::SalaryRange,
        listings::ListingStats,
        routes::jobs::JobCard,
        routes::jobs::ListingsResponse,
        detail::JobDetailView,
        apply::ApplicationLink,
        apply::ApplyVia,
        leads::LeadForm,
        leads::LeadReceipt,
        earnings::Category,
        earnings::EarningsEstimate
    ))
)]
struct ApiDoc;

/// Create the application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // Build our API documentation (needed regardless for ApiDoc::openapi())
    let api_doc = ApiDoc::openapi();

    // --- Lead relay routes, rate limited per client IP when configured ---
    let mut lead_routes: Router<AppState> = Router::new().route("/leads", post(submit_lead));
    if let Some(per_minute) = state.config.rate_limit_per_minute.filter(|n| *n > 0) {
        let governor_conf = GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .period(Duration::from_secs(60) / per_minute)
            .burst_size(per_minute)
            .finish();
        match governor_conf {
            Some(conf) => {
                lead_routes = lead_routes.layer(GovernorLayer {
                    config: Arc::new(conf),
                });
            }
            None => tracing::warn!("invalid rate limit ({} per minute); lead relay not limited", per_minute),
        }
    }

    // --- Define API routes separately ---
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/jobs", get(list_jobs))
        .route("/jobs/{id}", get(get_job))
        .route("/jobs/{id}/apply", get(apply_to_job))
        .route("/earnings", get(calculate_earnings))
        .merge(lead_routes)
        .with_state(state);

    // --- Swagger UI only when NOT running tests ---
    #[cfg(not(test))]
    let docs_router: Router = SwaggerUi::new("/docs").url("/api-doc/openapi.json", api_doc).into();

    #[cfg(test)]
    let docs_router: Router = {
        let _ = api_doc;
        Router::new()
    };

    #[allow(unused_mut)]
    let mut app = Router::new().merge(api_routes).merge(docs_router);

    // --- Apply CORS to the whole app (both API and docs) ---
    #[cfg(not(test))]
    {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app
}
