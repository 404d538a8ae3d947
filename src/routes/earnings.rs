use axum::{extract::Query, Json};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::earnings::{estimate, Category, EarningsEstimate, EarningsInput};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EarningsQuery {
    /// "ccm-cm" (default) or "doctor"
    #[serde(default)]
    category: Category,
    /// Home visits per week, 1-50 (default 15)
    #[serde(default)]
    visits: Option<u32>,
    /// Subscription clients, 0-30 (default 5)
    #[serde(default)]
    subscriptions: Option<u32>,
    /// Optional city; tiered cities adjust the rates
    #[serde(default)]
    city: Option<String>,
}

/// Estimate monthly earnings from the calculator sliders
#[utoipa::path(
    get,
    path = "/earnings",
    params(EarningsQuery),
    responses(
        (status = 200, description = "Monthly earnings estimate", body = EarningsEstimate)
    )
)]
pub async fn calculate_earnings(Query(query): Query<EarningsQuery>) -> Json<EarningsEstimate> {
    let input = EarningsInput {
        category: query.category,
        weekly_visits: query.visits,
        subscription_clients: query.subscriptions,
        city: query.city,
    };
    Json(estimate(&input))
}
