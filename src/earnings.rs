//! Earnings calculator for the two landing-page categories.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::format::format_inr;

pub const VISITS_RANGE: (u32, u32) = (1, 50);
pub const SUBSCRIPTIONS_RANGE: (u32, u32) = (0, 30);
pub const DEFAULT_WEEKLY_VISITS: u32 = 15;
pub const DEFAULT_SUBSCRIPTIONS: u32 = 5;
const WEEKS_PER_MONTH: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum Category {
    /// Community care manager
    #[default]
    #[serde(rename = "ccm-cm")]
    CareManager,
    #[serde(rename = "doctor")]
    Doctor,
}

impl Category {
    /// Rupees earned per home visit.
    pub fn visit_rate(self) -> u32 {
        match self {
            Category::CareManager => 400,
            Category::Doctor => 1150,
        }
    }

    /// Rupees per subscription client per month.
    pub fn subscription_rate(self) -> u32 {
        match self {
            Category::CareManager => 1500,
            Category::Doctor => 4000,
        }
    }
}

#[derive(Debug)]
pub struct CityTier {
    pub tier: &'static str,
    pub visit_rate_multiplier: f64,
    pub subscription_rate_multiplier: f64,
    pub cities: &'static [&'static str],
}

pub static CITY_TIERS: [CityTier; 3] = [
    CityTier {
        tier: "Tier 1",
        visit_rate_multiplier: 1.2,
        subscription_rate_multiplier: 1.3,
        cities: &["Mumbai", "Delhi", "Bengaluru", "Hyderabad", "Chennai", "Pune"],
    },
    CityTier {
        tier: "Tier 2",
        visit_rate_multiplier: 1.0,
        subscription_rate_multiplier: 1.0,
        cities: &["Ahmedabad", "Jaipur", "Surat", "Lucknow", "Chandigarh"],
    },
    CityTier {
        tier: "Tier 3",
        visit_rate_multiplier: 0.8,
        subscription_rate_multiplier: 0.7,
        cities: &["Indore", "Nagpur", "Mysore", "Coimbatore", "Vizag"],
    },
];

/// Case-insensitive lookup of the tier a city belongs to.
pub fn city_tier(city: &str) -> Option<&'static CityTier> {
    let city = city.trim();
    CITY_TIERS
        .iter()
        .find(|tier| tier.cities.iter().any(|c| c.eq_ignore_ascii_case(city)))
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EarningsInput {
    pub category: Category,
    pub weekly_visits: Option<u32>,
    pub subscription_clients: Option<u32>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EarningsEstimate {
    pub category: Category,
    /// Slider value after clamping to 1..=50
    pub weekly_visits: u32,
    pub monthly_visits: u32,
    /// Slider value after clamping to 0..=30
    pub subscription_clients: u32,
    pub visit_rate: u32,
    pub subscription_rate: u32,
    /// Tier applied, when a known city was given
    pub city_tier: Option<String>,
    pub monthly_from_visits: u64,
    pub monthly_from_subscriptions: u64,
    pub total_monthly: u64,
    /// `total_monthly` as en-IN currency
    pub total_monthly_display: String,
}

pub fn estimate(input: &EarningsInput) -> EarningsEstimate {
    let weekly_visits = input
        .weekly_visits
        .unwrap_or(DEFAULT_WEEKLY_VISITS)
        .clamp(VISITS_RANGE.0, VISITS_RANGE.1);
    let subscription_clients = input
        .subscription_clients
        .unwrap_or(DEFAULT_SUBSCRIPTIONS)
        .clamp(SUBSCRIPTIONS_RANGE.0, SUBSCRIPTIONS_RANGE.1);

    let tier = input.city.as_deref().and_then(city_tier);
    let (visit_rate, subscription_rate) = match tier {
        Some(tier) => (
            (input.category.visit_rate() as f64 * tier.visit_rate_multiplier).round() as u32,
            (input.category.subscription_rate() as f64 * tier.subscription_rate_multiplier).round()
                as u32,
        ),
        None => (input.category.visit_rate(), input.category.subscription_rate()),
    };

    let monthly_visits = weekly_visits * WEEKS_PER_MONTH;
    let monthly_from_visits = u64::from(monthly_visits) * u64::from(visit_rate);
    let monthly_from_subscriptions = u64::from(subscription_clients) * u64::from(subscription_rate);
    let total_monthly = monthly_from_visits + monthly_from_subscriptions;

    EarningsEstimate {
        category: input.category,
        weekly_visits,
        monthly_visits,
        subscription_clients,
        visit_rate,
        subscription_rate,
        city_tier: tier.map(|t| t.tier.to_string()),
        monthly_from_visits,
        monthly_from_subscriptions,
        total_monthly,
        total_monthly_display: format_inr(total_monthly as f64),
    }
}
