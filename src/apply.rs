use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::posting::JobPosting;

/// Where the apply action was triggered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApplyVia {
    /// Detail page: only `jobId` is added
    #[default]
    Detail,
    /// Quick-apply button on a listing card: `jobId` and `jobTitle`
    Card,
}

/// A link the front end should open in a new browsing context.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ApplicationLink {
    /// Fully built application URL
    pub url: String,
    /// Always `_blank`
    pub target: String,
    /// Always `noopener noreferrer`
    pub rel: String,
}

impl ApplicationLink {
    pub fn new_tab(url: Url) -> Self {
        Self {
            url: url.into(),
            target: "_blank".to_string(),
            rel: "noopener noreferrer".to_string(),
        }
    }
}

/// Sets `key` on the query string, replacing earlier values of `key` and
/// keeping every other pair in place.
pub fn set_query_param(url: &mut Url, key: &str, value: &str) {
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(key, value);
}

/// Builds the external application URL for `posting`.
pub fn application_url(posting: &JobPosting, via: ApplyVia) -> Result<Url, AppError> {
    let link = posting
        .application_link
        .as_deref()
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .ok_or_else(|| {
            warn!("No application link for job {}", posting.id);
            AppError::ApplicationLinkMissing(posting.id.clone())
        })?;

    let mut url = Url::parse(link).map_err(|e| {
        warn!("Application link for job {} is invalid ({}): {}", posting.id, e, link);
        AppError::ApplicationLinkInvalid(link.to_string())
    })?;

    set_query_param(&mut url, "jobId", &posting.id);
    if via == ApplyVia::Card {
        set_query_param(&mut url, "jobTitle", &posting.title);
    }

    info!("Application URL for job {}: {}", posting.id, url);
    Ok(url)
}
