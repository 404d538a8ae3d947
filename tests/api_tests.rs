mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use careerdesk::config::Config;
use careerdesk::{create_app, AppState};
use common::{closed_port_url, setup, spawn_upstream, test_config, Upstream};
use http_body_util::BodyExt; // For Response body handling
use serde_json::{json, Value};
use tower::ServiceExt; // For oneshot

async fn app() -> (Router, Upstream) {
    setup();
    let (base, upstream) = spawn_upstream().await;
    let state = AppState::from_config(test_config(&base)).unwrap();
    (create_app(state), upstream)
}

fn app_with(config: Config) -> Router {
    create_app(AppState::from_config(config).unwrap())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
    (status, body)
}

fn lead_body() -> Value {
    json!({
        "name": "Asha",
        "phone": "9876543210",
        "email": "asha@example.com",
        "currentRole": "Staff Nurse",
        "experience": "3-5 years",
        "city": "Chennai",
        "employmentStatus": "Employed"
    })
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = app().await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_listings_default_view() {
    let (app, upstream) = app().await;
    let (status, json) = get(app, "/jobs").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["site"], "telthcare");
    assert_eq!(json["jobs"].as_array().unwrap().len(), 6);
    assert_eq!(json["has_more"], true);
    assert_eq!(json["no_jobs"], false);
    assert_eq!(json["filters_active"], false);
    assert_eq!(json["stats"]["open_positions"], 8);
    assert_eq!(json["stats"]["remote_roles"], 2);
    assert_eq!(upstream.list_hits(), 1);

    let first = &json["jobs"][0];
    assert_eq!(first["id"], "job-1");
    assert_eq!(first["salary"], "₹5,00,000 - ₹8,00,000");
    assert_eq!(first["detail_path"], "/jobs/job-1");
    assert_eq!(
        first["apply_url"],
        "https://careers.example.com/apply?ref=site&jobId=job-1&jobTitle=Staff+Nurse"
    );

    let second = &json["jobs"][1];
    assert_eq!(second["locations"].as_array().unwrap().len(), 2);
    assert_eq!(second["more_locations"], 1);
    assert!(second["apply_url"].is_null());
}

#[tokio::test]
async fn test_listings_with_filters() {
    let (app, upstream) = app().await;
    let (status, json) =
        get(app, "/jobs?search=NURSE&type=Full-time&location=Chennai&department=all").await;

    assert_eq!(status, StatusCode::OK);
    let jobs = json["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["id"], "job-1");
    assert_eq!(json["filters_active"], true);
    assert_eq!(
        json["active_filters"],
        json!(["Search: \"NURSE\"", "Full-time", "Chennai"])
    );
    // Stats describe the full list, not the filtered one
    assert_eq!(json["stats"]["open_positions"], 8);
    assert_eq!(upstream.list_hits(), 1);
}

#[tokio::test]
async fn test_listings_max_items() {
    let (app, _) = app().await;
    let (_, json) = get(app.clone(), "/jobs?max_items=0").await;
    assert_eq!(json["jobs"].as_array().unwrap().len(), 8);
    assert_eq!(json["has_more"], false);

    let (_, json) = get(app, "/jobs?max_items=2&department=Nursing").await;
    let ids: Vec<&str> = json["jobs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["job-1", "job-6"]);
}

#[tokio::test]
async fn test_listings_no_jobs_state() {
    let (app, _) = app().await;
    let (status, json) = get(app, "/jobs?search=astronaut").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["no_jobs"], true);
    assert!(json["jobs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_listings_upstream_failures_render_empty() {
    let (app, upstream) = app().await;
    for site in ["down", "broken", "unknown"] {
        let (status, json) = get(app.clone(), &format!("/jobs?site={}", site)).await;
        assert_eq!(status, StatusCode::OK, "site {}", site);
        assert_eq!(json["no_jobs"], true);
        assert_eq!(json["stats"]["open_positions"], 0);
    }
    assert_eq!(upstream.list_hits(), 3);
}

#[tokio::test]
async fn test_job_detail() {
    let (app, _) = app().await;
    let (status, json) = get(app, "/jobs/job-1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["job"]["title"], "Staff Nurse");
    assert_eq!(json["job"]["experienceLevel"], "2+ years");
    assert_eq!(json["salary"], "₹5,00,000 - ₹8,00,000");
    assert_eq!(json["posted_on"], "1 September 2026");
    assert_eq!(json["closes_on"], "15 January 2030");
    assert_eq!(
        json["apply_url"],
        "https://careers.example.com/apply?ref=site&jobId=job-1"
    );
}

#[tokio::test]
async fn test_job_detail_bare_body() {
    let (app, _) = app().await;
    let (status, json) = get(app, "/jobs/bare").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["job"]["id"], "job-3");
}

#[tokio::test]
async fn test_job_detail_not_found() {
    let (app, _) = app().await;
    for id in ["missing", "no-such-job"] {
        let (status, json) = get(app.clone(), &format!("/jobs/{}", id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], format!("Job not found: {}", id));
    }
}

#[tokio::test]
async fn test_apply_link() {
    let (app, _) = app().await;

    let (status, json) = get(app.clone(), "/jobs/job-1/apply").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["url"], "https://careers.example.com/apply?ref=site&jobId=job-1");
    assert_eq!(json["target"], "_blank");

    let (status, json) = get(app.clone(), "/jobs/job-1/apply?via=card").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["url"],
        "https://careers.example.com/apply?ref=site&jobId=job-1&jobTitle=Staff+Nurse"
    );

    let (status, json) = get(app, "/jobs/job-2/apply").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "Application link not available for this position");
}

#[tokio::test]
async fn test_submit_lead() {
    let (app, upstream) = app().await;
    let (status, json) = post_json(app, "/leads", lead_body()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["form"]["name"], "");
    assert_eq!(json["form"]["currentRole"], "");
    assert_eq!(upstream.submissions(), 1);
}

#[tokio::test]
async fn test_submit_lead_missing_fields() {
    let (app, upstream) = app().await;
    let mut body = lead_body();
    body["phone"] = json!("");
    body.as_object_mut().unwrap().remove("city");

    let (status, json) = post_json(app, "/leads", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        "Please fill in all required fields (missing: phone, city)"
    );
    assert_eq!(json["retryable"], false);
    assert_eq!(upstream.submissions(), 0);
}

#[tokio::test]
async fn test_submit_lead_rejected_is_retryable() {
    let (app, _) = app().await;
    let mut body = lead_body();
    body["name"] = json!("reject");

    let (status, json) = post_json(app, "/leads", body).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "Submission failed. Please try again.");
    assert_eq!(json["retryable"], true);
}

#[tokio::test]
async fn test_submit_lead_relay_down() {
    setup();
    let (base, _) = spawn_upstream().await;
    let config = Config {
        web3forms_endpoint: closed_port_url().await,
        ..test_config(&base)
    };
    let (status, json) = post_json(app_with(config), "/leads", lead_body()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "Something went wrong. Please try again later.");
}

#[tokio::test]
async fn test_submit_lead_without_access_key() {
    setup();
    let (base, upstream) = spawn_upstream().await;
    let config = Config {
        web3forms_access_key: None,
        ..test_config(&base)
    };
    let (status, _) = post_json(app_with(config), "/leads", lead_body()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(upstream.submissions(), 0);
}

#[tokio::test]
async fn test_earnings_calculator() {
    let (app, _) = app().await;

    let (status, json) = get(app.clone(), "/earnings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["category"], "ccm-cm");
    assert_eq!(json["total_monthly"], 31_500);
    assert_eq!(json["total_monthly_display"], "₹31,500");

    let (_, json) = get(app.clone(), "/earnings?category=doctor&visits=10&subscriptions=2").await;
    assert_eq!(json["monthly_visits"], 40);
    assert_eq!(json["total_monthly"], 40 * 1150 + 2 * 4000);

    let (_, json) = get(app.clone(), "/earnings?city=Mumbai").await;
    assert_eq!(json["city_tier"], "Tier 1");

    let (status, _) = get(app, "/earnings?category=surgeon").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_filter_changes_reuse_held_listings() {
    let (app, upstream) = app().await;
    for uri in [
        "/jobs",
        "/jobs?search=nurse",
        "/jobs?search=nurse&type=Full-time",
        "/jobs?location=Chennai&max_items=2",
    ] {
        let (status, _) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
    }
    assert_eq!(upstream.list_hits(), 1);

    let (_, json) = get(app, "/jobs?search=nurse&type=Full-time").await;
    let ids: Vec<&str> = json["jobs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["job-1", "job-6", "job-8"]);
    assert_eq!(upstream.list_hits(), 1);
}

#[tokio::test]
async fn test_site_change_and_refresh_fetch_again() {
    let (app, upstream) = app().await;
    get(app.clone(), "/jobs").await;
    get(app.clone(), "/jobs?site=doctors").await;
    get(app.clone(), "/jobs?site=doctors&search=x").await;
    assert_eq!(upstream.list_hits(), 2);

    // Switching back is a new site change
    let (_, json) = get(app.clone(), "/jobs").await;
    assert_eq!(json["stats"]["open_positions"], 8);
    assert_eq!(upstream.list_hits(), 3);

    get(app, "/jobs?refresh=true").await;
    assert_eq!(upstream.list_hits(), 4);
}

#[tokio::test]
async fn test_failed_fetch_is_retried_on_next_request() {
    let (app, upstream) = app().await;
    for _ in 0..2 {
        let (_, json) = get(app.clone(), "/jobs?site=down").await;
        assert_eq!(json["no_jobs"], true);
    }
    assert_eq!(upstream.list_hits(), 2);

    // A well-formed but empty answer is held like any other
    get(app.clone(), "/jobs?site=broken").await;
    get(app, "/jobs?site=broken&search=nurse").await;
    assert_eq!(upstream.list_hits(), 3);
}

#[tokio::test]
async fn test_submit_lead_with_loose_types() {
    let (app, upstream) = app().await;
    let mut body = lead_body();
    body["phone"] = json!(9876543210u64);
    body["employmentStatus"] = json!(null);

    let (status, json) = post_json(app, "/leads", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(upstream.submissions(), 1);
}

#[tokio::test]
async fn test_submit_lead_unreadable_body() {
    let (app, upstream) = app().await;

    let request = Request::builder()
        .uri("/leads")
        .method(Method::POST)
        .body(Body::from(lead_body().to_string()))
        .unwrap();
    let (status, json) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("Invalid request:"));
    assert_eq!(json["retryable"], false);

    let request = Request::builder()
        .uri("/leads")
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["retryable"], false);
    assert_eq!(upstream.submissions(), 0);
}
