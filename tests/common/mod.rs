#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use careerdesk::config::Config;
use careerdesk::posting::{coerce_posting_list, JobPosting};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use url::Url;

static INIT: Once = Once::new();

pub const ACCESS_KEY: &str = "test-access-key";

// Setup function for tests
pub fn setup() {
    INIT.call_once(|| {
        // Initialize tracing for tests - only once
        let _ = tracing_subscriber::fmt::try_init();
    });
}

/// Counts the calls each fake upstream endpoint receives.
#[derive(Clone, Default)]
pub struct Upstream {
    pub list_hits: Arc<AtomicUsize>,
    pub detail_hits: Arc<AtomicUsize>,
    pub submissions: Arc<AtomicUsize>,
}

impl Upstream {
    pub fn list_hits(&self) -> usize {
        self.list_hits.load(Ordering::SeqCst)
    }

    pub fn detail_hits(&self) -> usize {
        self.detail_hits.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }
}

fn posting(
    id: &str,
    title: &str,
    department: &str,
    job_type: &str,
    description: &str,
    locations: Value,
) -> Value {
    json!({
        "_id": id,
        "title": title,
        "department": department,
        "type": job_type,
        "description": description,
        "locations": locations,
        "requirements": ["Valid registration"],
        "closingDate": "2030-01-15T00:00:00.000Z",
        "createdAt": "2026-09-01T10:00:00.000Z",
        "status": "Open",
        "sites": ["telthcare"]
    })
}

fn loc(city: &str, kind: &str) -> Value {
    json!({ "city": city, "country": "India", "type": kind })
}

/// Eight postings in upstream wire shape.
pub fn sample_posts_body() -> Value {
    let mut nurse = posting(
        "job-1",
        "Staff Nurse",
        "Nursing",
        "Full-time",
        "Provide bedside care",
        json!([loc("Chennai", "Onsite")]),
    );
    nurse["salaryRange"] = json!({ "min": 500000, "max": 800000 });
    nurse["posterLink"] = json!("https://careers.example.com/apply?ref=site");
    nurse["Experience"] = json!("2+ years");

    json!({
        "success": true,
        "data": [
            nurse,
            posting("job-2", "Care Manager", "Operations", "Part-time",
                "Coordinate home visits for nurse teams",
                json!([loc("Salem", "Hybrid"), loc("Delhi", "Remote"), loc("Mumbai", "Onsite")])),
            posting("job-3", "Frontend Engineer", "Engineering", "Contract",
                "Build patient apps", json!([loc("Bengaluru", "Remote")])),
            posting("job-4", "Physiotherapist", "Clinical", "Full-time",
                "Home physiotherapy", json!([loc("Chennai", "Hybrid")])),
            posting("job-5", "Data Intern", "Engineering", "Internship",
                "Analyse care metrics", json!([])),
            posting("job-6", "Nurse Educator", "Nursing", "Full-time",
                "Train new staff", json!([loc("Delhi", "Onsite")])),
            posting("job-7", "Night Nurse", "Nursing", "Part-time",
                "Overnight ward cover", json!([loc("Chennai", "Onsite")])),
            posting("job-8", "Ward Nurse", "Nursing", "Full-time",
                "General ward duties", json!([loc("Salem", "Onsite")])),
        ]
    })
}

pub fn sample_postings() -> Vec<JobPosting> {
    coerce_posting_list(&sample_posts_body())
}

pub fn ids(postings: &[&JobPosting]) -> Vec<String> {
    postings.iter().map(|p| p.id.clone()).collect()
}

async fn getposts(
    State(upstream): State<Upstream>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    upstream.list_hits.fetch_add(1, Ordering::SeqCst);
    match params.get("site").map(String::as_str) {
        Some("telthcare") => Json(sample_posts_body()).into_response(),
        Some("broken") => Json(json!({ "data": "oops" })).into_response(),
        Some("down") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Some("html") => "<html>Down for maintenance</html>".into_response(),
        _ => Json(json!({ "data": [] })).into_response(),
    }
}

async fn getpostid(State(upstream): State<Upstream>, Path(id): Path<String>) -> Response {
    upstream.detail_hits.fetch_add(1, Ordering::SeqCst);
    let all = sample_posts_body();
    let find = |id: &str| {
        all["data"]
            .as_array()
            .and_then(|items| items.iter().find(|p| p["_id"] == id))
            .cloned()
    };
    match id.as_str() {
        "bare" => match find("job-3") {
            Some(posting) => Json(posting).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        "missing" => Json(json!({ "success": false, "message": "Job not found" })).into_response(),
        other => match find(other) {
            Some(posting) => Json(json!({ "success": true, "data": posting })).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
    }
}

async fn submit(
    State(upstream): State<Upstream>,
    Form(fields): Form<HashMap<String, String>>,
) -> Json<Value> {
    upstream.submissions.fetch_add(1, Ordering::SeqCst);
    let key_ok = fields.get("access_key").map(String::as_str) == Some(ACCESS_KEY);
    let rejected = fields.get("name").map(String::as_str) == Some("reject");
    if key_ok && !rejected {
        Json(json!({ "success": true, "message": "Email sent successfully!" }))
    } else {
        Json(json!({ "success": false, "message": "Invalid access key" }))
    }
}

/// Serves the fake job-post API and form relay on an ephemeral port.
pub async fn spawn_upstream() -> (Url, Upstream) {
    let upstream = Upstream::default();
    let router = Router::new()
        .route("/api/jobpost/getposts/", get(getposts))
        .route("/api/jobpost/getpostid/{id}", get(getpostid))
        .route("/submit", post(submit))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (Url::parse(&format!("http://{}", addr)).unwrap(), upstream)
}

/// An address nothing listens on.
pub async fn closed_port_url() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{}/submit", addr)).unwrap()
}

pub fn test_config(upstream: &Url) -> Config {
    Config {
        jobs_api_base_url: upstream.clone(),
        web3forms_endpoint: upstream.join("submit").unwrap(),
        web3forms_access_key: Some(ACCESS_KEY.to_string()),
        rate_limit_per_minute: None,
        ..Config::default()
    }
}
