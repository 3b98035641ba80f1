//! JSON REST API for Carelog.
//!
//! Exposes an axum [`Router`] backed by any [`carelog_core::store::CareStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", carelog_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod extract;
pub mod imports;
pub mod persons;
pub mod statistics;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use carelog_core::store::CareStore;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CareStore + 'static,
{
  Router::new()
    // Persons
    .route("/persons", get(persons::list::<S>))
    .route("/persons/resolve", post(persons::resolve::<S>))
    .route("/persons/duplicates", get(persons::duplicates::<S>))
    .route("/persons/merge", post(persons::merge::<S>))
    .route("/persons/{id}", get(persons::get_one::<S>))
    // Imports
    .route("/imports", post(imports::create::<S>))
    // Statistics
    .route("/statistics/summary", get(statistics::summary::<S>))
    .route("/statistics/age-distribution", get(statistics::age_distribution::<S>))
    .route("/statistics/age-buckets/{bucket}", get(statistics::bucket_members::<S>))
    .route("/statistics/hometowns", get(statistics::hometowns::<S>))
    .route("/statistics/diagnoses", get(statistics::diagnoses::<S>))
    .route("/statistics/staff", get(statistics::staff::<S>))
    .route("/statistics/ethnicities", get(statistics::ethnicities::<S>))
    .route("/statistics/genders", get(statistics::genders::<S>))
    .route("/statistics/admissions", get(statistics::admissions::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
  };
  use carelog_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory()
      .await
      .expect("in-memory store");
    api_router(Arc::new(store))
  }

  async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
      Some(body) => request
        .header("content-type", "application/json")
        .body(Body::from(body.to_string())),
      None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  #[tokio::test]
  async fn resolve_is_idempotent_over_http() {
    let app = app().await;
    let body = json!({ "name": "张三", "national_id": "-" });

    let (status, first) = send(&app, "POST", "/persons/resolve", Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = send(&app, "POST", "/persons/resolve", Some(body)).await;
    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["national_id"], Value::Null);

    let (status, upgraded) = send(
      &app,
      "POST",
      "/persons/resolve",
      Some(json!({ "name": "张三", "national_id": "110101199001011234" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upgraded["id"], first["id"]);
    assert_eq!(upgraded["national_id"], "110101199001011234");
  }

  #[tokio::test]
  async fn blank_name_is_a_bad_request() {
    let app = app().await;
    let (status, body) =
      send(&app, "POST", "/persons/resolve", Some(json!({ "name": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn missing_person_is_not_found() {
    let app = app().await;
    let (status, _) = send(&app, "GET", "/persons/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn unknown_bucket_is_a_bad_request() {
    let app = app().await;
    let (status, _) = send(&app, "GET", "/statistics/age-buckets/teen", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn import_then_drill_down() {
    let app = app().await;
    let records = json!([
      { "name": "乙", "birth_date": "2023.5.1", "check_in_date": "2024.1.5" },
      { "name": "乙", "check_in_date": "2024.2.5", "diagnosis": "肺炎" },
      { "name": "", "birth_date": "2020.1.1" },
    ]);

    let (status, report) = send(&app, "POST", "/imports", Some(records)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["imported"], 2);
    assert_eq!(report["persons_created"], 1);
    assert_eq!(report["rejected"].as_array().map(Vec::len), Some(1));

    let (status, distribution) =
      send(&app, "GET", "/statistics/age-distribution?today=2024-05-01", None).await;
    assert_eq!(status, StatusCode::OK);
    let toddlers = &distribution[1];
    assert_eq!(toddlers["bucket"], "1-3");
    assert_eq!(toddlers["count"], 1);

    let (status, members) =
      send(&app, "GET", "/statistics/age-buckets/1-3?today=2024-05-01", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members[0]["name"], "乙");
    assert_eq!(members[0]["age"], 1);
    assert_eq!(members[0]["visit_count"], 2);
    assert_eq!(members[0]["diagnosis"], "肺炎");
  }

  #[tokio::test]
  async fn summary_accepts_a_fixed_today() {
    let app = app().await;
    send(
      &app,
      "POST",
      "/imports",
      Some(json!([{ "name": "甲", "birth_date": "2014年3月27日", "gender": "男" }])),
    )
    .await;

    let (status, summary) =
      send(&app, "GET", "/statistics/summary?today=2024-05-01", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total"], 1);
    assert_eq!(summary["known_age_count"], 1);
    assert_eq!(summary["min_age"], 10);

    let (status, body) = send(&app, "GET", "/statistics/summary?today=yesterday", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn malformed_requests_are_json_bad_requests() {
    let app = app().await;
    let cases = [
      ("POST", "/persons/resolve", Some(json!({ "national_id": "123" }))),
      ("POST", "/persons/merge", Some(json!({ "name": 7 }))),
      ("POST", "/imports", Some(json!({ "name": "甲" }))),
      ("GET", "/persons/abc", None),
      ("GET", "/statistics/age-distribution?today=2024-13-01", None),
      ("GET", "/statistics/age-buckets/1-3?today=yesterday", None),
    ];
    for (method, uri, body) in cases {
      let (status, body) = send(&app, method, uri, body).await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
      assert!(body["error"].is_string(), "{method} {uri}");
    }
  }

  #[tokio::test]
  async fn gender_distribution_over_http() {
    let app = app().await;
    send(
      &app,
      "POST",
      "/imports",
      Some(json!([
        { "name": "甲", "gender": "男" },
        { "name": "乙", "gender": "女" },
        { "name": "丙", "gender": "男" },
        { "name": "丁" },
      ])),
    )
    .await;

    let (status, genders) = send(&app, "GET", "/statistics/genders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(genders["total"], 3);
    assert_eq!(genders["missing"], 1);
    assert_eq!(genders["entries"][0]["label"], "男");
    assert_eq!(genders["entries"][0]["count"], 2);
  }

  #[tokio::test]
  async fn merge_over_http() {
    let app = app().await;
    send(
      &app,
      "POST",
      "/imports",
      Some(json!([
        { "name": "王芳", "national_id": "110101199001011234" },
        { "name": "王芳", "national_id": "110101199202022345" },
      ])),
    )
    .await;

    let (status, groups) = send(&app, "GET", "/persons/duplicates", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(groups[0]["person_ids"], json!([1, 2]));

    let (status, outcome) =
      send(&app, "POST", "/persons/merge", Some(json!({ "name": "王芳" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["primary_id"], 1);
    assert_eq!(outcome["conflicting_ids"], json!([2]));

    let (status, _) =
      send(&app, "POST", "/persons/merge", Some(json!({ "name": "无名" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
