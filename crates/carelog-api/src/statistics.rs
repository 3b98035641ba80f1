//! Handlers for `/statistics` endpoints.
//!
//! Every view is computed from one store snapshot, so counts agree across
//! endpoints for the same `today`. Age-dependent endpoints accept
//! `?today=YYYY-MM-DD` and default to the server's local date.

use std::sync::Arc;

use axum::{Json, extract::State};
use carelog_core::{
  bucket::AgeBucket,
  stats::{
    AdmissionTrend, BucketMember, BucketStatistics, CategoryDistribution,
    SummaryStatistics,
  },
  store::CareStore,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
  error::ApiError,
  extract::{PathParams, QueryParams},
};

#[derive(Debug, Default, Deserialize)]
pub struct TodayParams {
  pub today: Option<NaiveDate>,
}

// ─── Age ──────────────────────────────────────────────────────────────────────

/// `GET /statistics/summary[?today=…]`
pub async fn summary<S: CareStore>(
  State(store): State<Arc<S>>,
  QueryParams(params): QueryParams<TodayParams>,
) -> Result<Json<SummaryStatistics>, ApiError> {
  let summary = store
    .summary_statistics(params.today)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(summary))
}

/// `GET /statistics/age-distribution[?today=…]`: all six buckets, in order.
pub async fn age_distribution<S: CareStore>(
  State(store): State<Arc<S>>,
  QueryParams(params): QueryParams<TodayParams>,
) -> Result<Json<Vec<BucketStatistics>>, ApiError> {
  let buckets = store
    .age_distribution(params.today)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(buckets))
}

/// `GET /statistics/age-buckets/:bucket[?today=…]`, where `bucket` is a label
/// such as `1-3` or `18+`.
pub async fn bucket_members<S: CareStore>(
  State(store): State<Arc<S>>,
  PathParams(bucket): PathParams<String>,
  QueryParams(params): QueryParams<TodayParams>,
) -> Result<Json<Vec<BucketMember>>, ApiError> {
  let bucket = AgeBucket::from_label(&bucket)?;
  let members = store
    .persons_in_bucket(bucket, params.today)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(members))
}

// ─── Categorical ──────────────────────────────────────────────────────────────

/// `GET /statistics/hometowns`
pub async fn hometowns<S: CareStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<CategoryDistribution>, ApiError> {
  Ok(Json(store.hometown_distribution().await.map_err(ApiError::store)?))
}

/// `GET /statistics/diagnoses`
pub async fn diagnoses<S: CareStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<CategoryDistribution>, ApiError> {
  Ok(Json(store.diagnosis_distribution().await.map_err(ApiError::store)?))
}

/// `GET /statistics/staff`
pub async fn staff<S: CareStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<CategoryDistribution>, ApiError> {
  Ok(Json(store.staff_distribution().await.map_err(ApiError::store)?))
}

/// `GET /statistics/ethnicities`
pub async fn ethnicities<S: CareStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<CategoryDistribution>, ApiError> {
  Ok(Json(store.ethnicity_distribution().await.map_err(ApiError::store)?))
}

/// `GET /statistics/genders`
pub async fn genders<S: CareStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<CategoryDistribution>, ApiError> {
  Ok(Json(store.gender_distribution().await.map_err(ApiError::store)?))
}

// ─── Admissions ───────────────────────────────────────────────────────────────

/// `GET /statistics/admissions`
pub async fn admissions<S: CareStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<AdmissionTrend>, ApiError> {
  Ok(Json(store.admission_trend().await.map_err(ApiError::store)?))
}
