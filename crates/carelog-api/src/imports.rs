//! Handler for `POST /imports`.
//!
//! The body is a JSON array of [`ImportRecord`]s. Rows without a name are
//! reported in the response rather than failing the batch.

use std::sync::Arc;

use axum::{Json, extract::State};
use carelog_core::{
  import::{ImportRecord, ImportReport},
  store::CareStore,
};

use crate::{error::ApiError, extract::JsonBody};

/// `POST /imports`
pub async fn create<S: CareStore>(
  State(store): State<Arc<S>>,
  JsonBody(records): JsonBody<Vec<ImportRecord>>,
) -> Result<Json<ImportReport>, ApiError> {
  let report = store
    .import_records(records)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(report))
}
