//! Handlers for `/persons` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/persons` | Ascending by id |
//! | `GET`  | `/persons/:id` | 404 if not found |
//! | `POST` | `/persons/resolve` | Body: `{"name":"…","national_id":"…"}` |
//! | `GET`  | `/persons/duplicates` | Names held by more than one person |
//! | `POST` | `/persons/merge` | Body: `{"name":"…"}`; 404 if nobody has it |

use std::sync::Arc;

use axum::{Json, extract::State};
use carelog_core::{
  person::{DuplicateGroup, MergeOutcome, Person, PersonId, normalize_name},
  store::CareStore,
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  extract::{JsonBody, PathParams},
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /persons`
pub async fn list<S: CareStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Person>>, ApiError> {
  let persons = store.list_persons().await.map_err(ApiError::store)?;
  Ok(Json(persons))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /persons/:id`
pub async fn get_one<S: CareStore>(
  State(store): State<Arc<S>>,
  PathParams(id): PathParams<PersonId>,
) -> Result<Json<Person>, ApiError> {
  let person = store
    .get_person(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(Json(person))
}

// ─── Resolve ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
  pub name:        String,
  #[serde(default)]
  pub national_id: Option<String>,
}

/// `POST /persons/resolve`: find-or-create, returning the canonical person.
pub async fn resolve<S: CareStore>(
  State(store): State<Arc<S>>,
  JsonBody(body): JsonBody<ResolveBody>,
) -> Result<Json<Person>, ApiError> {
  let name = normalize_name(&body.name)?;
  let id = store
    .find_or_create_person(&name, body.national_id.as_deref())
    .await
    .map_err(ApiError::store)?;
  let person = store
    .get_person(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(Json(person))
}

// ─── Merging ──────────────────────────────────────────────────────────────────

/// `GET /persons/duplicates`
pub async fn duplicates<S: CareStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<DuplicateGroup>>, ApiError> {
  let groups = store.duplicate_groups().await.map_err(ApiError::store)?;
  Ok(Json(groups))
}

#[derive(Debug, Deserialize)]
pub struct MergeBody {
  pub name: String,
}

/// `POST /persons/merge`
pub async fn merge<S: CareStore>(
  State(store): State<Arc<S>>,
  JsonBody(body): JsonBody<MergeBody>,
) -> Result<Json<MergeOutcome>, ApiError> {
  let name = normalize_name(&body.name)?;
  let outcome = store
    .merge_duplicate_persons(&name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no person named {name:?}")))?;
  Ok(Json(outcome))
}
