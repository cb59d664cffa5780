// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::Deserialize;
use studydesk_core::NonStudyDays;
use studydesk_core::Timestamp;

use crate::cmd::revision::categorized_revisions;
use crate::cmd::serve::state::ApiError;
use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::state::parse_id;
use crate::db::RevisionAction;
use crate::db::StoredRevision;

#[derive(Deserialize)]
pub struct CreateRevision {
    title: String,
    non_study_days: Option<Vec<u8>>,
}

pub async fn list_revisions_handler(
    State(state): State<ServerState>,
) -> Result<Json<Vec<StoredRevision>>, ApiError> {
    let now = Timestamp::now();
    let coll = state.lock()?;
    Ok(Json(categorized_revisions(&coll, now)?))
}

pub async fn create_revision_handler(
    State(state): State<ServerState>,
    body: Result<Json<CreateRevision>, JsonRejection>,
) -> Result<(StatusCode, Json<StoredRevision>), ApiError> {
    let Json(body) = body?;
    let non_study_days = match body.non_study_days {
        Some(indices) => NonStudyDays::from_indices(indices).map_err(ApiError::bad_request)?,
        None => state.default_non_study_days,
    };
    let revision = StoredRevision::new(body.title, non_study_days, Timestamp::now())?;
    let coll = state.lock()?;
    coll.db.insert_revision(&revision)?;
    Ok((StatusCode::CREATED, Json(revision)))
}

pub async fn get_revision_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<StoredRevision>, ApiError> {
    let id = parse_id(id)?;
    let now = Timestamp::now();
    let coll = state.lock()?;
    match coll.db.get_revision(&id)? {
        Some(mut revision) => {
            revision.item.refresh_category(now)?;
            Ok(Json(revision))
        }
        None => Err(ApiError::not_found("revision", &id)),
    }
}

/// Applies `complete`, `postpone`, or `advance`. The response carries the
/// category set by the action itself.
pub async fn revision_action_handler(
    State(state): State<ServerState>,
    Path((id, action)): Path<(String, String)>,
) -> Result<Json<StoredRevision>, ApiError> {
    let id = parse_id(id)?;
    let action: RevisionAction = action.parse().map_err(ApiError::bad_request)?;
    let now = Timestamp::now();
    let mut coll = state.lock()?;
    match coll.db.apply_revision_action(&id, action, now)? {
        Some(revision) => Ok(Json(revision)),
        None => Err(ApiError::not_found("revision", &id)),
    }
}

pub async fn delete_revision_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(id)?;
    let coll = state.lock()?;
    if coll.db.delete_revision(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("revision", &id))
    }
}
