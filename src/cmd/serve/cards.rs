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
use studydesk_core::Grade;
use studydesk_core::Timestamp;

use crate::cmd::serve::state::ApiError;
use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::state::parse_id;
use crate::db::StoredCard;

#[derive(Deserialize)]
pub struct CreateCard {
    front: String,
    back: String,
}

#[derive(Deserialize)]
pub struct GradeRequest {
    grade: String,
}

pub async fn list_cards_handler(
    State(state): State<ServerState>,
) -> Result<Json<Vec<StoredCard>>, ApiError> {
    let coll = state.lock()?;
    Ok(Json(coll.db.list_cards()?))
}

pub async fn due_cards_handler(
    State(state): State<ServerState>,
) -> Result<Json<Vec<StoredCard>>, ApiError> {
    let now = Timestamp::now();
    let coll = state.lock()?;
    Ok(Json(coll.db.due_cards(now)?))
}

pub async fn create_card_handler(
    State(state): State<ServerState>,
    body: Result<Json<CreateCard>, JsonRejection>,
) -> Result<(StatusCode, Json<StoredCard>), ApiError> {
    let Json(body) = body?;
    let card = StoredCard::new(body.front, body.back, Timestamp::now());
    let coll = state.lock()?;
    coll.db.insert_card(&card)?;
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn get_card_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<StoredCard>, ApiError> {
    let id = parse_id(id)?;
    let coll = state.lock()?;
    match coll.db.get_card(&id)? {
        Some(card) => Ok(Json(card)),
        None => Err(ApiError::not_found("card", &id)),
    }
}

pub async fn grade_card_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    body: Result<Json<GradeRequest>, JsonRejection>,
) -> Result<Json<StoredCard>, ApiError> {
    let id = parse_id(id)?;
    let Json(body) = body?;
    let grade: Grade = body.grade.parse().map_err(ApiError::bad_request)?;
    let now = Timestamp::now();
    let mut coll = state.lock()?;
    match coll.db.grade_card(&id, grade, now)? {
        Some(card) => Ok(Json(card)),
        None => Err(ApiError::not_found("card", &id)),
    }
}

pub async fn delete_card_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(id)?;
    let coll = state.lock()?;
    if coll.db.delete_card(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("card", &id))
    }
}
