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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde_json::json;
use studydesk_core::NonStudyDays;
use studydesk_core::RecordId;

use crate::collection::Collection;
use crate::error::ErrorReport;

#[derive(Clone)]
pub struct ServerState {
    pub default_non_study_days: NonStudyDays,
    /// All record updates go through this lock, one at a time.
    pub coll: Arc<Mutex<Collection>>,
}

impl ServerState {
    pub fn lock(&self) -> Result<MutexGuard<'_, Collection>, ApiError> {
        self.coll
            .lock()
            .map_err(|_| ApiError::internal(ErrorReport::new("collection lock poisoned")))
    }
}

/// An error response with a JSON body of the form `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(err: ErrorReport) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: err.message().to_string(),
        }
    }

    pub fn not_found(kind: &str, id: &RecordId) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("no {kind} with id {id}"),
        }
    }

    pub fn internal(err: ErrorReport) -> Self {
        log::error!("{err}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.message().to_string(),
        }
    }
}

impl From<ErrorReport> for ApiError {
    fn from(err: ErrorReport) -> Self {
        ApiError::internal(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn parse_id(id: String) -> Result<RecordId, ApiError> {
    RecordId::new(id).map_err(ApiError::bad_request)
}
