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

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::signal;

use crate::cmd::serve::cards::create_card_handler;
use crate::cmd::serve::cards::delete_card_handler;
use crate::cmd::serve::cards::due_cards_handler;
use crate::cmd::serve::cards::get_card_handler;
use crate::cmd::serve::cards::grade_card_handler;
use crate::cmd::serve::cards::list_cards_handler;
use crate::cmd::serve::revisions::create_revision_handler;
use crate::cmd::serve::revisions::delete_revision_handler;
use crate::cmd::serve::revisions::get_revision_handler;
use crate::cmd::serve::revisions::list_revisions_handler;
use crate::cmd::serve::revisions::revision_action_handler;
use crate::cmd::serve::state::ServerState;
use crate::collection::Collection;
use crate::error::Fallible;

pub struct ServerConfig {
    pub directory: Option<String>,
    /// Overrides the host from the configuration file.
    pub host: Option<String>,
    /// Overrides the port from the configuration file.
    pub port: Option<u16>,
}

pub async fn start_server(config: ServerConfig) -> Fallible<()> {
    let coll = Collection::new(config.directory)?;
    let host = config.host.unwrap_or_else(|| coll.config.server.host.clone());
    let port = config.port.unwrap_or(coll.config.server.port);
    log::debug!("Serving collection in {}", coll.directory.display());

    let state = ServerState {
        default_non_study_days: coll.config.default_non_study_days,
        coll: Arc::new(Mutex::new(coll)),
    };
    let app = Router::new();
    let app = app.route("/cards", get(list_cards_handler).post(create_card_handler));
    let app = app.route("/cards/due", get(due_cards_handler));
    let app = app.route(
        "/cards/{id}",
        get(get_card_handler).delete(delete_card_handler),
    );
    let app = app.route("/cards/{id}/grade", post(grade_card_handler));
    let app = app.route(
        "/revisions",
        get(list_revisions_handler).post(create_revision_handler),
    );
    let app = app.route(
        "/revisions/{id}",
        get(get_revision_handler).delete(delete_revision_handler),
    );
    let app = app.route("/revisions/{id}/{action}", post(revision_action_handler));
    let app = app.fallback(not_found_handler);
    let app = app.with_state(state);
    let bind = format!("{host}:{port}");

    log::debug!("Starting server on {bind}");
    let listener = TcpListener::bind(bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn not_found_handler() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => log::debug!("Received Ctrl+C, shutting down gracefully"),
        Err(e) => {
            log::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await
        }
    }
}
