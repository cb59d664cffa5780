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

mod cards;
mod revisions;
pub mod server;
mod state;

#[cfg(test)]
mod tests {
    use portpicker::pick_unused_port;
    use reqwest::Response;
    use reqwest::StatusCode;
    use serde_json::Value;
    use serde_json::json;
    use tokio::spawn;

    use crate::cmd::serve::server::ServerConfig;
    use crate::cmd::serve::server::start_server;
    use crate::error::Context;
    use crate::error::Fallible;
    use crate::helper::create_tmp_directory;
    use crate::helper::wait_for_server;

    const TEST_HOST: &str = "127.0.0.1";

    async fn post(url: String, body: Value) -> Fallible<Response> {
        reqwest::Client::new()
            .post(url)
            .json(&body)
            .send()
            .await
            .context("request failed")
    }

    async fn body(response: Response) -> Fallible<Value> {
        response.json().await.context("invalid response body")
    }

    #[tokio::test]
    async fn test_start_server_on_non_existent_directory() -> Fallible<()> {
        let config = ServerConfig {
            directory: Some("./derpherp".to_string()),
            host: Some(TEST_HOST.to_string()),
            port: pick_unused_port(),
        };
        let result = start_server(config).await;
        let err = result.err().unwrap();
        assert_eq!(err.to_string(), "error: directory does not exist.");
        Ok(())
    }

    #[tokio::test]
    async fn test_cards_e2e() -> Fallible<()> {
        let port = pick_unused_port().unwrap();
        let config = ServerConfig {
            directory: Some(create_tmp_directory()?),
            host: Some(TEST_HOST.to_string()),
            port: Some(port),
        };
        spawn(async move { start_server(config).await });
        wait_for_server(TEST_HOST, port).await?;
        let base = format!("http://{TEST_HOST}:{port}");

        // Create a card.
        let response = post(
            format!("{base}/cards"),
            json!({ "front": "hola", "back": "hello" }),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let card = body(response).await?;
        let id = card["id"].as_str().unwrap().to_string();
        assert_eq!(card["card"]["state"]["status"], "learning");

        // New cards are due immediately.
        let response = reqwest::get(format!("{base}/cards/due"))
            .await
            .context("request failed")?;
        let due = body(response).await?;
        assert_eq!(due.as_array().map(Vec::len), Some(1));

        // Grade it.
        let response = post(
            format!("{base}/cards/{id}/grade"),
            json!({ "grade": "good" }),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let card = body(response).await?;
        assert_eq!(card["card"]["state"]["learning_step"], 1);
        assert_eq!(card["card"]["review_count"], 1);
        assert!(card["last_reviewed_at"].is_string());

        // It is no longer due.
        let response = reqwest::get(format!("{base}/cards/due"))
            .await
            .context("request failed")?;
        assert_eq!(body(response).await?, json!([]));

        // Invalid grades are rejected.
        let response = post(
            format!("{base}/cards/{id}/grade"),
            json!({ "grade": "forgot" }),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = body(response).await?;
        assert!(error["error"].as_str().unwrap().starts_with("invalid grade"));

        // So are grades of the wrong type, or missing ones.
        for request in [json!({ "grade": 3 }), json!({})] {
            let response = post(format!("{base}/cards/{id}/grade"), request).await?;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert!(body(response).await?["error"].is_string());
        }

        // Unknown cards.
        let response = post(
            format!("{base}/cards/0000000000000000/grade"),
            json!({ "grade": "easy" }),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Fetch and delete.
        let response = reqwest::get(format!("{base}/cards/{id}"))
            .await
            .context("request failed")?;
        assert_eq!(response.status(), StatusCode::OK);
        let client = reqwest::Client::new();
        let response = client
            .delete(format!("{base}/cards/{id}"))
            .send()
            .await
            .context("request failed")?;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = client
            .delete(format!("{base}/cards/{id}"))
            .send()
            .await
            .context("request failed")?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Hit the not found endpoint.
        let response = reqwest::get(format!("{base}/herp-derp"))
            .await
            .context("request failed")?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_revisions_e2e() -> Fallible<()> {
        let port = pick_unused_port().unwrap();
        let config = ServerConfig {
            directory: Some(create_tmp_directory()?),
            host: Some(TEST_HOST.to_string()),
            port: Some(port),
        };
        spawn(async move { start_server(config).await });
        wait_for_server(TEST_HOST, port).await?;
        let base = format!("http://{TEST_HOST}:{port}");

        // Every weekday excluded is a configuration error.
        let response = post(
            format!("{base}/revisions"),
            json!({ "title": "Calculus", "non_study_days": [0, 1, 2, 3, 4, 5, 6] }),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = post(
            format!("{base}/revisions"),
            json!({ "title": "Calculus", "non_study_days": [0, 6] }),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let revision = body(response).await?;
        let id = revision["id"].as_str().unwrap().to_string();
        assert_eq!(revision["item"]["interval_days"], 1);
        assert_eq!(revision["item"]["non_study_days"], json!([0, 6]));

        // The first revision is tomorrow or later, so it is upcoming.
        let response = reqwest::get(format!("{base}/revisions"))
            .await
            .context("request failed")?;
        let revisions = body(response).await?;
        assert_eq!(revisions[0]["item"]["category"], "priority");

        let response = post(format!("{base}/revisions/{id}/postpone"), json!({})).await?;
        assert_eq!(response.status(), StatusCode::OK);
        let revision = body(response).await?;
        assert_eq!(revision["item"]["category"], "priority");

        let response = post(format!("{base}/revisions/{id}/complete"), json!({})).await?;
        let revision = body(response).await?;
        assert_eq!(revision["item"]["category"], "completed");
        assert_eq!(revision["item"]["revision_count"], 0);
        assert!(revision["item"]["completed_at"].is_string());

        let response = post(format!("{base}/revisions/{id}/advance"), json!({})).await?;
        let revision = body(response).await?;
        assert_eq!(revision["item"]["revision_count"], 1);
        assert_eq!(revision["item"]["interval_days"], 3);

        let response = post(format!("{base}/revisions/{id}/reschedule"), json!({})).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = post(format!("{base}/revisions/nope/complete"), json!({})).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }
}
