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

//! Recommendations from the Gemini `generateContent` REST endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;

use crate::concierge::recommender::APOLOGY;
use crate::concierge::recommender::ApiKey;
use crate::concierge::recommender::EMPTY_REPLY;
use crate::concierge::recommender::Recommender;
use crate::error::ErrorReport;
use crate::error::Fallible;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiRecommender {
    client: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
}

impl GeminiRecommender {
    pub fn new(api_key: ApiKey, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Points the recommender at another server speaking the same API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn generate(&self, query: &str, context: &str) -> Fallible<Option<String>> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url,
            self.model,
            self.api_key.expose()
        );
        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: system_instruction(context),
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: query.to_string(),
                }],
            }],
        };
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ErrorReport::new(format!(
                "Gemini API returned {status}: {}",
                error_message(&text)
            )));
        }
        let parsed: GenerateContentResponse = response.json().await?;
        Ok(extract_text(parsed))
    }
}

#[async_trait]
impl Recommender for GeminiRecommender {
    async fn recommend(&self, query: &str, context: &str) -> String {
        match self.generate(query, context).await {
            Ok(Some(text)) => text,
            Ok(None) => EMPTY_REPLY.to_string(),
            Err(e) => {
                log::error!("Gemini request failed: {e}");
                APOLOGY.to_string()
            }
        }
    }
}

fn system_instruction(context: &str) -> String {
    format!(
        "You are Foodin AI, a helpful and witty culinary concierge for Vietnam. \
         You help users decide what to eat. Keep answers concise, fun, and helpful. \
         Context provided: {context}. \
         Format your response with bold text for restaurant names."
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<ResponseCandidate>>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Joins the text parts of the first candidate. Blank text counts as no
/// answer.
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let content = response
        .candidates?
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)?;
    let text: String = content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorWrapper>(body) {
        Ok(wrapper) => {
            let message = wrapper.error.message.unwrap_or_default();
            match wrapper.error.status {
                Some(status) if !status.is_empty() => format!("{status}: {message}"),
                _ => message,
            }
        }
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use axum::Json;
    use axum::Router;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::http::Uri;
    use serde_json::Value;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio::net::TcpStream;
    use tokio::spawn;
    use tokio::time::sleep;

    use super::*;

    async fn fake_gemini(
        uri: Uri,
        Query(params): Query<HashMap<String, String>>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if !uri.path().ends_with("/test-model:generateContent") {
            return (StatusCode::NOT_FOUND, Json(json!({})));
        }
        if params.get("key").map(String::as_str) != Some("good-key") {
            return (
                StatusCode::FORBIDDEN,
                Json(json!({"error": {"code": 403, "message": "bad key", "status": "PERMISSION_DENIED"}})),
            );
        }
        let query = body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let instruction = body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default();
        if !instruction.contains("Context provided: in D1.") {
            return (StatusCode::BAD_REQUEST, Json(json!({})));
        }
        if query == "nothing" {
            return (StatusCode::OK, Json(json!({"candidates": []})));
        }
        (
            StatusCode::OK,
            Json(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "Try "}, {"text": format!("**{query}** at Phở Hòa")}]}
                }]
            })),
        )
    }

    async fn start_fake_gemini() -> String {
        let port = portpicker::pick_unused_port().unwrap();
        let bind = format!("127.0.0.1:{port}");
        let app = Router::new().fallback(fake_gemini);
        let listener = TcpListener::bind(&bind).await.unwrap();
        spawn(async move { axum::serve(listener, app).await });
        loop {
            if let Ok(stream) = TcpStream::connect(&bind).await {
                drop(stream);
                break;
            }
            sleep(Duration::from_millis(1)).await;
        }
        format!("http://{bind}/v1beta/models")
    }

    fn recommender(key: &str, base_url: &str) -> GeminiRecommender {
        GeminiRecommender::new(ApiKey::new(key), "test-model").with_base_url(base_url)
    }

    #[tokio::test]
    async fn test_reply_text_is_joined() {
        let base_url = start_fake_gemini().await;
        let reply = recommender("good-key", &base_url)
            .recommend("pho", "in D1")
            .await;
        assert_eq!(reply, "Try **pho** at Phở Hòa");
    }

    #[tokio::test]
    async fn test_empty_reply() {
        let base_url = start_fake_gemini().await;
        let reply = recommender("good-key", &base_url)
            .recommend("nothing", "in D1")
            .await;
        assert_eq!(reply, EMPTY_REPLY);
    }

    #[tokio::test]
    async fn test_http_error_becomes_apology() {
        let base_url = start_fake_gemini().await;
        let reply = recommender("bad-key", &base_url)
            .recommend("pho", "in D1")
            .await;
        assert_eq!(reply, APOLOGY);
    }

    #[tokio::test]
    async fn test_connection_error_becomes_apology() {
        let port = portpicker::pick_unused_port().unwrap();
        let reply = recommender("good-key", &format!("http://127.0.0.1:{port}"))
            .recommend("pho", "in D1")
            .await;
        assert_eq!(reply, APOLOGY);
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"error": {"code": 429, "message": "slow down", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(error_message(body), "RESOURCE_EXHAUSTED: slow down");
        assert_eq!(error_message("oops"), "oops");
    }
}
