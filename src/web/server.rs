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
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use axum::routing::get;
use axum::routing::post;
use serde::Deserialize;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::time::sleep;
use tokio::time::timeout;

use crate::concierge::recommender::Credential;
use crate::concierge::recommender::build_recommender;
use crate::concierge::session::ConciergeSession;
use crate::config::Config;
use crate::discovery::feedback::LogHaptics;
use crate::discovery::feedback::LogSink;
use crate::discovery::session::Discovery;
use crate::discovery::session::DiscoverySettings;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::candidate::Candidate;
use crate::web::get::get_handler;
use crate::web::post::chat_handler;
use crate::web::post::pointer_handler;
use crate::web::post::post_handler;
use crate::web::state::ServerState;

/// How long `/updates` waits for a change before answering anyway.
const LONG_POLL: Duration = Duration::from_secs(25);

pub struct ServerOptions {
    pub port: u16,
    pub open_browser: bool,
}

pub async fn start_server(
    catalog: Vec<Candidate>,
    config: Config,
    credential: Credential,
    options: ServerOptions,
) -> Fallible<()> {
    if catalog.is_empty() {
        return fail("catalog has no restaurants.");
    }

    let discovery = Discovery::new(
        catalog,
        DiscoverySettings::from(&config),
        Arc::new(LogHaptics),
        Arc::new(LogSink),
    );
    let recommender = build_recommender(credential, &config.concierge);
    let concierge = ConciergeSession::new(recommender, &config.concierge);
    let state = ServerState {
        discovery: discovery.clone(),
        concierge,
    };

    let app = Router::new();
    let app = app.route("/", get(get_handler));
    let app = app.route("/", post(post_handler));
    let app = app.route("/pointer", post(pointer_handler));
    let app = app.route("/chat", post(chat_handler));
    let app = app.route("/updates", get(updates));
    let app = app.route("/script.js", get(script));
    let app = app.route("/style.css", get(stylesheet));
    let app = app.fallback(not_found_handler);
    let app = app.with_state(state);
    let bind = format!("127.0.0.1:{}", options.port);

    if options.open_browser {
        // Start a separate task to open the browser.
        let url = format!("http://{bind}/");
        let probe = bind.clone();
        tokio::spawn(async move {
            loop {
                if let Ok(stream) = TcpStream::connect(&probe).await {
                    drop(stream);
                    break;
                }
                sleep(Duration::from_millis(1)).await;
            }
            if let Err(e) = open::that(&url) {
                log::warn!("Failed to open the browser: {e}");
            }
        });
    }

    // Start the server.
    log::debug!("Starting server on {bind}");
    let listener = TcpListener::bind(&bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    discovery.shutdown();
    log::debug!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

#[derive(Deserialize)]
pub struct UpdatesQuery {
    #[serde(default)]
    after: u64,
    #[serde(default)]
    chat: u64,
}

#[derive(Serialize)]
pub struct UpdatesReply {
    revision: u64,
    chat: u64,
}

/// Long-polls until the discovery revision passes `after` or the chat
/// revision passes `chat`, and answers with both latest revisions.
async fn updates(
    State(state): State<ServerState>,
    Query(query): Query<UpdatesQuery>,
) -> Json<UpdatesReply> {
    let mut discovery = state.discovery.subscribe();
    let mut chat = state.concierge.subscribe();
    let wait = async {
        loop {
            if discovery.borrow_and_update().revision > query.after {
                return;
            }
            if *chat.borrow_and_update() > query.chat {
                return;
            }
            tokio::select! {
                changed = discovery.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                changed = chat.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    };
    let _ = timeout(LONG_POLL, wait).await;
    Json(UpdatesReply {
        revision: state.discovery.snapshot().revision,
        chat: state.concierge.revision(),
    })
}

async fn script() -> (StatusCode, [(HeaderName, &'static str); 1], &'static str) {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/javascript")],
        include_str!("script.js"),
    )
}

async fn stylesheet() -> (StatusCode, [(HeaderName, &'static str); 2], &'static [u8]) {
    let bytes = include_bytes!("style.css");
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/css"),
            (CACHE_CONTROL, "public, max-age=604800, immutable"),
        ],
        bytes,
    )
}

async fn not_found_handler() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html("Not Found".to_string()))
}
