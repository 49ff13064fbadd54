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

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use maud::Markup;
use maud::PreEscaped;
use maud::html;

use crate::discovery::session::Snapshot;
use crate::discovery::view::Mode;
use crate::markdown::chat_to_html_inline;
use crate::types::candidate::Candidate;
use crate::types::chat::ChatMessage;
use crate::web::state::ServerState;
use crate::web::template::page_template;

pub async fn get_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    let snapshot = state.discovery.snapshot();
    let messages = state.concierge.messages();
    let pending = state.concierge.is_pending();
    let body = html! {
        div.root
            data-revision=(snapshot.revision)
            data-chat-revision=(state.concierge.revision())
            data-mode=(snapshot.mode.as_str())
            data-pending[pending]
            data-settling[snapshot.settling]
        {
            (header(&snapshot))
            @if snapshot.is_exhausted() {
                (exhausted())
            } @else {
                (stack(&snapshot))
                (controls(&snapshot))
            }
            @if snapshot.detail_open {
                @if let Some(candidate) = &snapshot.current {
                    (detail(candidate))
                }
            }
            @if snapshot.mode == Mode::AiChat {
                (chat(&messages, pending))
            }
        }
    };
    let html = page_template(body);
    (StatusCode::OK, Html(html.into_string()))
}

fn header(snapshot: &Snapshot) -> Markup {
    let progress = format!(
        "{} / {}",
        snapshot.cursor.min(snapshot.total),
        snapshot.total
    );
    html! {
        div.header {
            h1 { "Foodin" }
            div.progress {
                (progress)
            }
            form action="/" method="post" {
                @if snapshot.autoplay {
                    input.active id="autoplay" type="submit" name="action" value="Autoplay" title="Stop autoplay";
                } @else {
                    input id="autoplay" type="submit" name="action" value="Autoplay" title="Start autoplay" disabled[snapshot.is_exhausted()];
                }
                input id="chat" type="submit" name="action" value="Chat";
            }
        }
    }
}

fn stack(snapshot: &Snapshot) -> Markup {
    let transform = format!(
        "transform: translate({:.1}px, {:.1}px) rotate({:.2}deg);",
        snapshot.offset.x, snapshot.offset.y, snapshot.rotation
    );
    html! {
        div.stack {
            @if let Some(next) = &snapshot.next {
                div.card.behind {
                    img src=(next.image_url) alt=(next.name);
                }
            }
            @if let Some(current) = &snapshot.current {
                div #card .card .settling[snapshot.settling] style=(transform) {
                    img src=(current.image_url) alt=(current.name) draggable="false";
                    div.stamp.like style=(opacity(snapshot.intensities.right)) { "LIKE" }
                    div.stamp.nope style=(opacity(snapshot.intensities.left)) { "NOPE" }
                    div.stamp.star style=(opacity(snapshot.intensities.up)) { "SUPER" }
                    div.info {
                        div.tag { (current.tag) }
                        h2 { (current.name) }
                        div.meta {
                            span.rating { "★ " (format!("{:.1}", current.rating)) }
                            span.distance { (current.distance) }
                            span.price { (current.price_range) }
                        }
                    }
                }
            }
        }
    }
}

fn opacity(intensity: f64) -> String {
    format!("opacity: {intensity:.2};")
}

fn controls(snapshot: &Snapshot) -> Markup {
    let disabled = !snapshot.buttons_enabled;
    html! {
        div.controls {
            form action="/" method="post" {
                input id="left" type="submit" name="action" value="Left" disabled[disabled];
                input id="up" type="submit" name="action" value="Up" disabled[disabled];
                input id="right" type="submit" name="action" value="Right" disabled[disabled];
                input id="details" type="submit" name="action" value="Details" disabled[disabled];
            }
        }
    }
}

fn exhausted() -> Markup {
    html! {
        div.finished {
            h1 {
                "You're all caught up!"
            }
            p { "Check back later for more hidden gems." }
            form action="/" method="post" {
                input id="refresh" type="submit" name="action" value="Refresh";
            }
        }
    }
}

fn detail(candidate: &Candidate) -> Markup {
    html! {
        div.detail {
            img src=(candidate.image_url) alt=(candidate.name);
            h2 { (candidate.name) }
            div.category { (candidate.category) }
            p { (candidate.description) }
            dl {
                dt { "Rating" }
                dd { (format!("{:.1}", candidate.rating)) }
                dt { "Trust score" }
                dd { (candidate.trust_score) "%" }
                dt { "Price" }
                dd { (candidate.price_range) }
                dt { "Address" }
                dd { (candidate.address) }
            }
            @if !candidate.highlights.is_empty() {
                ul.highlights {
                    @for highlight in &candidate.highlights {
                        li { (highlight) }
                    }
                }
            }
            form action="/" method="post" {
                input id="close-details" type="submit" name="action" value="CloseDetails";
            }
        }
    }
}

fn chat(messages: &[ChatMessage], pending: bool) -> Markup {
    html! {
        div.chat {
            div.chat-header {
                h2 { "Foodin AI" }
                form action="/" method="post" {
                    input id="close-chat" type="submit" name="action" value="CloseChat";
                }
            }
            div.messages {
                @for message in messages {
                    div class=(format!("message {}", message.role.as_str())) {
                        (PreEscaped(chat_to_html_inline(&message.text)))
                    }
                }
                @if pending {
                    div.message.assistant.typing { "Thinking..." }
                }
            }
            form action="/chat" method="post" {
                input type="text" name="message" placeholder="Ask for food recommendations..." autocomplete="off" disabled[pending];
                input type="submit" value="Send" disabled[pending];
            }
        }
    }
}
