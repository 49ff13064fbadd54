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

use axum::Form;
use axum::Json;
use axum::extract::State;
use axum::response::Redirect;
use serde::Deserialize;
use serde::Serialize;

use crate::discovery::gesture::Point;
use crate::discovery::view::Mode;
use crate::types::direction::SwipeDirection;
use crate::web::state::ServerState;

#[derive(Debug, Deserialize)]
enum Action {
    Left,
    Right,
    Up,
    Details,
    CloseDetails,
    Chat,
    CloseChat,
    Autoplay,
    Refresh,
}

impl Action {
    fn direction(&self) -> Option<SwipeDirection> {
        match self {
            Action::Left => Some(SwipeDirection::Left),
            Action::Right => Some(SwipeDirection::Right),
            Action::Up => Some(SwipeDirection::Up),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
pub struct FormData {
    action: Action,
}

pub async fn post_handler(
    State(state): State<ServerState>,
    Form(form): Form<FormData>,
) -> Redirect {
    if !action_handler(&state, &form.action) {
        log::debug!("Ignored action {:?}", form.action);
    }
    Redirect::to("/")
}

fn action_handler(state: &ServerState, action: &Action) -> bool {
    let discovery = &state.discovery;
    if let Some(direction) = action.direction() {
        return discovery.resolve(direction);
    }
    match action {
        Action::Details => discovery.open_detail(),
        Action::CloseDetails => discovery.close_detail(),
        Action::Chat => discovery.open_chat(),
        Action::CloseChat => discovery.close_chat(),
        Action::Autoplay => discovery.toggle_autoplay(),
        Action::Refresh => discovery.refresh(),
        Action::Left | Action::Right | Action::Up => false,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Phase {
    Down,
    Move,
    Up,
}

#[derive(Deserialize)]
pub struct PointerForm {
    phase: Phase,
    x: f64,
    y: f64,
}

/// What the script needs to move the card while it is being dragged.
#[derive(Serialize)]
pub struct PointerReply {
    accepted: bool,
    resolved: Option<&'static str>,
    revision: u64,
    x: f64,
    y: f64,
    rotation: f64,
    right: f64,
    left: f64,
    up: f64,
}

pub async fn pointer_handler(
    State(state): State<ServerState>,
    Form(form): Form<PointerForm>,
) -> Json<PointerReply> {
    let discovery = &state.discovery;
    let at = Point::new(form.x, form.y);
    let mut resolved = None;
    let accepted = match form.phase {
        Phase::Down => discovery.pointer_down(at),
        Phase::Move => discovery.pointer_move(at),
        Phase::Up => {
            resolved = discovery.pointer_up(at);
            resolved.is_some()
        }
    };
    let snapshot = discovery.snapshot();
    Json(PointerReply {
        accepted,
        resolved: resolved.map(|d| d.as_str()),
        revision: snapshot.revision,
        x: snapshot.offset.x,
        y: snapshot.offset.y,
        rotation: snapshot.rotation,
        right: snapshot.intensities.right,
        left: snapshot.intensities.left,
        up: snapshot.intensities.up,
    })
}

#[derive(Deserialize)]
pub struct ChatForm {
    message: String,
}

/// Posts a question to the concierge. The reply arrives in the background;
/// the page shows a typing indicator until then.
pub async fn chat_handler(
    State(state): State<ServerState>,
    Form(form): Form<ChatForm>,
) -> Redirect {
    if state.discovery.snapshot().mode != Mode::AiChat {
        log::debug!("Ignored chat message: chat is closed");
        return Redirect::to("/");
    }
    match state.concierge.begin(&form.message) {
        Some(exchange) => {
            tokio::spawn(exchange.complete());
        }
        None => {
            log::debug!("Ignored chat message");
        }
    }
    Redirect::to("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_direction() {
        assert_eq!(Action::Left.direction(), Some(SwipeDirection::Left));
        assert_eq!(Action::Right.direction(), Some(SwipeDirection::Right));
        assert_eq!(Action::Up.direction(), Some(SwipeDirection::Up));
        assert_eq!(Action::Refresh.direction(), None);
        assert_eq!(Action::Chat.direction(), None);
    }
}
