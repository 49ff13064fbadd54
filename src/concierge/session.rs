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
use std::sync::PoisonError;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;

use crate::concierge::recommender::APOLOGY;
use crate::concierge::recommender::Recommender;
use crate::config::ConciergeConfig;
use crate::types::chat::ChatLog;
use crate::types::chat::ChatMessage;
use crate::types::chat::Role;

pub const GREETING: &str =
    "Hi! I'm Foodin AI. I know all the hidden gems in Saigon. Tell me what you're craving! 🍜";

struct Inner {
    state: Mutex<ChatState>,
    recommender: Arc<dyn Recommender>,
    context: String,
    timeout: Duration,
    updates: watch::Sender<u64>,
}

struct ChatState {
    log: ChatLog,
    pending: bool,
    /// Bumped whenever a message is appended.
    revision: u64,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a message and tells subscribers.
    fn push(&self, state: &mut ChatState, role: Role, text: String) {
        state.log.push(role, text);
        state.revision += 1;
        self.updates.send_replace(state.revision);
    }
}

/// The conversation with the concierge. At most one question is in flight
/// at a time, so replies always land in the order questions were asked.
#[derive(Clone)]
pub struct ConciergeSession {
    inner: Arc<Inner>,
}

impl ConciergeSession {
    pub fn new(recommender: Arc<dyn Recommender>, config: &ConciergeConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ChatState {
                    log: ChatLog::with_greeting(GREETING),
                    pending: false,
                    revision: 0,
                }),
                recommender,
                context: config.context.clone(),
                timeout: config.timeout,
                updates: watch::channel(0).0,
            }),
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner.lock().log.messages().to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().log.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.inner.lock().revision
    }

    /// Receives the new revision after every appended message.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.updates.subscribe()
    }

    /// Whether a question is waiting for its reply.
    pub fn is_pending(&self) -> bool {
        self.inner.lock().pending
    }

    /// Asks a question and waits for the reply. Returns false if the
    /// question was rejected: blank text, or another question in flight.
    pub async fn send(&self, text: &str) -> bool {
        match self.begin(text) {
            Some(exchange) => {
                exchange.complete().await;
                true
            }
            None => false,
        }
    }

    /// Appends the user's message and marks the session pending. The reply
    /// is fetched by [`Exchange::complete`].
    pub fn begin(&self, text: &str) -> Option<Exchange> {
        if text.trim().is_empty() {
            return None;
        }
        let mut state = self.inner.lock();
        if state.pending {
            log::debug!("Rejected message: a reply is still pending");
            return None;
        }
        state.pending = true;
        self.inner.push(&mut state, Role::User, text.to_string());
        Some(Exchange {
            inner: self.inner.clone(),
            query: text.to_string(),
            finished: false,
        })
    }
}

/// A question in flight. Dropping it before it completes appends the
/// apology, so the session never stays pending.
pub struct Exchange {
    inner: Arc<Inner>,
    query: String,
    finished: bool,
}

impl Exchange {
    pub async fn complete(mut self) {
        let reply = timeout(
            self.inner.timeout,
            self.inner
                .recommender
                .recommend(&self.query, &self.inner.context),
        )
        .await;
        let reply = match reply {
            Ok(reply) => reply,
            Err(_) => {
                log::warn!(
                    "Recommendation timed out after {}ms",
                    self.inner.timeout.as_millis()
                );
                APOLOGY.to_string()
            }
        };
        self.finish(reply);
    }

    fn finish(&mut self, reply: String) {
        if self.finished {
            return;
        }
        self.finished = true;
        let mut state = self.inner.lock();
        state.pending = false;
        self.inner.push(&mut state, Role::Assistant, reply);
    }
}

impl Drop for Exchange {
    fn drop(&mut self) {
        self.finish(APOLOGY.to_string());
    }
}
