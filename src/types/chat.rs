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

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct ChatMessage {
    /// Position in the log. Ids are assigned in append order, starting at 1.
    pub id: u64,
    pub role: Role,
    pub text: String,
}

/// An append-only conversation log.
#[derive(Clone, Debug)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    /// Creates a log seeded with one assistant greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let mut log = Self {
            messages: Vec::new(),
        };
        log.push(Role::Assistant, greeting.into());
        log
    }

    pub fn push(&mut self, role: Role, text: String) -> &ChatMessage {
        let id = self.messages.len() as u64 + 1;
        self.messages.push(ChatMessage { id, role, text });
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_seed() {
        let log = ChatLog::with_greeting("hello");
        assert_eq!(log.len(), 1);
        assert_eq!(log.messages()[0].role, Role::Assistant);
        assert_eq!(log.messages()[0].id, 1);
    }

    #[test]
    fn test_ids_follow_append_order() {
        let mut log = ChatLog::with_greeting("hello");
        log.push(Role::User, "pho".to_string());
        log.push(Role::Assistant, "try this".to_string());
        let ids: Vec<u64> = log.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
