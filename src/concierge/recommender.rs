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

use std::fmt::Debug;
use std::fmt::Formatter;
use std::sync::Arc;

use async_trait::async_trait;

use crate::concierge::canned::CannedRecommender;
use crate::concierge::gemini::GeminiRecommender;
use crate::config::ConciergeConfig;

/// Shown when the recommendation service fails or takes too long.
pub const APOLOGY: &str =
    "I'm having trouble connecting to the food universe right now. Try again in a moment!";

/// Shown when the recommendation service answers with nothing.
pub const EMPTY_REPLY: &str = "I couldn't find a recommendation right now, try swiping!";

/// Answers a free-text food question.
///
/// Implementations never fail: any internal error must come back as a
/// message the user can read, such as [`APOLOGY`].
#[async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend(&self, query: &str, context: &str) -> String;
}

#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for ApiKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey(<redacted>)")
    }
}

/// Whether the app may talk to the real recommendation service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credential {
    Present(ApiKey),
    Absent,
}

impl Credential {
    /// Treats a blank key the same as no key.
    pub fn from_optional(key: Option<String>) -> Self {
        match key {
            Some(key) if !key.trim().is_empty() => Credential::Present(ApiKey::new(key.trim())),
            _ => Credential::Absent,
        }
    }
}

pub fn build_recommender(credential: Credential, config: &ConciergeConfig) -> Arc<dyn Recommender> {
    match credential {
        Credential::Present(key) => {
            log::debug!("Using Gemini model {}", config.model);
            Arc::new(GeminiRecommender::new(key, config.model.clone()))
        }
        Credential::Absent => {
            log::warn!("No API key set. The concierge will answer with canned replies.");
            Arc::new(CannedRecommender::new(config.canned_delay))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_from_optional() {
        assert_eq!(Credential::from_optional(None), Credential::Absent);
        assert_eq!(
            Credential::from_optional(Some("  ".to_string())),
            Credential::Absent
        );
        assert_eq!(
            Credential::from_optional(Some(" abc ".to_string())),
            Credential::Present(ApiKey::new("abc"))
        );
    }

    #[test]
    fn test_api_key_is_redacted() {
        let key = ApiKey::new("secret");
        assert!(!format!("{key:?}").contains("secret"));
        assert_eq!(key.expose(), "secret");
    }
}
