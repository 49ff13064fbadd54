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

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::concierge::recommender::Recommender;

pub const CANNED_REPLY: &str = "I see you're looking for something special! Based on your location in District 1, I'd highly recommend trying **Cục Gạch Quán** for an authentic family meal, or **Pizza 4P's** if you're craving some cheesy goodness. Would you like more details on either?";

/// Stands in for the real service when there is no API key. Waits a little
/// so the demo feels like a network call.
pub struct CannedRecommender {
    delay: Duration,
}

impl CannedRecommender {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Recommender for CannedRecommender {
    async fn recommend(&self, query: &str, _context: &str) -> String {
        log::debug!("Canned reply for {query:?}");
        sleep(self.delay).await;
        CANNED_REPLY.to_string()
    }
}
