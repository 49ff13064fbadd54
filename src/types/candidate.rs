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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;

/// Identifies a restaurant within a catalog.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CandidateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A restaurant in the swipeable stack. Candidates are loaded once and never
/// mutated afterwards.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub description: String,
    pub category: String,
    /// A three-part keyword line, e.g. "Cozy - Coffee - D1".
    pub tag: String,
    pub image_url: String,
    /// Star rating, from 0 to 5.
    pub rating: f64,
    /// Percentage, from 0 to 100.
    pub trust_score: u8,
    pub distance: String,
    pub price_range: String,
    pub address: String,
    #[serde(default)]
    pub highlights: Vec<String>,
}
