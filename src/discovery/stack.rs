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

use rand::Rng;
use rand::seq::SliceRandom;

use crate::types::candidate::Candidate;

/// The ordered candidates of the current round, and the position of the card
/// on top. The cursor only moves forward within a round.
#[derive(Clone, Debug)]
pub struct CardStack {
    candidates: Vec<Candidate>,
    cursor: usize,
}

impl CardStack {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            cursor: 0,
        }
    }

    /// The card on top, or `None` if the round is over.
    pub fn current(&self) -> Option<&Candidate> {
        self.candidates.get(self.cursor)
    }

    /// The card right beneath the top one.
    pub fn peek_next(&self) -> Option<&Candidate> {
        self.candidates.get(self.cursor + 1)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.candidates.len().saturating_sub(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.current().is_none()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Moves past the current card. Returns false if there is nothing to
    /// move past.
    pub fn advance(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Starts a new round: reshuffles the candidates and puts the cursor back
    /// at the top. Only allowed once the current round is over.
    pub fn refresh<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if !self.is_exhausted() {
            return false;
        }
        self.candidates.shuffle(rng);
        self.cursor = 0;
        true
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::catalog::builtin_catalog;
    use crate::types::candidate::CandidateId;

    fn ids(stack: &CardStack) -> Vec<CandidateId> {
        stack.candidates().iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn test_cursor_tracks_advances() {
        let catalog = builtin_catalog();
        let mut stack = CardStack::new(catalog.clone());
        for n in 0..catalog.len() {
            assert_eq!(stack.cursor(), n);
            assert_eq!(stack.current(), Some(&catalog[n]));
            assert!(stack.advance());
        }
        assert_eq!(stack.cursor(), catalog.len());
        assert!(stack.is_exhausted());
        assert_eq!(stack.remaining(), 0);
    }

    #[test]
    fn test_peek_next() {
        let catalog = builtin_catalog();
        let mut stack = CardStack::new(catalog.clone());
        assert_eq!(stack.peek_next(), Some(&catalog[1]));
        for _ in 0..4 {
            stack.advance();
        }
        assert_eq!(stack.current(), Some(&catalog[4]));
        assert_eq!(stack.peek_next(), None);
    }

    #[test]
    fn test_advance_when_exhausted() {
        let mut stack = CardStack::new(builtin_catalog());
        while stack.advance() {}
        let cursor = stack.cursor();
        assert!(!stack.advance());
        assert_eq!(stack.cursor(), cursor);
    }

    #[test]
    fn test_refresh_requires_exhaustion() {
        let mut stack = CardStack::new(builtin_catalog());
        let mut rng = StdRng::seed_from_u64(7);
        stack.advance();
        assert!(!stack.refresh(&mut rng));
        assert_eq!(stack.cursor(), 1);
    }

    #[test]
    fn test_refresh_is_a_permutation() {
        let mut stack = CardStack::new(builtin_catalog());
        let mut before = ids(&stack);
        while stack.advance() {}
        let mut rng = StdRng::seed_from_u64(42);
        assert!(stack.refresh(&mut rng));
        assert_eq!(stack.cursor(), 0);
        let mut after = ids(&stack);
        assert_eq!(after.len(), before.len());
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn test_empty_stack() {
        let mut stack = CardStack::new(Vec::new());
        assert!(stack.is_empty());
        assert!(stack.is_exhausted());
        assert!(!stack.advance());
        assert!(stack.refresh(&mut StdRng::seed_from_u64(1)));
        assert_eq!(stack.cursor(), 0);
    }
}
