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

//! Outputs produced by a resolved swipe: a vibration on the device, and a
//! record of the decision.

use std::time::Duration;

use crate::types::candidate::CandidateId;
use crate::types::direction::SwipeDirection;
use crate::types::timestamp::Timestamp;

const PULSE: Duration = Duration::from_millis(50);

/// Alternating vibrate/pause durations, starting with a vibration.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct HapticPattern(Vec<Duration>);

impl HapticPattern {
    pub fn for_direction(direction: SwipeDirection) -> Self {
        match direction {
            SwipeDirection::Up => Self(vec![PULSE, PULSE, PULSE]),
            SwipeDirection::Left | SwipeDirection::Right => Self(vec![PULSE]),
        }
    }

    pub fn steps(&self) -> &[Duration] {
        &self.0
    }
}

/// Best-effort access to the device vibrator. Implementations must return
/// immediately: the swipe is dispatched on the same thread.
pub trait Haptics: Send + Sync {
    fn vibrate(&self, pattern: &HapticPattern);
}

/// Writes the pattern to the log instead of vibrating.
pub struct LogHaptics;

impl Haptics for LogHaptics {
    fn vibrate(&self, pattern: &HapticPattern) {
        let millis: Vec<u128> = pattern.steps().iter().map(|d| d.as_millis()).collect();
        log::debug!("vibrate {millis:?}");
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct SwipeRecord {
    pub candidate_id: CandidateId,
    pub direction: SwipeDirection,
    pub at: Timestamp,
}

/// Receives one record per resolved swipe. Fire and forget.
pub trait SwipeSink: Send + Sync {
    fn record(&self, record: &SwipeRecord);
}

pub struct LogSink;

impl SwipeSink for LogSink {
    fn record(&self, record: &SwipeRecord) {
        log::info!(
            "swiped {} on {} at {}",
            record.direction,
            record.candidate_id,
            record.at
        );
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Keeps every record in memory.
    #[derive(Default)]
    pub struct MemorySink {
        records: Mutex<Vec<SwipeRecord>>,
    }

    impl MemorySink {
        pub fn records(&self) -> Vec<SwipeRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    impl SwipeSink for MemorySink {
        fn record(&self, record: &SwipeRecord) {
            self.records.lock().unwrap().push(record.clone());
        }
    }

    #[derive(Default)]
    pub struct MemoryHaptics {
        patterns: Mutex<Vec<HapticPattern>>,
    }

    impl MemoryHaptics {
        pub fn patterns(&self) -> Vec<HapticPattern> {
            self.patterns.lock().unwrap().clone()
        }
    }

    impl Haptics for MemoryHaptics {
        fn vibrate(&self, pattern: &HapticPattern) {
            self.patterns.lock().unwrap().push(pattern.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns() {
        assert_eq!(HapticPattern::for_direction(SwipeDirection::Left).steps().len(), 1);
        assert_eq!(HapticPattern::for_direction(SwipeDirection::Right).steps().len(), 1);
        assert_eq!(
            HapticPattern::for_direction(SwipeDirection::Up).steps(),
            &[PULSE, PULSE, PULSE]
        );
    }
}
