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

//! Pointer tracking for the topmost card.
//!
//! The tracker turns raw pointer samples into a drag offset while the pointer
//! is down, and classifies the offset into a swipe when it is released.

use crate::types::direction::SwipeDirection;

/// Degrees of card rotation per unit of horizontal drag.
const ROTATION_DIVISOR: f64 = 10.0;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// How strongly each swipe overlay should show, each in `[0, 1]`.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Intensities {
    pub right: f64,
    pub left: f64,
    pub up: f64,
}

#[derive(Clone, Debug)]
pub struct GestureTracker {
    threshold: f64,
    offset: Point,
    dragging: bool,
    start: Point,
}

impl GestureTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            offset: Point::default(),
            dragging: false,
            start: Point::default(),
        }
    }

    /// Starts a drag. Ignored if the card is not active.
    pub fn pointer_down(&mut self, active: bool, at: Point) -> bool {
        if !active {
            return false;
        }
        self.start = at;
        self.dragging = true;
        true
    }

    /// Updates the offset of an ongoing drag.
    pub fn pointer_move(&mut self, active: bool, at: Point) -> bool {
        if !(self.dragging && active) {
            return false;
        }
        self.offset = self.offset_to(at);
        true
    }

    /// Ends the drag and classifies the final offset. Returns `None` if no
    /// drag was in progress, or if the card did not travel far enough, in
    /// which case it snaps back to the origin.
    pub fn pointer_up(&mut self, at: Point) -> Option<SwipeDirection> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;
        self.offset = self.offset_to(at);
        let direction = classify(self.offset, self.threshold);
        if direction.is_none() {
            self.offset = Point::default();
        }
        direction
    }

    /// Forgets any drag in progress. Called when the active card changes.
    pub fn reset(&mut self) {
        self.offset = Point::default();
        self.dragging = false;
        self.start = Point::default();
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn rotation(&self) -> f64 {
        self.offset.x / ROTATION_DIVISOR
    }

    pub fn intensities(&self) -> Intensities {
        let t = self.threshold;
        Intensities {
            right: (self.offset.x / t).clamp(0.0, 1.0),
            left: (-self.offset.x / t).clamp(0.0, 1.0),
            up: (-self.offset.y / t).clamp(0.0, 1.0),
        }
    }

    fn offset_to(&self, at: Point) -> Point {
        Point::new(at.x - self.start.x, at.y - self.start.y)
    }
}

/// Vertical is checked first: a drag past both the up and a horizontal
/// threshold is a super-like.
pub fn classify(offset: Point, threshold: f64) -> Option<SwipeDirection> {
    if offset.y < -threshold {
        Some(SwipeDirection::Up)
    } else if offset.x > threshold {
        Some(SwipeDirection::Right)
    } else if offset.x < -threshold {
        Some(SwipeDirection::Left)
    } else {
        None
    }
}
