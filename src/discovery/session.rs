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

//! The discovery screen as one explicit state object.
//!
//! Every mutation (pointer events, button presses, autoplay ticks, settle
//! timers) happens under a single lock, and publishes a fresh [`Snapshot`] to
//! subscribers when it's done. Background tasks only hold a weak reference
//! to the session, so dropping the last handle tears everything down.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::Weak;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio::time::interval_at;
use tokio::time::sleep;

use crate::config::Config;
use crate::discovery::feedback::HapticPattern;
use crate::discovery::feedback::Haptics;
use crate::discovery::feedback::SwipeRecord;
use crate::discovery::feedback::SwipeSink;
use crate::discovery::gesture::GestureTracker;
use crate::discovery::gesture::Intensities;
use crate::discovery::gesture::Point;
use crate::discovery::stack::CardStack;
use crate::discovery::view::Mode;
use crate::discovery::view::ViewMode;
use crate::types::candidate::Candidate;
use crate::types::direction::SwipeDirection;
use crate::types::timestamp::Timestamp;

/// What a render layer needs to draw the discovery screen.
#[derive(Clone, PartialEq, Debug)]
pub struct Snapshot {
    /// Bumped on every published change.
    pub revision: u64,
    pub cursor: usize,
    pub total: usize,
    pub current: Option<Candidate>,
    pub next: Option<Candidate>,
    pub mode: Mode,
    pub detail_open: bool,
    pub autoplay: bool,
    /// A swiped card is playing its exit animation.
    pub settling: bool,
    pub offset: Point,
    pub rotation: f64,
    pub intensities: Intensities,
    pub buttons_enabled: bool,
}

impl Snapshot {
    pub fn is_exhausted(&self) -> bool {
        self.current.is_none()
    }
}

#[derive(Clone, Debug)]
pub struct DiscoverySettings {
    pub threshold: f64,
    pub settle_delay: Duration,
    pub autoplay_interval: Duration,
}

impl From<&Config> for DiscoverySettings {
    fn from(config: &Config) -> Self {
        Self {
            threshold: config.swipe.threshold,
            settle_delay: config.swipe.settle_delay,
            autoplay_interval: config.autoplay.interval,
        }
    }
}

/// A background task, tagged with the generation it was started under. A
/// task whose generation no longer matches the slot it was stored in must
/// not touch the state.
struct Scheduled {
    generation: u64,
    task: JoinHandle<()>,
}

struct State {
    stack: CardStack,
    gesture: GestureTracker,
    view: ViewMode,
    /// The settle timer of the last swipe, if it hasn't fired yet.
    pending_advance: Option<Scheduled>,
    autoplay_driver: Option<Scheduled>,
    generation: u64,
    revision: u64,
    rng: StdRng,
    closed: bool,
}

impl State {
    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// The top card takes pointer input only when nothing covers it and no
    /// swipe is still settling.
    fn card_active(&self) -> bool {
        !self.closed
            && !self.view.is_blocked()
            && self.pending_advance.is_none()
            && self.stack.current().is_some()
    }

    fn snapshot(&self) -> Snapshot {
        let current = self.stack.current().cloned();
        Snapshot {
            revision: self.revision,
            cursor: self.stack.cursor(),
            total: self.stack.len(),
            buttons_enabled: current.is_some() && self.view.swipe_buttons_enabled(),
            current,
            next: self.stack.peek_next().cloned(),
            mode: self.view.mode(),
            detail_open: self.view.detail_open(),
            autoplay: self.view.autoplay(),
            settling: self.pending_advance.is_some(),
            offset: self.gesture.offset(),
            rotation: self.gesture.rotation(),
            intensities: self.gesture.intensities(),
        }
    }
}

struct Shared {
    state: Mutex<State>,
    settings: DiscoverySettings,
    haptics: Arc<dyn Haptics>,
    sink: Arc<dyn SwipeSink>,
    updates: watch::Sender<Snapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &mut State) {
        state.revision += 1;
        self.updates.send_replace(state.snapshot());
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        cancel_all(state);
    }
}

/// Handle to a discovery session. Cheap to clone; all clones share state.
///
/// Methods that may start a timer must be called from within a Tokio
/// runtime.
#[derive(Clone)]
pub struct Discovery {
    shared: Arc<Shared>,
}

impl Discovery {
    pub fn new(
        candidates: Vec<Candidate>,
        settings: DiscoverySettings,
        haptics: Arc<dyn Haptics>,
        sink: Arc<dyn SwipeSink>,
    ) -> Self {
        Self::with_rng(candidates, settings, haptics, sink, StdRng::from_entropy())
    }

    pub fn with_rng(
        candidates: Vec<Candidate>,
        settings: DiscoverySettings,
        haptics: Arc<dyn Haptics>,
        sink: Arc<dyn SwipeSink>,
        rng: StdRng,
    ) -> Self {
        let state = State {
            stack: CardStack::new(candidates),
            gesture: GestureTracker::new(settings.threshold),
            view: ViewMode::default(),
            pending_advance: None,
            autoplay_driver: None,
            generation: 0,
            revision: 0,
            rng,
            closed: false,
        };
        let (updates, _) = watch::channel(state.snapshot());
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                settings,
                haptics,
                sink,
                updates,
            }),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.lock().snapshot()
    }

    /// Receives a snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.updates.subscribe()
    }

    pub fn pointer_down(&self, at: Point) -> bool {
        self.mutate(|_, state| {
            let active = state.card_active();
            state.gesture.pointer_down(active, at)
        })
    }

    pub fn pointer_move(&self, at: Point) -> bool {
        self.mutate(|_, state| {
            let active = state.card_active();
            state.gesture.pointer_move(active, at)
        })
    }

    /// Ends a drag. Returns the direction if the release resolved a swipe.
    pub fn pointer_up(&self, at: Point) -> Option<SwipeDirection> {
        let mut direction = None;
        self.mutate(|shared, state| {
            if !state.gesture.is_dragging() {
                return false;
            }
            direction = state.gesture.pointer_up(at);
            if let Some(d) = direction {
                if !resolve(shared, state, d) {
                    state.gesture.reset();
                    direction = None;
                }
            }
            true
        });
        direction
    }

    /// Commits a swipe on the top card, as the action buttons do. Rejected
    /// if there is no top card or an overlay covers the stack.
    pub fn resolve(&self, direction: SwipeDirection) -> bool {
        let mut resolved = false;
        self.mutate(|shared, state| {
            // A settling swipe may complete even if this one is rejected.
            let settling = state.pending_advance.is_some();
            resolved = resolve(shared, state, direction);
            resolved || settling
        });
        resolved
    }

    /// Starts a new round once the stack is exhausted.
    pub fn refresh(&self) -> bool {
        self.mutate(|shared, state| {
            if state.closed {
                return false;
            }
            if state.stack.remaining() <= 1 {
                finish_pending_advance(shared, state);
            }
            if !state.stack.refresh(&mut state.rng) {
                return false;
            }
            log::debug!("Refreshed stack of {} candidates", state.stack.len());
            state.gesture.reset();
            true
        })
    }

    /// Opens the detail panel. A settling swipe is completed first, so the
    /// panel shows the card that comes up next.
    pub fn open_detail(&self) -> bool {
        let mut opened = false;
        self.mutate(|shared, state| {
            if state.closed || state.view.is_blocked() {
                return false;
            }
            let settling = state.pending_advance.is_some();
            finish_pending_advance(shared, state);
            let has_current = state.stack.current().is_some();
            opened = state.view.open_detail(has_current);
            if opened {
                state.gesture.reset();
            }
            opened || settling
        });
        opened
    }

    pub fn close_detail(&self) -> bool {
        self.mutate(|_, state| state.view.close_detail())
    }

    pub fn open_chat(&self) -> bool {
        self.mutate(|_, state| {
            if !state.view.open_chat() {
                return false;
            }
            state.gesture.reset();
            true
        })
    }

    pub fn close_chat(&self) -> bool {
        self.mutate(|_, state| state.view.close_chat())
    }

    /// Turns autoplay on or off. Turning it on is rejected once the stack is
    /// exhausted.
    pub fn set_autoplay(&self, enabled: bool) -> bool {
        self.mutate(|_, state| set_autoplay(state, enabled))
    }

    pub fn toggle_autoplay(&self) -> bool {
        self.mutate(|_, state| {
            let enabled = !state.view.autoplay();
            set_autoplay(state, enabled)
        })
    }

    /// Cancels every timer without applying it. The session takes no more
    /// input afterwards.
    pub fn shutdown(&self) {
        let mut state = self.shared.lock();
        state.closed = true;
        cancel_all(&mut state);
        state.gesture.reset();
        self.shared.publish(&mut state);
    }

    /// Runs `f` under the lock. If it reports a change, the autoplay driver
    /// is brought in line with the new state and a snapshot is published.
    fn mutate<F>(&self, f: F) -> bool
    where
        F: FnOnce(&Arc<Shared>, &mut State) -> bool,
    {
        let mut state = self.shared.lock();
        let changed = f(&self.shared, &mut *state);
        if changed {
            sync_autoplay(&self.shared, &mut state);
            self.shared.publish(&mut state);
        }
        changed
    }
}

fn set_autoplay(state: &mut State, enabled: bool) -> bool {
    if enabled && (state.closed || state.stack.is_exhausted()) {
        return false;
    }
    state.view.set_autoplay(enabled)
}

fn resolve(shared: &Arc<Shared>, state: &mut State, direction: SwipeDirection) -> bool {
    if state.closed || state.view.is_blocked() {
        return false;
    }
    finish_pending_advance(shared, state);
    let Some(candidate) = state.stack.current() else {
        return false;
    };
    let record = SwipeRecord {
        candidate_id: candidate.id.clone(),
        direction,
        at: Timestamp::now(),
    };
    log::debug!("Swiped {direction} on {}", candidate.name);
    shared.sink.record(&record);

    let delay = shared.settings.settle_delay;
    if delay.is_zero() {
        advance(shared, state);
    } else {
        let generation = state.next_generation();
        let weak = Arc::downgrade(shared);
        let task = tokio::spawn(async move {
            sleep(delay).await;
            on_settled(weak, generation);
        });
        state.pending_advance = Some(Scheduled { generation, task });
    }

    shared
        .haptics
        .vibrate(&HapticPattern::for_direction(direction));
    true
}

fn on_settled(weak: Weak<Shared>, generation: u64) {
    let Some(shared) = weak.upgrade() else {
        return;
    };
    let mut state = shared.lock();
    let current = state
        .pending_advance
        .as_ref()
        .is_some_and(|p| p.generation == generation);
    if !current {
        return;
    }
    state.pending_advance = None;
    advance(&shared, &mut state);
    shared.publish(&mut state);
}

/// If a swipe is still settling, cancels its timer and applies the advance
/// right away.
fn finish_pending_advance(shared: &Arc<Shared>, state: &mut State) {
    if let Some(pending) = state.pending_advance.take() {
        pending.task.abort();
        advance(shared, state);
    }
}

fn advance(shared: &Arc<Shared>, state: &mut State) {
    state.stack.advance();
    state.gesture.reset();
    if state.stack.is_exhausted() && state.view.autoplay() {
        log::debug!("Stack exhausted, turning autoplay off");
        state.view.set_autoplay(false);
    }
    sync_autoplay(shared, state);
}

/// Starts or stops the autoplay driver so that it runs exactly when the view
/// says it should.
fn sync_autoplay(shared: &Arc<Shared>, state: &mut State) {
    let should_run = !state.closed && state.view.autoplay_should_run();
    match (should_run, state.autoplay_driver.is_some()) {
        (true, false) => {
            let generation = state.next_generation();
            let period = shared.settings.autoplay_interval;
            let weak = Arc::downgrade(shared);
            let task = tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if !on_autoplay_tick(&weak, generation) {
                        return;
                    }
                }
            });
            log::debug!("Autoplay started");
            state.autoplay_driver = Some(Scheduled { generation, task });
        }
        (false, true) => {
            if let Some(driver) = state.autoplay_driver.take() {
                driver.task.abort();
                log::debug!("Autoplay stopped");
            }
        }
        _ => {}
    }
}

/// Returns false when the driver should exit.
fn on_autoplay_tick(weak: &Weak<Shared>, generation: u64) -> bool {
    let Some(shared) = weak.upgrade() else {
        return false;
    };
    let mut state = shared.lock();
    let current = state
        .autoplay_driver
        .as_ref()
        .is_some_and(|d| d.generation == generation);
    if !current {
        return false;
    }
    if state.stack.is_exhausted() && state.pending_advance.is_none() {
        state.view.set_autoplay(false);
    } else {
        resolve(&shared, &mut state, SwipeDirection::Right);
    }
    sync_autoplay(&shared, &mut state);
    shared.publish(&mut state);
    state.autoplay_driver.is_some()
}

fn cancel_all(state: &mut State) {
    if let Some(pending) = state.pending_advance.take() {
        pending.task.abort();
    }
    if let Some(driver) = state.autoplay_driver.take() {
        driver.task.abort();
    }
}
