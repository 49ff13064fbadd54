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
pub enum Mode {
    Discovery,
    AiChat,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Discovery => "discovery",
            Mode::AiChat => "ai-chat",
        }
    }
}

/// Which overlay is showing, and whether autoplay is on.
///
/// The chat overlay and the detail panel never show together, and either one
/// blocks swiping and pauses autoplay.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ViewMode {
    mode: Mode,
    detail_open: bool,
    autoplay: bool,
}

impl Default for ViewMode {
    fn default() -> Self {
        Self {
            mode: Mode::Discovery,
            detail_open: false,
            autoplay: false,
        }
    }
}

impl ViewMode {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn detail_open(&self) -> bool {
        self.detail_open
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    /// True when an overlay covers the card stack.
    pub fn is_blocked(&self) -> bool {
        self.mode != Mode::Discovery || self.detail_open
    }

    /// Whether the like/pass/super-like buttons are reachable.
    pub fn swipe_buttons_enabled(&self) -> bool {
        !self.is_blocked()
    }

    /// Whether the autoplay driver should be running.
    pub fn autoplay_should_run(&self) -> bool {
        self.autoplay && !self.is_blocked()
    }

    pub fn open_chat(&mut self) -> bool {
        if self.is_blocked() {
            return false;
        }
        self.mode = Mode::AiChat;
        true
    }

    pub fn close_chat(&mut self) -> bool {
        if self.mode != Mode::AiChat {
            return false;
        }
        self.mode = Mode::Discovery;
        true
    }

    /// Opens the detail panel for the current card. The caller says whether
    /// there is a current card.
    pub fn open_detail(&mut self, has_current: bool) -> bool {
        if self.is_blocked() || !has_current {
            return false;
        }
        self.detail_open = true;
        true
    }

    pub fn close_detail(&mut self) -> bool {
        if !self.detail_open {
            return false;
        }
        self.detail_open = false;
        true
    }

    pub fn set_autoplay(&mut self, enabled: bool) -> bool {
        if self.autoplay == enabled {
            return false;
        }
        self.autoplay = enabled;
        true
    }
}
