// ── View State ──
//
// One value for what the user is looking at: a screen plus at most one
// overlay on top of it. The two gated screens (disclaimer, lock) come first;
// the three tabs are only reachable once both gates are passed.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Disclaimer,
    Locked,
    Timeline,
    Insights,
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overlay {
    #[default]
    None,
    NewIncident,
    AccessCodeSetup,
    Terms,
    Privacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    screen: Screen,
    overlay: Overlay,
}

impl Screen {
    pub fn is_tab(self) -> bool {
        matches!(self, Screen::Timeline | Screen::Insights | Screen::Profile)
    }
}

impl ViewState {
    /// Where a freshly opened journal starts.
    pub fn initial(agreed: bool, locked: bool) -> Self {
        let screen = if !agreed {
            Screen::Disclaimer
        } else if locked {
            Screen::Locked
        } else {
            Screen::Timeline
        };
        Self {
            screen,
            overlay: Overlay::None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn overlay(&self) -> Overlay {
        self.overlay
    }

    /// Both gates are passed.
    pub fn is_open(&self) -> bool {
        self.screen.is_tab()
    }

    /// Accept the disclaimer. `locked` says whether an access code is set.
    pub fn agree(&mut self, locked: bool) {
        if self.screen == Screen::Disclaimer {
            *self = Self::initial(true, locked);
        }
    }

    pub fn lock(&mut self) {
        if self.screen != Screen::Disclaimer {
            self.screen = Screen::Locked;
            self.overlay = Overlay::None;
        }
    }

    pub fn unlock(&mut self) {
        if self.screen == Screen::Locked {
            self.screen = Screen::Timeline;
            self.overlay = Overlay::None;
        }
    }

    /// Switch tabs. Ignored while gated or when `tab` is not a tab.
    pub fn navigate(&mut self, tab: Screen) {
        if self.screen.is_tab() && tab.is_tab() {
            self.screen = tab;
            self.overlay = Overlay::None;
        }
    }

    /// Show an overlay. Terms and privacy can be read from anywhere; the
    /// rest need an open journal.
    pub fn open(&mut self, overlay: Overlay) {
        let allowed = match overlay {
            Overlay::None | Overlay::Terms | Overlay::Privacy => true,
            Overlay::NewIncident | Overlay::AccessCodeSetup => self.is_open(),
        };
        if allowed {
            self.overlay = overlay;
        }
    }

    pub fn close(&mut self) {
        self.overlay = Overlay::None;
    }
}
