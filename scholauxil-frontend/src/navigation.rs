//! Dashboard side panel: collapse state, the active top-level view and the
//! mobile breakpoint.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::subscription::{Notifier, Subscription};

#[derive(Debug, Clone, Deserialize)]
pub struct NavigationSettings {
    /// Viewports narrower than this many pixels count as mobile.
    #[serde(default = "default_mobile_breakpoint")]
    pub mobile_breakpoint: u32,
    #[serde(default = "default_collapsed_width")]
    pub collapsed_width: u32,
    #[serde(default = "default_collapsed_width")]
    pub mobile_collapsed_width: u32,
}

fn default_mobile_breakpoint() -> u32 {
    768
}

fn default_collapsed_width() -> u32 {
    80
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            mobile_breakpoint: default_mobile_breakpoint(),
            collapsed_width: default_collapsed_width(),
            mobile_collapsed_width: default_collapsed_width(),
        }
    }
}

/// Exactly one top-level view is visible at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActiveView {
    #[default]
    Home,
    CitationGenerator,
    Repository,
    PlagiarismChecker,
    ChatBot,
}

impl ActiveView {
    /// Sidebar order.
    pub const ALL: [ActiveView; 5] = [
        ActiveView::Home,
        ActiveView::CitationGenerator,
        ActiveView::Repository,
        ActiveView::PlagiarismChecker,
        ActiveView::ChatBot,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            ActiveView::Home => "home",
            ActiveView::CitationGenerator => "citation-generator",
            ActiveView::Repository => "repository",
            ActiveView::PlagiarismChecker => "plagiarism-checker",
            ActiveView::ChatBot => "chat-bot",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActiveView::Home => "Home",
            ActiveView::CitationGenerator => "Citation Generator",
            ActiveView::Repository => "Repository",
            ActiveView::PlagiarismChecker => "Plagiarism Checker",
            ActiveView::ChatBot => "Chat Bot",
        }
    }
}

impl fmt::Display for ActiveView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown view: {0}")]
pub struct UnknownView(pub String);

impl FromStr for ActiveView {
    type Err = UnknownView;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActiveView::ALL
            .into_iter()
            .find(|view| view.slug() == s)
            .ok_or_else(|| UnknownView(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct NavigationShell {
    settings: NavigationSettings,
    collapsed: bool,
    active: ActiveView,
    is_mobile: bool,
}

impl NavigationShell {
    pub fn new(settings: NavigationSettings) -> Self {
        Self {
            settings,
            collapsed: false,
            active: ActiveView::Home,
            is_mobile: false,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn set_collapsed(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
    }

    pub fn toggle_collapsed(&mut self) {
        self.collapsed = !self.collapsed;
    }

    pub fn active_view(&self) -> ActiveView {
        self.active
    }

    pub fn is_active(&self, view: ActiveView) -> bool {
        self.active == view
    }

    pub fn select(&mut self, view: ActiveView) {
        tracing::debug!(from = %self.active, to = %view, "Switching dashboard view");
        self.active = view;
    }

    pub fn show_home(&mut self) {
        self.select(ActiveView::Home);
    }

    pub fn show_citation_generator(&mut self) {
        self.select(ActiveView::CitationGenerator);
    }

    pub fn show_repository(&mut self) {
        self.select(ActiveView::Repository);
    }

    pub fn show_plagiarism_checker(&mut self) {
        self.select(ActiveView::PlagiarismChecker);
    }

    pub fn show_chat_bot(&mut self) {
        self.select(ActiveView::ChatBot);
    }

    pub fn is_mobile(&self) -> bool {
        self.is_mobile
    }

    pub fn on_resize(&mut self, viewport_width: u32) {
        self.is_mobile = viewport_width < self.settings.mobile_breakpoint;
    }

    pub fn collapsed_width(&self) -> u32 {
        if self.is_mobile {
            self.settings.mobile_collapsed_width
        } else {
            self.settings.collapsed_width
        }
    }

    /// Logging out is the caller's business; the shell only forwards the click.
    pub fn logout<R>(&self, on_logout: impl FnOnce() -> R) -> R {
        on_logout()
    }

    /// Re-evaluate the breakpoint on every viewport width published by
    /// `resizes` until the returned subscription is released.
    ///
    /// For hosts that push resize events. The HTTP dashboard instead gets one
    /// width per `/dashboard/viewport` post and calls [`Self::on_resize`].
    pub fn listen_for_resize(shell: &Arc<Mutex<Self>>, resizes: &Notifier<u32>) -> Subscription {
        let shell = Arc::clone(shell);
        resizes.subscribe(move |width| {
            shell
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .on_resize(*width);
        })
    }
}
