//! Gate for views that need a signed-in user.
//!
//! [`SessionGuard`] is a small state machine fed with [`AuthState`] signals.
//! It renders a placeholder until the state resolves, the protected view once a
//! user is known, and asks for a single redirect to the landing page when the
//! session turns out to be signed out.

use std::sync::{Arc, Mutex};

use super::context::SessionContext;
use crate::subscription::{Notifier, Subscription};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unresolved,
    SignedIn(SessionContext),
    SignedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardView {
    /// Nothing observable is rendered.
    Placeholder,
    Children(SessionContext),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardEffect {
    None,
    Redirect(String),
}

/// Source of auth-state changes.
pub trait AuthStateNotifier {
    fn subscribe_auth_state(
        &self,
        listener: Box<dyn Fn(&AuthState) + Send + Sync>,
    ) -> Subscription;
}

impl AuthStateNotifier for Notifier<AuthState> {
    fn subscribe_auth_state(
        &self,
        listener: Box<dyn Fn(&AuthState) + Send + Sync>,
    ) -> Subscription {
        self.subscribe(move |state| listener(state))
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

#[derive(Debug)]
pub struct SessionGuard {
    landing_path: String,
    view: GuardView,
    resolved: bool,
    redirected: bool,
}

impl SessionGuard {
    pub fn new(landing_path: impl Into<String>) -> Self {
        Self {
            landing_path: landing_path.into(),
            view: GuardView::Placeholder,
            resolved: false,
            redirected: false,
        }
    }

    pub fn view(&self) -> &GuardView {
        &self.view
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn on_auth_state(&mut self, state: &AuthState) -> GuardEffect {
        match state {
            AuthState::Unresolved => GuardEffect::None,
            AuthState::SignedIn(ctx) => {
                self.resolved = true;
                self.view = GuardView::Children(ctx.clone());
                GuardEffect::None
            }
            AuthState::SignedOut => {
                self.resolved = true;
                self.view = GuardView::Placeholder;
                if self.redirected {
                    return GuardEffect::None;
                }
                tracing::info!(landing = %self.landing_path, "unauthorized, redirecting");
                self.redirected = true;
                GuardEffect::Redirect(self.landing_path.clone())
            }
        }
    }

    /// Subscribe a fresh guard to `notifier`; the returned handle is the mount.
    ///
    /// Exactly one subscription is taken. Dropping the [`MountedGuard`]
    /// releases it, so no signal reaches a torn-down view.
    pub fn mount<N>(
        landing_path: impl Into<String>,
        notifier: &N,
        navigator: Arc<dyn Navigator>,
    ) -> MountedGuard
    where
        N: AuthStateNotifier + ?Sized,
    {
        let guard = Arc::new(Mutex::new(SessionGuard::new(landing_path)));

        let listener_guard = Arc::clone(&guard);
        let subscription = notifier.subscribe_auth_state(Box::new(move |state| {
            let effect = listener_guard
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .on_auth_state(state);
            if let GuardEffect::Redirect(path) = effect {
                navigator.navigate(&path);
            }
        }));

        MountedGuard {
            guard,
            subscription,
        }
    }
}

pub struct MountedGuard {
    guard: Arc<Mutex<SessionGuard>>,
    subscription: Subscription,
}

impl MountedGuard {
    pub fn view(&self) -> GuardView {
        self.guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .view()
            .clone()
    }

    pub fn unmount(self) {
        self.subscription.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingNavigator {
        visits: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, path: &str) {
            self.visits.lock().unwrap().push(path.to_string());
        }
    }

    fn user() -> SessionContext {
        SessionContext::new("uid_1", "ada@example.com", "id", "refresh", i64::MAX)
    }

    #[test]
    fn placeholder_until_resolved() {
        let mut guard = SessionGuard::new("/");
        assert_eq!(guard.on_auth_state(&AuthState::Unresolved), GuardEffect::None);
        assert_eq!(guard.view(), &GuardView::Placeholder);
        assert!(!guard.is_resolved());
    }

    #[test]
    fn signed_in_renders_children() {
        let mut guard = SessionGuard::new("/");
        guard.on_auth_state(&AuthState::SignedIn(user()));
        assert_eq!(guard.view(), &GuardView::Children(user()));
    }

    #[test]
    fn signed_out_redirects_once() {
        let mut guard = SessionGuard::new("/landing");
        assert_eq!(
            guard.on_auth_state(&AuthState::SignedOut),
            GuardEffect::Redirect("/landing".to_string())
        );
        assert_eq!(guard.on_auth_state(&AuthState::SignedOut), GuardEffect::None);
        assert_eq!(guard.view(), &GuardView::Placeholder);
    }

    #[test]
    fn mounted_guard_follows_notifier_and_detaches_on_unmount() {
        let notifier = Notifier::<AuthState>::new();
        let navigator = Arc::new(RecordingNavigator::default());

        let mounted = SessionGuard::mount("/landing", &notifier, navigator.clone());
        assert_eq!(notifier.listener_count(), 1);
        assert_eq!(mounted.view(), GuardView::Placeholder);

        notifier.notify(&AuthState::SignedIn(user()));
        assert_eq!(mounted.view(), GuardView::Children(user()));

        notifier.notify(&AuthState::SignedOut);
        notifier.notify(&AuthState::SignedOut);
        assert_eq!(*navigator.visits.lock().unwrap(), vec!["/landing"]);

        mounted.unmount();
        assert_eq!(notifier.listener_count(), 0);
    }
}
