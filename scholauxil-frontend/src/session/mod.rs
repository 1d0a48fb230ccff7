pub mod context;
pub mod guard;
pub mod identity;

pub use context::SessionContext;
pub use guard::{AuthState, GuardEffect, GuardView, MountedGuard, Navigator, SessionGuard};
pub use identity::{IdentityError, IdentityProvider, IssuedTokens};
