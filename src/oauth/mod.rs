//! OAuth2 token lifecycle: validity checks, refresh orchestration, and the
//! universal token schema all integrations converge to.

mod gate;
mod hooks;
mod lifecycle;
mod owner;
mod refresh;
mod schema;

pub use gate::{gate, GateResult};
pub use hooks::IntegrationHooks;
pub use lifecycle::{Manager, RefreshOutcome};
pub use owner::{OwnerKind, ResourceOwner};
pub use refresh::Refresher;
pub use schema::{normalize, TokenObject};
