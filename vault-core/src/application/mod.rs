//! Application layer: the operation facade and the lifecycle event fan-out.

pub mod events;
pub mod vault;

pub use events::{KeyEventBus, KeyEventSubscription};
pub use vault::{PublicKeyInfo, RotationOutcome, SignOutcome, Vault};
