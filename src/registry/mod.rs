//! # Registries
//!
//! Lookup tables consulted while a task runs:
//!
//! - **CallbackRegistry**: lifecycle hooks per [`CallbackType`]
//! - **CoercionRegistry**: type coercions keyed by [`CoercionType`]
//! - **ValidatorRegistry**: validators keyed by [`ValidatorKey`]
//! - **EventRegistry**: event subscribers with wildcard pattern matching

pub mod callback_registry;
pub mod coercion_registry;
pub mod event_registry;
pub mod validator_registry;

pub use callback_registry::{Callback, CallbackRegistry, CallbackType};
pub use coercion_registry::{Coercion, CoercionError, CoercionRegistry, CoercionType};
pub use event_registry::{EventRegistry, EventSubscriber, SubscriberStats};
pub use validator_registry::{ValidationError, Validator, ValidatorKey, ValidatorRegistry};
