//! # Navigation
//!
//! Navigators are state machines deciding which scene is active. The host
//! drives the root navigator's lifecycle and listens for events; every
//! navigator drives its own scenes or child navigators.
//!
//! ```text
//!   host ──start/stop/destroy/back──► root navigator
//!     ▲                                   │ start/stop/destroy
//!     │                                   ▼
//!     └─── SceneChanged / Finished ◄── child navigators ──► scenes
//! ```
//!
//! Every navigator is a tagged state `{Inactive, Active, Destroyed}` with
//! pure transition functions (see the `effect` module). Operations on a destroyed
//! navigator are ignored and logged at warning level. An operation requested
//! while another one runs waits for it (see the `schedule` module).
//!
//! ## Modules
//!
//! - [`navigator`]: the `Navigator` trait, capabilities and restore factories
//! - [`event`]: `NavigatorEvent`, `TransitionData` and listener handles
//! - [`navigators`]: the concrete navigators
//! - [`error`]: construction and restore errors

pub mod error;
pub mod event;
pub mod navigator;
pub mod navigators;

pub(crate) mod effect;
pub(crate) mod non_empty;
pub(crate) mod saved;
pub(crate) mod schedule;

pub use error::NavigatorError;
pub use event::{Direction, Listener, ListenerHandle, NavigatorEvent, TransitionData};
pub use navigator::{
    BackPressHandler, Navigator, NavigatorFactory, NavigatorKey, NavigatorRef, SaveableNavigator,
    SceneFactory,
};
pub use navigators::{
    CompositeReplacingNavigator, CompositeStackNavigator, SingleSceneNavigator, StackNavigator,
    WizardNavigator, WizardSteps,
};
