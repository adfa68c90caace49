//! The navigator implementations.
//!
//! - [`SingleSceneNavigator`]: one scene for its whole life
//! - [`StackNavigator`]: push / pop / replace over a stack of scenes
//! - [`WizardNavigator`]: next / previous over a lazily created sequence
//! - [`CompositeStackNavigator`]: a stack of child navigators
//! - [`CompositeReplacingNavigator`]: one replaceable child navigator

mod child;
pub mod composite_replacing;
pub mod composite_stack;
pub mod single_scene;
pub mod stack;
pub mod wizard;

pub use composite_replacing::{CompositeReplacingNavigator, CompositeReplacingNavigatorBuilder};
pub use composite_stack::{CompositeStackNavigator, CompositeStackNavigatorBuilder};
pub use single_scene::{SingleSceneNavigator, SingleSceneNavigatorBuilder};
pub use stack::{StackNavigator, StackNavigatorBuilder};
pub use wizard::{WizardNavigator, WizardNavigatorBuilder, WizardSteps};
