//! Waypoint: navigator state machines for moving between scenes.
//!
//! - [`navigation`]: navigators, events and the restore factories
//! - [`presentation`]: scenes and the containers hosts attach to them
//! - [`state`]: the key-value saved state everything persists into
//! - [`core`]: configuration, injected logging and snapshot files
//! - [`console`]: a line-oriented host driving a root navigator

pub mod console;
pub mod core;
pub mod navigation;
pub mod presentation;
pub mod state;

#[cfg(test)]
pub mod test_support;
