//! # Presentation
//!
//! Scenes are the units of presentation logic a navigator moves between.
//! A scene knows nothing about how it is drawn: the host attaches a
//! [`Container`] to the active scene and detaches it again when the scene
//! goes away.
//!
//! ```text
//!   Created ──start──► Started ◄──start/stop──► Stopped
//!      │                  │                       │
//!      └──────────────────┴───────destroy─────────┴──► Destroyed
//! ```
//!
//! ## Modules
//!
//! - [`scene`]: the `Scene` trait, `SceneKey` and the shared `SceneRef` handle
//! - [`lifecycle`]: a small tracker scenes embed to make lifecycle calls idempotent
//! - [`container`]: the `Container` capability and `BasicScene`, which keeps
//!   container-local state alive between attachments

pub mod container;
pub mod lifecycle;
pub mod scene;

pub use container::{BasicScene, Container};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use scene::{SaveableScene, Scene, SceneKey, SceneRef, same_scene, scene_ref};
