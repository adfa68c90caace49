//! # Core Services
//!
//! The ambient concerns around the navigators. None of these know about
//! scenes or navigation rules.
//!
//! ```text
//!     ┌────────────┐   ┌────────────┐   ┌────────────┐
//!     │   config   │   │   logger   │   │  snapshot  │
//!     │ TOML + env │   │ injected   │   │ JSON file, │
//!     │ + CLI      │   │ Rc<dyn ..> │   │ atomic     │
//!     └─────┬──────┘   └─────┬──────┘   └─────┬──────┘
//!           │                │                │
//!           ▼                ▼                ▼
//!        main.rs        navigators       console host
//! ```
//!
//! ## Modules
//!
//! - [`config`]: `~/.waypoint/config.toml` and its override hierarchy
//! - [`logger`]: the `Logger` capability handed to every navigator
//! - [`snapshot`]: on-disk persistence of a root navigator's saved state

pub mod config;
pub mod logger;
pub mod snapshot;
