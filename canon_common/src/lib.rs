//! Canonical machine common library
//!
//! Shared types for the canonical-machine workspace: G-code modal enums,
//! machine and sub-state machine enums, axis vectors and flags, the
//! canonical error type, configuration structures and the TOML loader.
//!
//! # Module Structure
//!
//! - [`machine`] - Modal/state enums, axis types, errors and machine configuration
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - System-wide constants
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use canon_common::prelude::*;
//!
//! let v = AxisVector::new(1.0, 2.0, 3.0, 0.0, 0.0, 0.0);
//! assert_eq!(v[Axis::Y], 2.0);
//! ```

pub mod config;
pub mod consts;
pub mod machine;
pub mod prelude;
