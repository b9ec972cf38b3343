//! Canonical machine shared types.
//!
//! Organized by domain: axis types, G-code modal enums, machine and
//! sub-state enums, the canonical error type, and configuration structures.

pub mod axis;
pub mod config;
pub mod error;
pub mod modal;
pub mod state;
