#![doc = "unity-docs-index-core: core pipeline for unity-docs-index."]

//! Fetches a versioned Unity documentation archive, lays it out canonically,
//! renders a compact index of its pages and injects that index into a notes file.
//!
//! # Usage
//! The CLI crate calls [`synchronise::synchronise`]; every step is also usable on its own.

pub mod config;
pub mod contract;
pub mod download;
pub mod import;
pub mod index;
pub mod inject;
pub mod layout;
pub mod status;
pub mod synchronise;
pub mod version;
