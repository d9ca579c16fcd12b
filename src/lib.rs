//! tiercat - two-tier category taxonomy and theming engine
//!
//! This crate provides the core functionality for the `tiercat` CLI tool:
//! project categories organised as main categories (tier1) with
//! subcategories (tier2), global templates, presets, color themes and
//! task assignments.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (templates, categories, themes, assignments)
//! - [`storage`] - SQLite database layer
//! - [`taxonomy`] - Resolver, registry, presets, themes, assignments, guard
//! - [`config`] - Configuration management
//! - [`validate`] - Input normalization
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod taxonomy;
pub mod validate;

pub use error::{Error, Result};

/// Global silent mode flag for `--silent` output.
///
/// When set, commands print only IDs or names instead of full output.
/// Avoids threading a `silent` bool through every handler signature.
pub static SILENT: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Global dry-run flag for `--dry-run`.
///
/// When set, mutate commands preview what would happen without writing.
pub static DRY_RUN: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Check if silent mode is active.
#[inline]
pub fn is_silent() -> bool {
    SILENT.load(std::sync::atomic::Ordering::Relaxed)
}

/// Check if dry-run mode is active.
#[inline]
pub fn is_dry_run() -> bool {
    DRY_RUN.load(std::sync::atomic::Ordering::Relaxed)
}
