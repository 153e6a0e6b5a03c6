#![doc = "repodocs-core: documentation synthesis pipeline for repodocs."]

//! This crate contains every piece of the pipeline that turns a set of
//! component repositories into a static documentation tree:
//!
//! - [`sync`]: bring each repository's working copy to the tip of its default branch
//! - [`build`]: optional release build of a working copy
//! - [`extract`]: rule/refactoring descriptors harvested from a build artifact
//! - [`scan`] and [`existing`]: pages inferred from directory conventions or copied as-is
//! - [`render`]: pure page and navigation rendering
//! - [`writer`]: idempotent, change-counting file writes
//! - [`generate`]: the orchestrator tying the steps together
//!
//! The CLI crate only parses arguments, loads configuration and calls
//! [`generate::DocsGenerator::generate`].

pub mod build;
pub mod config;
pub mod contract;
pub mod existing;
pub mod extract;
pub mod generate;
mod process;
pub mod render;
pub mod scan;
pub mod sync;
mod walk;
pub mod writer;
