#![doc = "bookpress-core: core build pipeline for bookpress."]

//! This crate contains all build logic, data models and pipelines for
//! bookpress: the format-profile configuration model, invocation composition,
//! the document-engine seam, asset tasks, the watch loop, the preview server
//! and packaging. CLI concerns live in the `bookpress` crate.
//!
//! # Usage
//! Add this as a dependency for all shared pipeline, configuration and build
//! coordination code.

pub mod assets;
pub mod build;
pub mod config;
pub mod contract;
pub mod engine;
pub mod package;
pub mod serve;
pub mod watch;
