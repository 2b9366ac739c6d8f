//! devpack - runtime acquisition helpers for dev container builds
//!
//! This library provides three independent building blocks:
//! - Version range resolution against a versions manifest (`version`)
//! - Layered merging of devcontainer.json documents (`devcontainer`)
//! - tar.gz extraction with path-traversal protection (`archive`)

pub mod archive;
pub mod cli;
pub mod commands;
pub mod config;
pub mod devcontainer;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod progress;
pub mod version;
