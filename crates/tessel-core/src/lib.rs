//! Tessel Core
//!
//! This crate contains the shared utilities for the Tessel UI toolkit:
//! collections, math re-exports, geometry primitives, logging, profiling and
//! configuration.

pub mod alloc;
pub mod config;
pub mod geometry;
pub mod logging;
pub mod math;
pub mod profiling;
