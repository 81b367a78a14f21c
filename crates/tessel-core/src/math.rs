//! Math types used across the toolkit.
//!
//! Re-exports the SIMD-accelerated [`glam`] types. Positions and offsets are
//! [`Vec2`]; colors are stored as linear RGBA [`Vec4`].
//!
//! ```
//! use tessel_core::math::Vec2;
//!
//! let touch = Vec2::new(120.0, 48.0);
//! let origin = Vec2::new(100.0, 40.0);
//! assert_eq!(touch - origin, Vec2::new(20.0, 8.0));
//! ```
//!
//! [`glam`]: https://docs.rs/glam

pub use glam::{Vec2, Vec4};
