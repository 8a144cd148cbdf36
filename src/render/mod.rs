//! Renderers behind the embedded views: math typesetting with its cache.
//!
//! Code highlighting lives in [`crate::highlight`] and image loading in
//! [`crate::image`].

pub mod math;

pub use math::{MathCache, PlainTypesetter, TypesetError, Typesetter};
