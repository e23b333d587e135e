//! Backdrop turns an arbitrary photo into a fixed-size poster.
//!
//! The image is fitted onto the canvas without distortion and centered over a
//! background made from a stretched, blurred copy of itself, tinted with either a
//! fixed color or one sampled from the image.
//!
//! - [`process`] is the whole pipeline, bytes in and encoded bytes out.
//! - [`render`] stops before encoding and returns the composite [`Bitmap`].
//! - [`Workers`] runs many invocations on a bounded thread pool.
#![forbid(unsafe_code)]

pub mod codec;
pub mod color;
pub mod config;
pub mod effects;
mod foundation;
pub mod pipeline;
pub mod render;
pub mod workers;

pub use crate::codec::{DecodeLimits, OutputFormat, decode, encode};
pub use crate::color::mix::{AlphaMode, mix};
pub use crate::color::sample::{SampleStrategy, sample};
pub use crate::config::PipelineConfig;
pub use crate::effects::blend::BlendMode;
pub use crate::foundation::core::{Bitmap, Color, Point, Rect, Size};
pub use crate::foundation::error::{BackdropError, BackdropResult, ErrorKind};
pub use crate::pipeline::{Stage, process, render};
pub use crate::render::background::{BackgroundLook, DEFAULT_TINT, TintSource, synthesize};
pub use crate::render::compose::{ScalePolicy, compose, fit_size};
pub use crate::workers::Workers;
