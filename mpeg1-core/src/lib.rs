//! # MPEG-1 Core
//!
//! Bit-level primitives shared by the MPEG-1 video decoder:
//! - Error handling types
//! - A refillable bit reader over any blocking byte source
//! - A bit writer for synthesizing streams
//! - Start code scanning helpers

pub mod bitstream;
pub mod error;

pub use bitstream::{BitReader, BitWriter};
pub use error::{BitstreamError, Error, Result};
