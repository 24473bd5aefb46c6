//! # mpeg1-video
//!
//! ISO/IEC 11172-2 (MPEG-1) video decoder.
//!
//! This crate provides:
//! - Sequence, group of pictures and picture header parsing
//! - Static VLC tables for every MPEG-1 syntax element
//! - Differential motion vector reconstruction with half-pel prediction
//! - Bit-exact fixed-point inverse DCT
//! - I, P, B and D picture reconstruction with a three-picture reference store
//! - A bounded picture queue for handing pictures to a consumer thread
//!
//! Pictures leave the decoder in coding order; reordering B pictures for
//! display is up to the consumer.
//!
//! ## Example
//!
//! ```rust,ignore
//! use mpeg1_video::{Mpeg1Decoder, NullRenderer};
//!
//! let file = std::fs::File::open("clip.m1v")?;
//! let (mut decoder, pictures) = Mpeg1Decoder::new(file, NullRenderer);
//! std::thread::spawn(move || {
//!     for picture in pictures {
//!         println!("{} picture {}", picture.picture_type(), picture.decode_index());
//!     }
//! });
//! let summary = decoder.decode()?;
//! println!("{} pictures", summary.pictures());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]

pub mod decoder;
pub mod error;
pub mod idct;
pub mod motion;
pub mod output;
pub mod parser;
pub mod picture;
pub mod quant;
pub mod renderer;
pub mod types;
pub mod vlc;

pub use decoder::{DecodeSummary, Mpeg1Decoder, Mpeg1DecoderConfig};
pub use error::{Mpeg1Error, Result, VlcTable};
pub use output::{picture_queue, DecodedPicture, PictureReceiver, PictureSender};
pub use parser::probe_sequence_header;
pub use picture::{Picture, PictureStore, Plane};
pub use renderer::{NullRenderer, VideoRenderer};
pub use types::*;
