//! Decoded pictures and the bounded hand-off queue.

use std::io::{self, Write};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::error::{Mpeg1Error, Result};
use crate::picture::{Picture, Plane};
use crate::types::{PictureHeader, PictureType};

/// Default number of pictures the queue holds before the decoder blocks.
pub const DEFAULT_QUEUE_CAPACITY: usize = 3;

/// A finished picture as handed to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPicture {
    picture_type: PictureType,
    temporal_reference: u16,
    decode_index: u64,
    width: u32,
    height: u32,
    luma: Plane,
    cb: Plane,
    cr: Plane,
}

impl DecodedPicture {
    /// Snapshot a reconstructed picture.
    pub(crate) fn new(
        picture: &Picture,
        header: &PictureHeader,
        width: u32,
        height: u32,
        decode_index: u64,
    ) -> Self {
        Self {
            picture_type: header.picture_type,
            temporal_reference: header.temporal_reference,
            decode_index,
            width,
            height,
            luma: picture.luma().clone(),
            cb: picture.cb().clone(),
            cr: picture.cr().clone(),
        }
    }

    /// Coding type.
    pub fn picture_type(&self) -> PictureType {
        self.picture_type
    }

    /// Temporal reference from the picture header.
    pub fn temporal_reference(&self) -> u16 {
        self.temporal_reference
    }

    /// Position in coding order, counted from 0 across the whole stream.
    pub fn decode_index(&self) -> u64 {
        self.decode_index
    }

    /// Display width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Display height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Macroblock-aligned luma plane.
    pub fn luma(&self) -> &Plane {
        &self.luma
    }

    /// Macroblock-aligned Cb plane.
    pub fn cb(&self) -> &Plane {
        &self.cb
    }

    /// Macroblock-aligned Cr plane.
    pub fn cr(&self) -> &Plane {
        &self.cr
    }

    /// Size in bytes of the I420 frame written by [`write_i420`](Self::write_i420).
    pub fn i420_size(&self) -> usize {
        let (w, h) = (self.width as usize, self.height as usize);
        let (cw, ch) = ((w + 1) / 2, (h + 1) / 2);
        w * h + 2 * cw * ch
    }

    /// Write the Y, Cb and Cr planes cropped to the display size.
    pub fn write_i420<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let (w, h) = (self.width as usize, self.height as usize);
        write_cropped(out, &self.luma, w, h)?;
        write_cropped(out, &self.cb, (w + 1) / 2, (h + 1) / 2)?;
        write_cropped(out, &self.cr, (w + 1) / 2, (h + 1) / 2)
    }
}

fn write_cropped<W: Write>(out: &mut W, plane: &Plane, width: usize, height: usize) -> io::Result<()> {
    let width = width.min(plane.width());
    for y in 0..height.min(plane.height()) {
        out.write_all(&plane.row(y)[..width])?;
    }
    Ok(())
}

/// Create a bounded picture queue. A capacity of 0 is raised to 1.
pub fn picture_queue(capacity: usize) -> (PictureSender, PictureReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    (PictureSender { inner: tx }, PictureReceiver { inner: rx })
}

/// Producer side of the picture queue.
#[derive(Debug, Clone)]
pub struct PictureSender {
    inner: Sender<DecodedPicture>,
}

impl PictureSender {
    /// Queue a picture, blocking while the queue is full.
    pub fn send(&self, picture: DecodedPicture) -> Result<()> {
        self.inner
            .send(picture)
            .map_err(|_| Mpeg1Error::OutputClosed)
    }

    /// Number of pictures waiting.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if no pictures are waiting.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Consumer side of the picture queue.
#[derive(Debug, Clone)]
pub struct PictureReceiver {
    inner: Receiver<DecodedPicture>,
}

impl PictureReceiver {
    /// Wait for the next picture. Returns `None` once the decoder has
    /// finished and the queue is drained.
    pub fn recv(&self) -> Option<DecodedPicture> {
        self.inner.recv().ok()
    }

    /// Take a picture if one is waiting.
    pub fn try_recv(&self) -> Option<DecodedPicture> {
        self.inner.try_recv().ok()
    }

    /// Number of pictures waiting.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if no pictures are waiting.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Maximum number of waiting pictures.
    pub fn capacity(&self) -> usize {
        self.inner.capacity().unwrap_or(DEFAULT_QUEUE_CAPACITY)
    }
}

impl IntoIterator for PictureReceiver {
    type Item = DecodedPicture;
    type IntoIter = crossbeam_channel::IntoIter<DecodedPicture>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a> IntoIterator for &'a PictureReceiver {
    type Item = DecodedPicture;
    type IntoIter = crossbeam_channel::Iter<'a, DecodedPicture>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}
