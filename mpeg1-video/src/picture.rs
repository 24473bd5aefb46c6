//! Planar picture buffers and the three-slot reference store.
//!
//! Pictures are stored with macroblock-aligned planes, so every macroblock of
//! the grid has an in-bounds destination. Prediction reads go through
//! bounds-checked [`PlaneView`]s; a vector pointing outside the reference
//! picture is reported as [`Mpeg1Error::MotionVectorOutOfBounds`].

use crate::error::{Mpeg1Error, Result};
use crate::motion::Displacement;

/// Initial luma sample value of a new picture.
const LUMA_FILL: u8 = 0;
/// Initial chroma sample value of a new picture (no colour).
const CHROMA_FILL: u8 = 128;

/// One plane of 8-bit samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl Plane {
    /// Create a plane filled with `value`.
    pub fn new(width: usize, height: usize, value: u8) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Width in samples.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in samples.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Distance between vertically adjacent samples.
    pub fn stride(&self) -> usize {
        self.width
    }

    /// All samples, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// One row of samples.
    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Sample at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    fn bounds(&self, x: i64, y: i64, width: usize, height: usize) -> Option<usize> {
        if x < 0 || y < 0 || width == 0 || height == 0 {
            return None;
        }
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        if x + width > self.width || y + height > self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    /// Borrow a rectangle, or `None` if it does not lie inside the plane.
    pub fn view(&self, x: i64, y: i64, width: usize, height: usize) -> Option<PlaneView<'_>> {
        let offset = self.bounds(x, y, width, height)?;
        let end = offset + (height - 1) * self.width + width;
        Some(PlaneView {
            data: &self.data[offset..end],
            stride: self.width,
            width,
            height,
        })
    }

    /// Mutably borrow a rectangle, or `None` if it does not lie inside the plane.
    pub fn view_mut(
        &mut self,
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    ) -> Option<PlaneViewMut<'_>> {
        let offset = self.bounds(x, y, width, height)?;
        let end = offset + (height - 1) * self.width + width;
        Some(PlaneViewMut {
            data: &mut self.data[offset..end],
            stride: self.width,
            width,
            height,
        })
    }
}

/// A read-only rectangle of a [`Plane`].
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a> {
    data: &'a [u8],
    stride: usize,
    width: usize,
    height: usize,
}

impl<'a> PlaneView<'a> {
    /// Width of the rectangle.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the rectangle.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row `y` of the rectangle.
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }
}

/// A writable rectangle of a [`Plane`].
#[derive(Debug)]
pub struct PlaneViewMut<'a> {
    data: &'a mut [u8],
    stride: usize,
    width: usize,
    height: usize,
}

impl PlaneViewMut<'_> {
    /// Height of the rectangle.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row `y` of the rectangle.
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    /// Overwrite the rectangle from a packed `width * height` buffer.
    pub fn fill_from(&mut self, samples: &[u8]) {
        let width = self.width;
        for (y, src) in samples.chunks_exact(width).take(self.height).enumerate() {
            self.row_mut(y).copy_from_slice(src);
        }
    }
}

#[inline]
fn average2(a: u8, b: u8) -> u8 {
    ((u16::from(a) + u16::from(b) + 1) >> 1) as u8
}

#[inline]
fn average4(a: u8, b: u8, c: u8, d: u8) -> u8 {
    ((u16::from(a) + u16::from(b) + u16::from(c) + u16::from(d) + 2) >> 2) as u8
}

#[inline]
fn saturate(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// Form the `size` x `size` prediction of the block at `(x, y)` displaced by `d`.
fn predict(
    reference: &Plane,
    x: usize,
    y: usize,
    size: usize,
    d: Displacement,
    out: &mut [u8],
) -> Result<()> {
    let sx = x as i64 + i64::from(d.x);
    let sy = y as i64 + i64::from(d.y);
    let width = size + usize::from(d.half_x);
    let height = size + usize::from(d.half_y);
    let src = reference
        .view(sx, sy, width, height)
        .ok_or(Mpeg1Error::MotionVectorOutOfBounds { x: sx, y: sy })?;

    for (row, dst) in out.chunks_exact_mut(size).take(size).enumerate() {
        let a = src.row(row);
        match (d.half_x, d.half_y) {
            (false, false) => dst.copy_from_slice(&a[..size]),
            (true, false) => {
                for (i, sample) in dst.iter_mut().enumerate() {
                    *sample = average2(a[i], a[i + 1]);
                }
            }
            (false, true) => {
                let b = src.row(row + 1);
                for (i, sample) in dst.iter_mut().enumerate() {
                    *sample = average2(a[i], b[i]);
                }
            }
            (true, true) => {
                let b = src.row(row + 1);
                for (i, sample) in dst.iter_mut().enumerate() {
                    *sample = average4(a[i], a[i + 1], b[i], b[i + 1]);
                }
            }
        }
    }
    Ok(())
}

/// Macroblock-sized prediction for all three planes.
struct Prediction {
    luma: [u8; 256],
    cb: [u8; 64],
    cr: [u8; 64],
}

impl Prediction {
    fn new() -> Self {
        Self {
            luma: [0; 256],
            cb: [0; 64],
            cr: [0; 64],
        }
    }

    fn average_with(&mut self, other: &Prediction) {
        let pairs = self
            .luma
            .iter_mut()
            .zip(other.luma.iter())
            .chain(self.cb.iter_mut().zip(other.cb.iter()))
            .chain(self.cr.iter_mut().zip(other.cr.iter()));
        for (a, &b) in pairs {
            *a = average2(*a, b);
        }
    }
}

/// A decoded or in-progress picture: one luma and two quarter-size chroma planes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    luma: Plane,
    cb: Plane,
    cr: Plane,
    mb_width: usize,
    mb_height: usize,
}

impl Picture {
    /// Allocate a picture covering `mb_width` x `mb_height` macroblocks.
    pub fn new(mb_width: usize, mb_height: usize) -> Self {
        Self {
            luma: Plane::new(mb_width * 16, mb_height * 16, LUMA_FILL),
            cb: Plane::new(mb_width * 8, mb_height * 8, CHROMA_FILL),
            cr: Plane::new(mb_width * 8, mb_height * 8, CHROMA_FILL),
            mb_width,
            mb_height,
        }
    }

    /// Luma plane.
    pub fn luma(&self) -> &Plane {
        &self.luma
    }

    /// Cb plane.
    pub fn cb(&self) -> &Plane {
        &self.cb
    }

    /// Cr plane.
    pub fn cr(&self) -> &Plane {
        &self.cr
    }

    /// Width in macroblocks.
    pub fn mb_width(&self) -> usize {
        self.mb_width
    }

    /// Height in macroblocks.
    pub fn mb_height(&self) -> usize {
        self.mb_height
    }

    /// Number of macroblocks.
    pub fn mb_count(&self) -> usize {
        self.mb_width * self.mb_height
    }

    /// Luma origin of the macroblock at `address`.
    fn origin(&self, address: usize) -> Result<(usize, usize)> {
        if address >= self.mb_count() {
            return Err(self.out_of_range(address));
        }
        Ok((
            (address % self.mb_width) * 16,
            (address / self.mb_width) * 16,
        ))
    }

    fn out_of_range(&self, address: usize) -> Mpeg1Error {
        Mpeg1Error::MacroblockAddressOutOfRange {
            address: address as i64,
            count: self.mb_count(),
        }
    }

    fn store(&mut self, address: usize, x: usize, y: usize, prediction: &Prediction) -> Result<()> {
        let (x, y) = (x as i64, y as i64);
        let count = self.mb_count();
        let missing = || Mpeg1Error::MacroblockAddressOutOfRange {
            address: address as i64,
            count,
        };
        self.luma
            .view_mut(x, y, 16, 16)
            .ok_or_else(missing)?
            .fill_from(&prediction.luma);
        self.cb
            .view_mut(x / 2, y / 2, 8, 8)
            .ok_or_else(missing)?
            .fill_from(&prediction.cb);
        self.cr
            .view_mut(x / 2, y / 2, 8, 8)
            .ok_or_else(missing)?
            .fill_from(&prediction.cr);
        Ok(())
    }

    fn predict_macroblock(
        reference: &Picture,
        x: usize,
        y: usize,
        luma: Displacement,
        chroma: Displacement,
    ) -> Result<Prediction> {
        let mut prediction = Prediction::new();
        predict(&reference.luma, x, y, 16, luma, &mut prediction.luma)?;
        predict(&reference.cb, x / 2, y / 2, 8, chroma, &mut prediction.cb)?;
        predict(&reference.cr, x / 2, y / 2, 8, chroma, &mut prediction.cr)?;
        Ok(prediction)
    }

    /// Copy the co-located macroblock of `reference` with zero motion.
    pub fn copy_macroblock(&mut self, reference: &Picture, address: usize) -> Result<()> {
        self.compensate(reference, address, Displacement::ZERO, Displacement::ZERO)
    }

    /// Predict the macroblock at `address` from `reference` displaced by the
    /// given luma and chroma vectors.
    pub fn compensate(
        &mut self,
        reference: &Picture,
        address: usize,
        luma: Displacement,
        chroma: Displacement,
    ) -> Result<()> {
        let (x, y) = self.origin(address)?;
        let prediction = Self::predict_macroblock(reference, x, y, luma, chroma)?;
        self.store(address, x, y, &prediction)
    }

    /// Predict the macroblock at `address` as the average of a forward and a
    /// backward prediction.
    pub fn interpolate(
        &mut self,
        address: usize,
        forward: (&Picture, Displacement, Displacement),
        backward: (&Picture, Displacement, Displacement),
    ) -> Result<()> {
        let (x, y) = self.origin(address)?;
        let mut prediction = Self::predict_macroblock(forward.0, x, y, forward.1, forward.2)?;
        let other = Self::predict_macroblock(backward.0, x, y, backward.1, backward.2)?;
        prediction.average_with(&other);
        self.store(address, x, y, &prediction)
    }

    /// Plane and sample origin of block `block` (0-5) of a macroblock.
    fn block_target(&mut self, address: usize, block: usize) -> Result<(&mut Plane, usize, usize)> {
        let (x, y) = self.origin(address)?;
        Ok(match block {
            0..=3 => (&mut self.luma, x + (block & 1) * 8, y + (block >> 1) * 8),
            4 => (&mut self.cb, x / 2, y / 2),
            _ => (&mut self.cr, x / 2, y / 2),
        })
    }

    fn apply_block(
        &mut self,
        address: usize,
        block: usize,
        samples: &[i32; 64],
        op: impl Fn(u8, i32) -> u8,
    ) -> Result<()> {
        let missing = self.out_of_range(address);
        let (plane, x, y) = self.block_target(address, block)?;
        let mut view = plane.view_mut(x as i64, y as i64, 8, 8).ok_or(missing)?;
        for (row, src) in samples.chunks_exact(8).enumerate() {
            for (dst, &value) in view.row_mut(row).iter_mut().zip(src) {
                *dst = op(*dst, value);
            }
        }
        Ok(())
    }

    /// Overwrite an 8x8 block with reconstructed samples.
    pub fn set_block(&mut self, address: usize, block: usize, samples: &[i32; 64]) -> Result<()> {
        self.apply_block(address, block, samples, |_, value| saturate(value))
    }

    /// Add a residual to an 8x8 block of the prediction.
    pub fn correct_block(
        &mut self,
        address: usize,
        block: usize,
        residual: &[i32; 64],
    ) -> Result<()> {
        self.apply_block(address, block, residual, |sample, value| {
            saturate(i32::from(sample) + value)
        })
    }
}

/// Three picture buffers with rotating current/previous/future roles.
///
/// `previous` and `future` are the two most recent reference pictures in
/// coding order. B pictures read both and never change them.
#[derive(Debug, Clone)]
pub struct PictureStore {
    slots: [Picture; 3],
    current: usize,
    previous: Option<usize>,
    future: Option<usize>,
}

impl PictureStore {
    /// Allocate three pictures of the given macroblock dimensions.
    pub fn new(mb_width: usize, mb_height: usize) -> Self {
        Self {
            slots: [
                Picture::new(mb_width, mb_height),
                Picture::new(mb_width, mb_height),
                Picture::new(mb_width, mb_height),
            ],
            current: 0,
            previous: None,
            future: None,
        }
    }

    /// Width in macroblocks.
    pub fn mb_width(&self) -> usize {
        self.slots[0].mb_width()
    }

    /// Height in macroblocks.
    pub fn mb_height(&self) -> usize {
        self.slots[0].mb_height()
    }

    /// The picture being reconstructed.
    pub fn current(&self) -> &Picture {
        &self.slots[self.current]
    }

    /// Slot of the picture being reconstructed.
    pub fn current_slot(&self) -> usize {
        self.current
    }

    /// Slot of the older reference picture.
    pub fn previous_slot(&self) -> Option<usize> {
        self.previous
    }

    /// Slot of the newer reference picture.
    pub fn future_slot(&self) -> Option<usize> {
        self.future
    }

    /// Forget both reference pictures.
    pub fn clear_references(&mut self) {
        self.previous = None;
        self.future = None;
    }

    /// At the start of an I or P picture, the newer reference becomes the
    /// one the picture predicts from.
    pub fn promote_future(&mut self) {
        if let Some(future) = self.future {
            self.previous = Some(future);
        }
    }

    /// Record the finished current picture as a reference and move on.
    pub fn advance(&mut self) {
        if self.previous.is_none() {
            self.previous = Some(self.current);
        } else {
            self.future = Some(self.current);
        }
        self.current = (self.current + 1) % self.slots.len();
    }

    /// Borrow the current picture mutably together with both references.
    pub fn split(&mut self) -> (&mut Picture, Option<&Picture>, Option<&Picture>) {
        let [s0, s1, s2] = &mut self.slots;
        let (current, others): (&mut Picture, [Option<&Picture>; 3]) = match self.current {
            0 => (s0, [None, Some(&*s1), Some(&*s2)]),
            1 => (s1, [Some(&*s0), None, Some(&*s2)]),
            _ => (s2, [Some(&*s0), Some(&*s1), None]),
        };
        let previous = self.previous.and_then(|i| others[i]);
        let future = self.future.and_then(|i| others[i]);
        (current, previous, future)
    }
}
