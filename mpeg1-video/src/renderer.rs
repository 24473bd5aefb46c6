//! Stream parameter notifications.

/// Receives the parameters of every sequence header.
///
/// Only [`set_size`](VideoRenderer::set_size) has to be implemented; the
/// remaining notifications are advisory.
pub trait VideoRenderer: Send {
    /// Display size in pixels.
    fn set_size(&mut self, width: u32, height: u32);

    /// pel_aspect_ratio code (see [`crate::types::pixel_aspect_ratio`]).
    fn set_pixel_aspect_ratio(&mut self, _code: u8) {}

    /// picture_rate code (see [`crate::types::picture_rate`]).
    fn set_picture_rate(&mut self, _code: u8) {}

    /// bit_rate field in units of 400 bit/s.
    fn set_bit_rate(&mut self, _bit_rate: u32) {}
}

/// A renderer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl VideoRenderer for NullRenderer {
    fn set_size(&mut self, _width: u32, _height: u32) {}
}

impl<T: VideoRenderer + ?Sized> VideoRenderer for Box<T> {
    fn set_size(&mut self, width: u32, height: u32) {
        (**self).set_size(width, height);
    }

    fn set_pixel_aspect_ratio(&mut self, code: u8) {
        (**self).set_pixel_aspect_ratio(code);
    }

    fn set_picture_rate(&mut self, code: u8) {
        (**self).set_picture_rate(code);
    }

    fn set_bit_rate(&mut self, bit_rate: u32) {
        (**self).set_bit_rate(bit_rate);
    }
}
