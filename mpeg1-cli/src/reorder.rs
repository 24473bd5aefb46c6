//! Coding order to display order.

use mpeg1_video::{DecodedPicture, PictureType};

/// Anything that knows its coding type.
pub trait Coded {
    /// Coding type of the picture.
    fn picture_type(&self) -> PictureType;
}

impl Coded for DecodedPicture {
    fn picture_type(&self) -> PictureType {
        DecodedPicture::picture_type(self)
    }
}

/// Holds back each reference picture until the next one arrives.
///
/// B pictures are displayed before the reference decoded ahead of them, so
/// they pass straight through while the reference waits.
#[derive(Debug)]
pub struct DisplayOrder<T> {
    held: Option<T>,
}

impl<T> Default for DisplayOrder<T> {
    fn default() -> Self {
        Self { held: None }
    }
}

impl<T: Coded> DisplayOrder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept the next picture in coding order; returns the picture that is
    /// due for display, if any.
    pub fn push(&mut self, picture: T) -> Option<T> {
        if picture.picture_type().is_reference() {
            self.held.replace(picture)
        } else {
            Some(picture)
        }
    }

    /// Release the last held reference at the end of the stream.
    pub fn finish(&mut self) -> Option<T> {
        self.held.take()
    }
}
