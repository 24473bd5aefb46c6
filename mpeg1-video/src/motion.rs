//! Differential motion vector reconstruction.

use crate::types::MotionCode;

/// A prediction offset in whole samples plus half-sample flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Displacement {
    /// Horizontal offset in whole samples (floor of the half-sample value).
    pub x: i32,
    /// Vertical offset in whole samples.
    pub y: i32,
    /// Average with the sample to the right.
    pub half_x: bool,
    /// Average with the sample below.
    pub half_y: bool,
}

impl Displacement {
    /// No motion.
    pub const ZERO: Self = Self {
        x: 0,
        y: 0,
        half_x: false,
        half_y: false,
    };

    /// Split a vector given in half-sample units.
    pub fn from_half_pel(x: i32, y: i32) -> Self {
        Self {
            x: x >> 1,
            y: y >> 1,
            half_x: x & 1 != 0,
            half_y: y & 1 != 0,
        }
    }
}

/// Motion vector predictor state for one prediction direction.
///
/// The predictor holds the last reconstructed vector of the slice; each new
/// vector is coded as a difference against it, modulo the range selected by
/// the picture's f_code.
#[derive(Debug, Clone)]
pub struct MotionVector {
    f: i32,
    full_pel: bool,
    previous_x: i32,
    previous_y: i32,
    luma: Displacement,
    chroma: Displacement,
}

impl Default for MotionVector {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionVector {
    /// Create a predictor with `f = 1` and zero state.
    pub fn new() -> Self {
        Self {
            f: 1,
            full_pel: false,
            previous_x: 0,
            previous_y: 0,
            luma: Displacement::ZERO,
            chroma: Displacement::ZERO,
        }
    }

    /// Load the range parameters of a new picture.
    pub fn set_code(&mut self, code: MotionCode) {
        self.f = code.f();
        self.full_pel = code.full_pel;
    }

    /// Reset the predictor to zero.
    ///
    /// The displacement of the last vector is kept; skipped macroblocks in
    /// B pictures reuse it.
    pub fn reset(&mut self) {
        self.previous_x = 0;
        self.previous_y = 0;
    }

    /// Reconstruct a vector from its two coded components.
    ///
    /// `code_*` is the motion code VLC value and `r_*` the residual field,
    /// which is only present (and otherwise 0) when `f != 1` and the code
    /// is nonzero.
    pub fn calculate(&mut self, code_x: i32, r_x: i32, code_y: i32, r_y: i32) {
        self.previous_x = reconstruct(self.f, code_x, r_x, self.previous_x);
        self.previous_y = reconstruct(self.f, code_y, r_y, self.previous_y);

        let (mut x, mut y) = (self.previous_x, self.previous_y);
        if self.full_pel {
            x <<= 1;
            y <<= 1;
        }
        self.luma = Displacement::from_half_pel(x, y);
        self.chroma = Displacement::from_half_pel(x >> 1, y >> 1);
    }

    /// Displacement for the 16x16 luma block.
    pub fn luma(&self) -> Displacement {
        self.luma
    }

    /// Displacement for the 8x8 chroma blocks.
    pub fn chroma(&self) -> Displacement {
        self.chroma
    }

    /// Current predictor value (before full-pel scaling).
    pub fn predictor(&self) -> (i32, i32) {
        (self.previous_x, self.previous_y)
    }

    /// Motion vector scale in use.
    pub fn f(&self) -> i32 {
        self.f
    }
}

fn reconstruct(f: i32, code: i32, r: i32, previous: i32) -> i32 {
    let complement = if f == 1 || code == 0 { 0 } else { f - 1 - r };
    let (little, big) = match code * f {
        0 => (0, 0),
        little if little > 0 => {
            let little = little - complement;
            (little, little - (f << 5))
        }
        little => {
            let little = little + complement;
            (little, little + (f << 5))
        }
    };

    let min = -(f << 4);
    let max = (f << 4) - 1;
    let candidate = previous + little;
    if (min..=max).contains(&candidate) {
        candidate
    } else {
        previous + big
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(f_code: u8, full_pel: bool) -> MotionVector {
        let mut mv = MotionVector::new();
        mv.set_code(MotionCode { full_pel, f_code });
        mv
    }

    #[test]
    fn test_differential_accumulation() {
        let mut mv = vector(1, false);
        mv.calculate(3, 0, -2, 0);
        assert_eq!(mv.predictor(), (3, -2));
        mv.calculate(1, 0, 0, 0);
        assert_eq!(mv.predictor(), (4, -2));
        assert_eq!(
            mv.luma(),
            Displacement {
                x: 2,
                y: -1,
                half_x: false,
                half_y: false
            }
        );
    }

    #[test]
    fn test_wraparound() {
        let mut mv = vector(1, false);
        mv.calculate(15, 0, -16, 0);
        mv.calculate(2, 0, -1, 0);
        // 15 + 2 leaves [-16, 15] and wraps by 32.
        assert_eq!(mv.predictor(), (-15, 15));
    }

    #[test]
    fn test_residual_with_larger_f() {
        // f_code 2: f = 2, residual 1 bit.
        let mut mv = vector(2, false);
        mv.calculate(3, 0, -3, 1);
        // little = 3*2 - (2-1-0) = 5 ; -(3*2) + (2-1-1) = -6
        assert_eq!(mv.predictor(), (5, -6));
        assert_eq!(mv.f(), 2);
    }

    #[test]
    fn test_half_pel_split() {
        let mut mv = vector(1, false);
        mv.calculate(5, 0, -3, 0);
        assert_eq!(
            mv.luma(),
            Displacement {
                x: 2,
                y: -2,
                half_x: true,
                half_y: true
            }
        );
        // Chroma shifts the luma vector right: 5 >> 1 = 2, -3 >> 1 = -2.
        assert_eq!(
            mv.chroma(),
            Displacement {
                x: 1,
                y: -1,
                half_x: false,
                half_y: false
            }
        );
    }

    #[test]
    fn test_negative_chroma_rounds_down() {
        let mut mv = vector(1, false);
        mv.calculate(-1, 0, 0, 0);
        assert_eq!(
            mv.luma(),
            Displacement {
                x: -1,
                y: 0,
                half_x: true,
                half_y: false
            }
        );
        assert_eq!(
            mv.chroma(),
            Displacement {
                x: -1,
                y: 0,
                half_x: true,
                half_y: false
            }
        );
    }

    #[test]
    fn test_full_pel_doubles_after_prediction() {
        let mut mv = vector(1, true);
        mv.calculate(3, 0, 1, 0);
        assert_eq!(mv.predictor(), (3, 1));
        assert_eq!(mv.luma(), Displacement::from_half_pel(6, 2));
        assert_eq!(mv.chroma(), Displacement::from_half_pel(3, 1));
    }

    #[test]
    fn test_reset_keeps_displacement() {
        let mut mv = vector(1, false);
        mv.calculate(4, 0, 4, 0);
        let luma = mv.luma();
        mv.reset();
        assert_eq!(mv.predictor(), (0, 0));
        assert_eq!(mv.luma(), luma);
        mv.calculate(0, 0, 0, 0);
        assert_eq!(mv.luma(), Displacement::ZERO);
    }
}
