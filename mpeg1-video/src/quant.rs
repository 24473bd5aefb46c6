//! Inverse quantization and intra DC prediction.

use crate::types::INVERSE_ZIGZAG;

/// Smallest reconstructed coefficient value.
pub const COEFF_MIN: i32 = -2048;
/// Largest reconstructed coefficient value.
pub const COEFF_MAX: i32 = 2047;

/// Value a DC predictor is reset to.
pub const DC_PREDICTOR_RESET: i32 = 1024;

/// Address of the last intra macroblock at the start of a slice.
const NO_INTRA_ADDRESS: i64 = -2;

/// Force a nonzero even value one step towards zero, then saturate.
#[inline]
pub fn mismatch_control(value: i32) -> i32 {
    let value = if value & 1 == 0 {
        value - value.signum()
    } else {
        value
    };
    value.clamp(COEFF_MIN, COEFF_MAX)
}

/// Dequantize an intra block.
///
/// `coefficients` are in transmission (zigzag) order, the result is in
/// natural order. Each AC level becomes `(level * quantizer_scale * matrix)
/// >> 3`, an arithmetic shift of the signed product; `dc` is the already
/// predicted DC term.
pub fn dequantize_intra(
    coefficients: &[i32; 64],
    quantizer_scale: i32,
    matrix: &[u8; 64],
    dc: i32,
    out: &mut [i32; 64],
) {
    out[0] = dc;
    for i in 1..64 {
        let level = coefficients[INVERSE_ZIGZAG[i]];
        out[i] = if level == 0 {
            0
        } else {
            mismatch_control((level * quantizer_scale * i32::from(matrix[i])) >> 3)
        };
    }
}

/// Dequantize a non-intra block.
///
/// Each nonzero level `c` becomes `((2c + sign(c)) * quantizer_scale *
/// matrix) >> 4`, shifting the signed product. Zero levels stay exactly zero.
pub fn dequantize_non_intra(
    coefficients: &[i32; 64],
    quantizer_scale: i32,
    matrix: &[u8; 64],
    out: &mut [i32; 64],
) {
    for i in 0..64 {
        let level = coefficients[INVERSE_ZIGZAG[i]];
        out[i] = if level == 0 {
            0
        } else {
            let scaled = (2 * level + level.signum()) * quantizer_scale * i32::from(matrix[i]);
            mismatch_control(scaled >> 4)
        };
    }
}

/// Colour component a block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Blocks 0-3.
    Luma,
    /// Block 4.
    Cb,
    /// Block 5.
    Cr,
}

impl Component {
    /// Component of block `index` (0-5) within a macroblock.
    pub fn of_block(index: usize) -> Self {
        match index {
            0..=3 => Component::Luma,
            4 => Component::Cb,
            _ => Component::Cr,
        }
    }
}

/// DC predictors of one slice.
#[derive(Debug, Clone)]
pub struct DcPredictor {
    luma: i32,
    cb: i32,
    cr: i32,
    past_intra_address: i64,
}

impl Default for DcPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl DcPredictor {
    /// Create predictors in their slice-start state.
    pub fn new() -> Self {
        Self {
            luma: DC_PREDICTOR_RESET,
            cb: DC_PREDICTOR_RESET,
            cr: DC_PREDICTOR_RESET,
            past_intra_address: NO_INTRA_ADDRESS,
        }
    }

    /// Return to the slice-start state.
    pub fn reset_slice(&mut self) {
        *self = Self::new();
    }

    /// Reset the three predictors, keeping the last intra address.
    pub fn reset(&mut self) {
        self.luma = DC_PREDICTOR_RESET;
        self.cb = DC_PREDICTOR_RESET;
        self.cr = DC_PREDICTOR_RESET;
    }

    /// Prepare for an intra macroblock at `address`.
    ///
    /// The predictors restart from 1024 when the previous intra macroblock
    /// is not the immediately preceding one.
    pub fn begin_macroblock(&mut self, address: i64) {
        if address - self.past_intra_address > 1 {
            self.reset();
        }
    }

    /// Record that the intra macroblock at `address` is complete.
    pub fn end_macroblock(&mut self, address: i64) {
        self.past_intra_address = address;
    }

    /// Reconstruct a DC term from its differential and update the predictor.
    pub fn reconstruct(&mut self, component: Component, differential: i32) -> i32 {
        let predictor = match component {
            Component::Luma => &mut self.luma,
            Component::Cb => &mut self.cb,
            Component::Cr => &mut self.cr,
        };
        *predictor += differential << 3;
        *predictor
    }

    /// Current predictor of a component.
    pub fn value(&self, component: Component) -> i32 {
        match component {
            Component::Luma => self.luma,
            Component::Cb => self.cb,
            Component::Cr => self.cr,
        }
    }
}
