//! 8x8 inverse DCT.
//!
//! Separable fixed-point transform after Loeffler, Ligtenberg and Moschytz:
//! every row, then every column, goes through the same four-stage butterfly
//! network with Q11 rotation constants. Products are shifted back to integer
//! precision individually before they are combined, so results are
//! reproducible bit for bit.

/// Fixed-point precision of the rotation constants.
const FIXED_POINT_SCALE: u32 = 11;

/// Half of the final descaling divisor, used for rounding.
const HALF_DCT_SIZE: i64 = 4;

/// cos(4a), with a = pi/16
const C1: i64 = 1448;
/// sin(4a)
const C2: i64 = 1448;
/// cos(a)
const C3: i64 = 2008;
/// sin(a)
const C4: i64 = 399;
/// cos(2a)
const C5: i64 = 1892;
/// sin(2a)
const C6: i64 = 783;
/// cos(3a)
const C7: i64 = 1702;
/// sin(3a)
const C8: i64 = 1137;
/// sqrt(2)
const C9: i64 = 2896;

/// Transform a block of natural-order coefficients into spatial samples in place.
pub fn idct8x8(block: &mut [i32; 64]) {
    for row in 0..8 {
        transform_1d(block, row * 8, 1);
    }
    for column in 0..8 {
        transform_1d(block, column, 8);
    }
}

#[inline]
fn mul(c: i64, x: i64) -> i64 {
    (c * x) >> FIXED_POINT_SCALE
}

#[inline]
fn descale(d: i64) -> i32 {
    if d < 0 {
        ((d - HALF_DCT_SIZE) >> 3) as i32
    } else {
        ((d + HALF_DCT_SIZE) >> 3) as i32
    }
}

fn transform_1d(block: &mut [i32; 64], start: usize, stride: usize) {
    let at = |i: usize| i64::from(block[start + i * stride]) << 3;

    let s1_0 = at(4);
    let s1_1 = at(0);
    let s1_2 = at(1);
    let s1_3 = at(7);
    let s1_4 = at(2);
    let s1_5 = at(6);
    let s1_6 = at(3);
    let s1_7 = at(5);

    let s2_0 = (mul(C1, s1_0) + mul(C2, s1_1)) << 1;
    let s2_1 = (mul(C5, s1_4) + mul(C6, s1_5)) << 1;
    let s2_2 = (mul(C1, s1_1) - mul(C2, s1_0)) << 1;
    let s2_3 = (mul(C5, s1_5) - mul(C6, s1_4)) << 1;
    let s2_4 = (mul(C3, s1_2) + mul(C4, s1_3)) << 1;
    let s2_5 = (mul(C7, s1_6) + mul(C8, s1_7)) << 1;
    let s2_6 = (mul(C3, s1_3) - mul(C4, s1_2)) << 1;
    let s2_7 = (mul(C7, s1_7) - mul(C8, s1_6)) << 1;

    let s3_0 = (s2_4 + s2_5) >> 1;
    let s3_1 = (s2_6 - s2_7) >> 1;
    let s3_3 = (s2_4 - s2_5) >> 1;
    let s3_7 = (s2_6 + s2_7) >> 1;

    // Stage 4 only rotates the odd part; the even terms pass through.
    let s4_5 = mul(C9, s3_3);
    let s4_7 = mul(C9, s3_7);

    let s5_0 = (s2_0 + s2_1) >> 1;
    let s5_1 = s3_0;
    let s5_2 = (s2_2 + s4_5) >> 1;
    let s5_3 = (s2_3 + s4_7) >> 1;
    let s5_4 = (s2_0 - s2_1) >> 1;
    let s5_5 = s3_1;
    let s5_6 = (s2_2 - s4_5) >> 1;
    let s5_7 = (s2_3 - s4_7) >> 1;

    let out = [
        (s5_0 + s5_1) >> 1,
        (s5_2 - s5_3) >> 1,
        (s5_2 + s5_3) >> 1,
        (s5_4 - s5_5) >> 1,
        (s5_4 + s5_5) >> 1,
        (s5_6 + s5_7) >> 1,
        (s5_6 - s5_7) >> 1,
        (s5_0 - s5_1) >> 1,
    ];
    for (i, d) in out.into_iter().enumerate() {
        block[start + i * stride] = descale(d);
    }
}
