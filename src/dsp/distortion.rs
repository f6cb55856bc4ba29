//! Distortion / Waveshaping
//!
//! A waveshaper maps every input sample through a fixed transfer curve:
//!   output = curve(input)
//!
//! The curve is a table of `CURVE_LENGTH` points spanning inputs -1..1.
//! Inputs between two table entries are linearly interpolated; inputs
//! outside -1..1 clamp to the first/last entry.
//!
//! # The Transfer Function
//!
//! The table is a scaled soft-clip, the same x / (1 + |x|) family as a
//! tube-style saturator:
//!
//!   curve[i] = (π + amount) · x / (N · (1 + amount·|x|)),  x = 2i/N - 1
//!
//! Larger `amount` bends the curve harder toward its asymptote. The 1/N
//! factor keeps the shaped signal very quiet, so the distortion stage
//! colours the attack of a voice rather than carrying its level.

use std::f32::consts::PI;
use std::sync::Arc;

/// Number of points in every waveshaper curve.
pub const CURVE_LENGTH: usize = 4096;

/// Immutable transfer curve shared by waveshaper nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveshaperCurve {
    points: Arc<[f32]>,
}

impl WaveshaperCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.points
    }

    /// Shape a single sample through the curve.
    #[inline]
    pub fn shape(&self, sample: f32) -> f32 {
        let n = self.points.len();
        if n == 0 {
            return sample;
        }
        let last = n - 1;
        let v = last as f32 * (sample + 1.0) * 0.5;
        if v.is_nan() || v <= 0.0 {
            return self.points[0];
        }
        if v >= last as f32 {
            return self.points[last];
        }
        let k = v as usize;
        let frac = v - k as f32;
        self.points[k] + (self.points[k + 1] - self.points[k]) * frac
    }

    /// Shape an entire buffer in place.
    pub fn shape_buffer(&self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.shape(*sample);
        }
    }
}

/// Build the waveshaper transfer curve for a distortion `amount`.
///
/// Pure and deterministic; rebuilt for every voice rather than cached.
pub fn build_curve(amount: f32) -> WaveshaperCurve {
    let n = CURVE_LENGTH as f32;
    let points: Vec<f32> = (0..CURVE_LENGTH)
        .map(|i| {
            let x = (i as f32 * 2.0) / n - 1.0;
            (PI + amount) * x / (n * (1.0 + amount * x.abs()))
        })
        .collect();

    WaveshaperCurve {
        points: points.into(),
    }
}
