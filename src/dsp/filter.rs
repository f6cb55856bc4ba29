use std::f32::consts::TAU;

use crate::graph::node::RenderCtx;

/*
State-variable lowpass (TPT)
============================

Each chain slot owns one of these. Audio below the cutoff passes, audio above
is attenuated at 12 dB/octave. Resonance adds a peak at the cutoff:

  resonance 0.0  → k = 2   (no peak)
  resonance 0.5  → k = 1   (Q ≈ 1, the usual biquad default)
  resonance 1.0  → k = 0   (self-oscillation)

Cutoff is clamped to 20 Hz .. 0.45·sample_rate at render time so that a slot
cutoff of 0 Hz (a valid knob position) still yields a stable filter.
*/

pub const MIN_CUTOFF_HZ: f32 = 20.0;

pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    pub cutoff_hz: f32,
    pub resonance: f32,
}

impl SVFilter {
    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            resonance: 0.5,
        }
    }

    pub fn with_resonance(mut self, resonance: f32) -> Self {
        self.set_resonance(resonance);
        self
    }

    #[inline]
    fn compute_g(&self, sample_rate: f32) -> f32 {
        let cutoff = self.cutoff_hz.clamp(MIN_CUTOFF_HZ, sample_rate * 0.45);
        (TAU * cutoff / (2.0 * sample_rate)).tan()
    }

    /// Advance one sample and return the lowpass output.
    #[inline]
    pub fn next_sample(&mut self, sample: f32, k: f32, g: f32) -> f32 {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        v2
    }

    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        let g = self.compute_g(ctx.sample_rate);
        let k = 2.0 - (2.0 * self.resonance);

        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, k, g);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff_hz = cutoff;
    }

    /// Resonance is kept just below self-oscillation.
    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, 0.95);
    }
}
