#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Oscillator Waveforms
====================

  Sine:      pure fundamental, no overtones
  Square:    odd harmonics at 1/n, hollow
  Sawtooth:  all harmonics at 1/n, bright
  Triangle:  odd harmonics at 1/n², soft

The block keeps a normalized phase in [0, 1). Each sample advances the phase
by frequency / sample_rate and maps it through the waveform. Frequency is
supplied per sample so glides and detune automation land sample-accurately.

Waveforms are naive (not band-limited); aliasing at high pitches is accepted.
*/

/// Closed set of oscillator shapes a slot can select.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    /// Evaluate the waveform at a normalized phase in [0, 1).
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (std::f32::consts::TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => {
                if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    4.0 * phase - 4.0
                }
            }
        }
    }

    /// Next waveform in UI cycling order.
    pub fn next(self) -> Self {
        match self {
            Waveform::Sine => Waveform::Square,
            Waveform::Square => Waveform::Sawtooth,
            Waveform::Sawtooth => Waveform::Triangle,
            Waveform::Triangle => Waveform::Sine,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }
}

/// Phase accumulator driving a single waveform.
pub struct OscillatorBlock {
    waveform: Waveform,
    phase: f32,
}

impl OscillatorBlock {
    pub fn new(waveform: Waveform) -> Self {
        Self { waveform, phase: 0.0 }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Produce one sample at `frequency` and advance the phase.
    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let out = self.waveform.sample(self.phase);
        self.phase = (self.phase + frequency / sample_rate).rem_euclid(1.0);
        out
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn valid_sine() {
        let sample_rate = 48_000.0;
        let mut osc = OscillatorBlock::new(Waveform::Sine);

        let buffer: Vec<f32> = (0..128).map(|_| osc.next_sample(440.0, sample_rate)).collect();

        let sample_index = 12;
        let expected = (TAU * 440.0 * sample_index as f32 / sample_rate).sin();
        let actual = buffer[sample_index];
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn shapes_stay_in_unit_range() {
        for waveform in Waveform::ALL {
            let mut osc = OscillatorBlock::new(waveform);
            for _ in 0..1_000 {
                let s = osc.next_sample(331.0, 48_000.0);
                assert!((-1.0..=1.0).contains(&s), "{waveform:?} produced {s}");
            }
        }
    }

    #[test]
    fn triangle_is_continuous_at_quarter_points() {
        assert!((Waveform::Triangle.sample(0.25) - 1.0).abs() < 1e-6);
        assert!((Waveform::Triangle.sample(0.75) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn negative_frequency_keeps_phase_normalized() {
        let mut osc = OscillatorBlock::new(Waveform::Sawtooth);
        for _ in 0..64 {
            osc.next_sample(-880.0, 48_000.0);
            assert!((0.0..1.0).contains(&osc.phase));
        }
    }

    #[test]
    fn cycling_visits_every_waveform() {
        let mut w = Waveform::Sine;
        let mut seen = vec![w];
        for _ in 0..3 {
            w = w.next();
            seen.push(w);
        }
        assert_eq!(w.next(), Waveform::Sine);
        for waveform in Waveform::ALL {
            assert!(seen.contains(&waveform));
        }
    }
}
