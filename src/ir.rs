use std::f32::consts::PI;

use rand::Rng;

use crate::audio::buffer::StereoChannel;

/// An immutable stereo impulse response, computed once per graph lifetime.
#[derive(Clone)]
pub struct ImpulseResponse {
    sample_rate: u32,
    data: [Box<[f32]>; 2],
}

impl ImpulseResponse {
    /// Synthesizes a spring-reverb-like impulse response: uniform noise under
    /// a cubic decay window times an exponential decay, plus a quiet tone that
    /// sweeps slowly upward. The two channels draw independently from `rng`,
    /// which decorrelates them for a stereo image.
    pub fn spring(seconds: f32, decay: f32, sample_rate: u32, rng: &mut impl Rng) -> Self {
        let rate = sample_rate as f32;
        let len = (seconds * rate) as usize;

        let data = [0, 1].map(|_| {
            let mut channel = vec![0.0f32; len];
            for (i, sample) in channel.iter_mut().enumerate() {
                let t = i as f32 / rate;
                let envelope = (1.0 - t / seconds).powi(3) * (-decay * t).exp();
                let noise = rng.gen_range(-1.0f32..1.0) * 0.6;
                let chirp = (2.0 * PI * (1800.0 + 600.0 * t) * t).sin() * 0.05;
                *sample = (noise + chirp) * envelope;
            }
            channel.into_boxed_slice()
        });

        Self { sample_rate, data }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length in samples per channel.
    pub fn len(&self) -> usize {
        self.data[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.data[0].is_empty()
    }

    pub fn channel(&self, channel: StereoChannel) -> &[f32] {
        &self.data[channel as usize]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::audio::buffer::StereoChannel;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    // Peak possible magnitude: full-scale noise plus the chirp, under a unit envelope.
    const AMPLITUDE_BOUND: f32 = 0.6 + 0.05;

    #[test]
    fn length_matches_duration() {
        let mut rng = StdRng::seed_from_u64(7);
        let ir = ImpulseResponse::spring(1.1, 0.3, 48000, &mut rng);
        assert_eq!(ir.len(), 52800);
        for channel in StereoChannel::both() {
            assert_eq!(ir.channel(channel).len(), 52800);
        }
    }

    #[test]
    fn samples_stay_inside_the_envelope_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        let ir = ImpulseResponse::spring(1.1, 0.3, 44100, &mut rng);
        for channel in StereoChannel::both() {
            let samples = ir.channel(channel);
            assert!(samples[0].abs() <= AMPLITUDE_BOUND);
            for (i, sample) in samples.iter().enumerate() {
                let t = i as f32 / 44100.0;
                let envelope = (1.0 - t / 1.1).powi(3) * (-0.3 * t).exp();
                assert!(sample.abs() <= AMPLITUDE_BOUND * envelope + 1e-6);
            }
        }
    }

    #[test]
    fn decays_towards_the_tail() {
        let mut rng = StdRng::seed_from_u64(42);
        let ir = ImpulseResponse::spring(1.1, 0.3, 48000, &mut rng);
        let samples = ir.channel(StereoChannel::Left);
        let head: f32 = samples[..4800].iter().map(|s| s.abs()).sum();
        let tail: f32 = samples[samples.len() - 4800..].iter().map(|s| s.abs()).sum();
        assert!(tail < head * 0.01);
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let a = ImpulseResponse::spring(0.5, 0.3, 44100, &mut StdRng::seed_from_u64(1));
        let b = ImpulseResponse::spring(0.5, 0.3, 44100, &mut StdRng::seed_from_u64(1));
        let c = ImpulseResponse::spring(0.5, 0.3, 44100, &mut StdRng::seed_from_u64(2));
        assert_eq!(a.channel(StereoChannel::Left), b.channel(StereoChannel::Left));
        assert_ne!(a.channel(StereoChannel::Left), c.channel(StereoChannel::Left));
    }

    #[test]
    fn channels_are_decorrelated() {
        let mut rng = StdRng::seed_from_u64(9);
        let ir = ImpulseResponse::spring(0.5, 0.3, 44100, &mut rng);
        assert_ne!(
            ir.channel(StereoChannel::Left),
            ir.channel(StereoChannel::Right)
        );
    }
}
