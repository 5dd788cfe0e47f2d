use thiserror::Error;

use super::envelope::GainEnvelope;
use crate::audio::buffer::StereoBufferMut;

/// The voice was already released when a release was requested.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("voice has already been released")]
pub struct VoiceStopFailure;

/// One sounding chord tone: an oscillator and its gain envelope.
///
/// A voice is born silent with an attack ramp already scheduled, sustains
/// until released, then fades under a release curve and retires itself once
/// its stop sample passes.
pub struct Voice {
    inv_sample_rate: f32,
    wave: fn(f32) -> f32,
    frequency: f32,
    phase: f32,
    envelope: GainEnvelope,
    /// Samples processed since the voice started.
    now: u64,
    /// Sample at which the oscillator stops, once released.
    stop_at: Option<u64>,
}

impl Voice {
    /// Creates a voice ramping linearly from silence to `level` over
    /// `attack` seconds.
    pub fn new(wave: fn(f32) -> f32, frequency: f32, level: f32, attack: f32, sample_rate: u32) -> Self {
        let mut envelope = GainEnvelope::new(sample_rate);
        envelope.linear_ramp_to(level, attack);
        Self {
            inv_sample_rate: (sample_rate as f32).recip(),
            wave,
            frequency,
            phase: 0.0,
            envelope,
            now: 0,
            stop_at: None,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn is_released(&self) -> bool {
        self.stop_at.is_some()
    }

    /// Cancels pending automation, fades to silence with the given time
    /// constant, and schedules the oscillator stop `stop_delay` seconds out.
    pub fn release(&mut self, time_constant: f32, stop_delay: f32) -> Result<(), VoiceStopFailure> {
        if self.stop_at.is_some() {
            return Err(VoiceStopFailure);
        }
        self.envelope.cancel_scheduled();
        self.envelope.set_target(0.0, time_constant);
        self.stop_at = Some(self.now + (stop_delay / self.inv_sample_rate) as u64);
        Ok(())
    }

    /// Mixes the voice into the provided stereo buffer.
    /// A return value of `false` indicates that the voice has passed its
    /// scheduled stop and will not produce any more sound.
    pub fn process(&mut self, audio_out: StereoBufferMut) -> bool {
        let StereoBufferMut { left, right } = audio_out;

        let omega = self.frequency * self.inv_sample_rate;
        for (left, right) in left.iter_mut().zip(right.iter_mut()) {
            if self.stop_at.is_some_and(|stop| self.now >= stop) {
                return false;
            }
            let sample = self.envelope.process() * (self.wave)(self.phase);
            *left += sample;
            *right += sample;
            self.phase += omega;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
            self.now += 1;
        }

        self.stop_at.map_or(true, |stop| self.now < stop)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::synth::oscillators::saw;

    const RATE: u32 = 48000;

    fn run(voice: &mut Voice, samples: usize) -> (Vec<f32>, bool) {
        let mut left = vec![0.0; samples];
        let mut right = vec![0.0; samples];
        let alive = voice.process(StereoBufferMut::new(&mut left, &mut right));
        (left, alive)
    }

    #[test]
    fn attack_starts_from_silence() {
        let mut voice = Voice::new(saw, 440.0, 0.05, 0.18, RATE);
        let (samples, alive) = run(&mut voice, 4800);
        assert!(alive);
        assert!(samples[0].abs() < 1e-4);
        let peak = samples[4000..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.005, "attack should be audible, peak {peak}");
    }

    #[test]
    fn release_schedules_the_stop() {
        let mut voice = Voice::new(saw, 220.0, 0.05, 0.01, RATE);
        run(&mut voice, 2400);
        voice.release(0.15, 0.25).unwrap();
        assert!(voice.is_released());

        // Still sounding through most of the tail window.
        let (_, alive) = run(&mut voice, 9600);
        assert!(alive);

        // 0.25s after release the voice retires.
        let (tail, alive) = run(&mut voice, 4800);
        assert!(!alive);
        assert!(tail[4000..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn release_twice_fails() {
        let mut voice = Voice::new(saw, 220.0, 0.05, 0.01, RATE);
        voice.release(0.15, 0.25).unwrap();
        assert_eq!(voice.release(0.15, 0.25), Err(VoiceStopFailure));
    }

    #[test]
    fn release_fades_towards_silence() {
        let mut voice = Voice::new(saw, 440.0, 0.2, 0.001, RATE);
        run(&mut voice, 480);
        voice.release(0.15, 0.25).unwrap();
        let (tail, _) = run(&mut voice, 9600);
        let early = tail[..480].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        let late = tail[9120..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(late < early);
    }
}
