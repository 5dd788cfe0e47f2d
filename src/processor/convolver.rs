use std::collections::VecDeque;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::audio::buffer::{StereoBuffer, StereoBufferMut, StereoChannel};
use crate::ir::ImpulseResponse;

/// Samples per impulse-response partition. Callers that process blocks which
/// are a multiple of this size incur no latency; other block sizes delay the
/// output by less than one partition.
pub const PARTITION: usize = 256;

/// FFT frame size: the current partition plus one partition of history,
/// so the circular convolution of each frame is free of time aliasing.
const FFT_SIZE: usize = 2 * PARTITION;

/// Stereo convolution reverb using uniform partitioned overlap-save.
/// Each channel of the input is convolved with the matching channel
/// of the impulse response.
pub struct Convolver {
    channels: [PartitionedFir; 2],
}

impl Convolver {
    pub fn new(ir: &ImpulseResponse) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let ifft = planner.plan_fft_inverse(FFT_SIZE);

        let channels = StereoChannel::both()
            .map(|channel| PartitionedFir::new(ir.channel(channel), fft.clone(), ifft.clone()));

        Self { channels }
    }

    /// Number of frequency-domain partitions per channel.
    pub fn partitions(&self) -> usize {
        self.channels[0].partitions.len()
    }

    pub fn process(&mut self, audio_in: StereoBuffer, audio_out: StereoBufferMut) {
        self.channels[0].process(audio_in.left, audio_out.left);
        self.channels[1].process(audio_in.right, audio_out.right);
    }
}

/// A single-channel FIR convolution engine. The filter is split into
/// `PARTITION`-sized segments held in the frequency domain; each input
/// block is transformed once and multiplied against every segment, with
/// a delay line of past input spectra standing in for time-domain history.
struct PartitionedFir {
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    /// Impulse response segments in the frequency domain.
    partitions: Vec<Box<[Complex<f32>]>>,
    /// Past input-frame spectra; `head` is the most recent frame.
    spectra: Vec<Box<[Complex<f32>]>>,
    head: usize,
    /// Sliding time-domain window: one partition of history, then the
    /// partition currently being filled.
    window: Box<[f32]>,
    fill: usize,
    /// Output samples waiting to be drained.
    ready: VecDeque<f32>,
    scratch: Box<[Complex<f32>]>,
    accum: Box<[Complex<f32>]>,
}

impl PartitionedFir {
    fn new(filter: &[f32], fft: Arc<dyn Fft<f32>>, ifft: Arc<dyn Fft<f32>>) -> Self {
        let count = filter.len().div_ceil(PARTITION).max(1);

        let partitions = (0..count)
            .map(|index| {
                let segment = &filter[(index * PARTITION).min(filter.len())..];
                let segment = &segment[..segment.len().min(PARTITION)];
                let mut buffer = vec![Complex::new(0.0, 0.0); FFT_SIZE].into_boxed_slice();
                for (bin, &sample) in buffer.iter_mut().zip(segment.iter()) {
                    *bin = Complex::new(sample, 0.0);
                }
                fft.process(&mut buffer);
                buffer
            })
            .collect();

        let spectra = (0..count)
            .map(|_| vec![Complex::new(0.0, 0.0); FFT_SIZE].into_boxed_slice())
            .collect();

        Self {
            fft,
            ifft,
            partitions,
            spectra,
            head: 0,
            window: vec![0.0; FFT_SIZE].into_boxed_slice(),
            fill: 0,
            ready: VecDeque::new(),
            scratch: vec![Complex::new(0.0, 0.0); FFT_SIZE].into_boxed_slice(),
            accum: vec![Complex::new(0.0, 0.0); FFT_SIZE].into_boxed_slice(),
        }
    }

    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        for &sample in input {
            self.window[PARTITION + self.fill] = sample;
            self.fill += 1;
            if self.fill == PARTITION {
                self.flush();
            }
        }
        for s_out in output.iter_mut() {
            *s_out = self.ready.pop_front().unwrap_or(0.0);
        }
    }

    /// Convolves one full partition of input and queues the results.
    fn flush(&mut self) {
        for (bin, &sample) in self.scratch.iter_mut().zip(self.window.iter()) {
            *bin = Complex::new(sample, 0.0);
        }
        self.fft.process(&mut self.scratch);

        // The newest spectrum replaces the oldest slot in the ring.
        self.head = (self.head + self.spectra.len() - 1) % self.spectra.len();
        self.spectra[self.head].copy_from_slice(&self.scratch);

        self.accum.fill(Complex::new(0.0, 0.0));
        for (age, partition) in self.partitions.iter().enumerate() {
            let spectrum = &self.spectra[(self.head + age) % self.spectra.len()];
            for ((acc, x), h) in self.accum.iter_mut().zip(spectrum.iter()).zip(partition.iter()) {
                *acc += x * h;
            }
        }
        self.ifft.process(&mut self.accum);

        // The first half of the frame is circularly aliased; the second half
        // holds the valid convolution output for the partition just read.
        let scale = 1.0 / FFT_SIZE as f32;
        self.ready
            .extend(self.accum[PARTITION..].iter().map(|bin| bin.re * scale));

        self.window.copy_within(PARTITION.., 0);
        self.fill = 0;
    }
}
