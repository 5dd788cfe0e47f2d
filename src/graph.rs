use rand::Rng;
use tracing::debug;

use crate::audio::buffer::{AudioBufferMut, StereoBuffer, StereoBufferMut};
use crate::ir::ImpulseResponse;
use crate::processor::{Convolver, Filter, Gain};

/// Cutoff of the shared lowpass filter in Hz.
pub const LOWPASS_CUTOFF_HZ: f32 = 3600.0;
/// Output level of the master gain stage.
pub const MASTER_LEVEL: f32 = 0.28;
/// Level of the dry path.
pub const DRY_LEVEL: f32 = 1.0;
/// Level of the reverb return.
pub const WET_LEVEL: f32 = 0.14;
/// Impulse response duration in seconds.
pub const IR_SECONDS: f32 = 1.1;
/// Impulse response exponential decay rate.
pub const IR_DECAY: f32 = 0.3;

/// The persistent signal chain shared by every voice:
///
/// ```text
/// voices -> lowpass -> bus -> dry ----------------------> master -> out
///                          -> convolver -> wet gain ----/
/// ```
///
/// Built once, never rebuilt; only voices come and go around it. The graph
/// also owns the sample-position clock that all envelope scheduling is
/// measured against.
pub struct AudioGraph {
    sample_rate: u32,
    position: u64,
    filter: Filter,
    convolver: Convolver,
    ir: ImpulseResponse,
    bus: Gain,
    dry: Gain,
    wet: Gain,
    master: Gain,
    wet_buffers: [Vec<f32>; 2],
}

impl AudioGraph {
    /// Builds the fixed topology, generating the reverb impulse response
    /// from `rng`. Regenerating the response means constructing a new graph.
    pub fn new(sample_rate: u32, rng: &mut impl Rng) -> Self {
        let ir = ImpulseResponse::spring(IR_SECONDS, IR_DECAY, sample_rate, rng);
        let convolver = Convolver::new(&ir);

        let mut filter = Filter::new(LOWPASS_CUTOFF_HZ);
        filter.set_sample_rate(sample_rate);

        debug!(
            "audio graph constructed: {} Hz, {} IR samples, {} partitions",
            sample_rate,
            ir.len(),
            convolver.partitions()
        );

        Self {
            sample_rate,
            position: 0,
            filter,
            convolver,
            ir,
            bus: Gain::new(1.0),
            dry: Gain::new(DRY_LEVEL),
            wet: Gain::new(WET_LEVEL),
            master: Gain::new(MASTER_LEVEL),
            wet_buffers: [vec![], vec![]],
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples processed since construction.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Clock position in seconds.
    pub fn current_time(&self) -> f64 {
        self.position as f64 / self.sample_rate as f64
    }

    pub fn impulse_response(&self) -> &ImpulseResponse {
        &self.ir
    }

    /// Runs one block through the effect chain and advances the clock.
    /// `audio_in` is the summed voice bus; `audio_out` receives the mix.
    pub fn process(&mut self, audio_in: StereoBuffer, mut audio_out: StereoBufferMut) {
        let len = audio_in.len();
        assert!(len == audio_out.len());

        let [wet_l, wet_r] = &mut self.wet_buffers;
        wet_l.resize(len, 0.0);
        wet_r.resize(len, 0.0);

        // Shared lowpass; the output buffers double as the dry path.
        self.filter.process(
            audio_in,
            StereoBufferMut::new(&mut audio_out.left[..], &mut audio_out.right[..]),
        );
        self.bus.apply(StereoBufferMut::new(
            &mut audio_out.left[..],
            &mut audio_out.right[..],
        ));

        // The reverb taps the bus, not the dry-scaled signal.
        self.convolver.process(
            StereoBuffer::new(&audio_out.left[..], &audio_out.right[..]),
            StereoBufferMut::new(&mut wet_l[..], &mut wet_r[..]),
        );
        self.wet
            .apply(StereoBufferMut::new(&mut wet_l[..], &mut wet_r[..]));

        self.dry.apply(StereoBufferMut::new(
            &mut audio_out.left[..],
            &mut audio_out.right[..],
        ));
        (&mut audio_out.left[..]).add(&wet_l[..]);
        (&mut audio_out.right[..]).add(&wet_r[..]);
        self.master.apply(audio_out);

        self.position += len as u64;
    }
}
