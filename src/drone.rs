use slotmap::{new_key_type, SlotMap};
use thiserror::Error;
use tracing::debug;

use crate::audio::buffer::{StereoBuffer, StereoBufferMut};
use crate::chord::{self, UnknownQuality};
use crate::graph::AudioGraph;
use crate::note::{InvalidPitchClass, Note};
use crate::synth::{oscillators, Voice};

/// Octave used when a caller has no opinion.
pub const DEFAULT_OCTAVE: i32 = 4;

/// Total chord level, split evenly across voices so that dense chords
/// are no louder than sparse ones.
const CHORD_LEVEL: f32 = 0.2;
/// Attack ramp duration in seconds.
const ATTACK: f32 = 0.18;
/// Release time constant in seconds.
const RELEASE: f32 = 0.15;
/// Delay before a released oscillator stops, long enough for the release
/// curve to reach silence first.
const STOP_DELAY: f32 = 0.25;

new_key_type! {
    pub struct VoiceId;
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PlaybackState {
    /// Constructed but not yet activated; rendering produces silence and
    /// the clock stands still.
    Suspended,
    Running,
}

#[derive(Error, Debug)]
pub enum PlayError {
    #[error(transparent)]
    InvalidPitchClass(#[from] InvalidPitchClass),
    #[error(transparent)]
    UnknownQuality(#[from] UnknownQuality),
}

/// A chord drone: one persistent effects graph plus the set of currently
/// sounding voices. Instances are fully independent; all state lives here.
pub struct ChordDrone {
    sample_rate: u32,
    state: PlaybackState,
    graph: Option<AudioGraph>,
    voices: SlotMap<VoiceId, Voice>,
    /// Voices belonging to the current chord. Released voices leave this
    /// list immediately but keep sounding in `voices` until their stop
    /// sample passes.
    active: Vec<VoiceId>,
    bus: [Vec<f32>; 2],
}

impl ChordDrone {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            state: PlaybackState::Suspended,
            graph: None,
            voices: SlotMap::with_key(),
            active: vec![],
            bus: [vec![], vec![]],
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Builds the audio graph if it does not exist yet. Idempotent.
    pub fn ensure(&mut self) {
        if self.graph.is_none() {
            self.graph = Some(AudioGraph::new(self.sample_rate, &mut rand::thread_rng()));
        }
    }

    /// Activates the engine. Idempotent; playing before this call is legal
    /// but inaudible.
    pub fn resume(&mut self) {
        self.ensure();
        self.state = PlaybackState::Running;
    }

    /// Starts a chord, replacing whatever was playing.
    pub fn play(&mut self, root: &str, quality: &str, octave: i32) -> Result<(), PlayError> {
        self.stop_all();
        self.ensure();

        let intervals = chord::intervals(quality)?;
        let base = Note::from_pitch_class(root, octave)?;

        let level = CHORD_LEVEL / intervals.len() as f32;
        for &step in intervals {
            let note = base.transpose(step);
            let voice = Voice::new(
                oscillators::saw,
                note.frequency(),
                level,
                ATTACK,
                self.sample_rate,
            );
            self.active.push(self.voices.insert(voice));
        }
        debug!(
            "chord started: {} {} at octave {} ({} voices)",
            root,
            quality,
            octave,
            intervals.len()
        );
        Ok(())
    }

    /// Releases every active voice and clears the active set. The release
    /// tails keep sounding; stopping is best-effort and never fails.
    pub fn stop_all(&mut self) {
        for id in self.active.drain(..) {
            let Some(voice) = self.voices.get_mut(id) else {
                continue;
            };
            if let Err(err) = voice.release(RELEASE, STOP_DELAY) {
                debug!("ignoring failed voice stop: {err}");
            }
        }
    }

    /// Voices in the current chord.
    pub fn active_voices(&self) -> usize {
        self.active.len()
    }

    /// All voices that still produce sound, including release tails.
    pub fn sounding_voices(&self) -> usize {
        self.voices.len()
    }

    /// Seconds of audio rendered since the graph was built.
    pub fn current_time(&self) -> f64 {
        self.graph.as_ref().map_or(0.0, |graph| graph.current_time())
    }

    /// Renders the next block. While suspended this writes silence and
    /// leaves the clock untouched.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        assert!(left.len() == right.len());
        left.fill(0.0);
        right.fill(0.0);

        if self.state != PlaybackState::Running {
            return;
        }
        let Some(graph) = &mut self.graph else {
            return;
        };

        let len = left.len();
        let [bus_l, bus_r] = &mut self.bus;
        bus_l.clear();
        bus_l.resize(len, 0.0);
        bus_r.clear();
        bus_r.resize(len, 0.0);

        // Mix every voice into the shared bus, retiring the ones whose
        // scheduled stop has passed.
        self.voices
            .retain(|_, voice| voice.process(StereoBufferMut::new(&mut bus_l[..], &mut bus_r[..])));

        graph.process(
            StereoBuffer::new(bus_l, bus_r),
            StereoBufferMut::new(left, right),
        );
    }
}
