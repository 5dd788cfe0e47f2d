use basedrop::Collector;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use drone_engine::audio::buffer::StereoBuffer;
use drone_engine::drone::{ChordDrone, DEFAULT_OCTAVE};
use drone_engine::output::AudioOutput;

/// Samples rendered per loop iteration.
const BLOCK: usize = 256;
/// Seconds each chord is held before the progression advances.
const HOLD_SECONDS: u32 = 4;

fn main() {
    tracing_subscriber::fmt::init();

    // Collects garbage from the realtime audio channel.
    let collector = Collector::new();

    // Create the output stream
    let host = cpal::default_host();
    let device = host.default_output_device().unwrap();
    let config = device.default_output_config().unwrap();
    let sample_rate = config.sample_rate().0;
    let (mut output, stream) =
        AudioOutput::from_cpal(device, &config.into(), 8 * BLOCK, &collector.handle());
    stream.play().unwrap();

    // Create the drone
    let mut drone = ChordDrone::new(sample_rate);
    drone.resume();

    let progression = [("D", "min9"), ("G", "13"), ("C", "maj9"), ("A", "7alt")];
    let blocks_per_chord = (HOLD_SECONDS * sample_rate) as usize / BLOCK;

    let mut left = [0.0f32; BLOCK];
    let mut right = [0.0f32; BLOCK];
    for &(root, quality) in progression.iter().cycle() {
        drone.play(root, quality, DEFAULT_OCTAVE).unwrap();
        for _ in 0..blocks_per_chord {
            drone.render(&mut left, &mut right);
            output.write(StereoBuffer::new(&left, &right));
        }
    }
}
