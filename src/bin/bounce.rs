use std::env;
use std::error::Error;

use itertools::Itertools;

use drone_engine::chord;
use drone_engine::drone::{ChordDrone, DEFAULT_OCTAVE};

const SAMPLE_RATE: u32 = 48000;
const BLOCK: usize = 256;

/// Renders a single chord to a WAV file:
/// `bounce [root] [quality] [octave] [seconds] [path]`
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let mut args = env::args().skip(1);
    let root = args.next().unwrap_or_else(|| "C".to_owned());
    let quality = args.next().unwrap_or_else(|| "maj7".to_owned());
    let octave = match args.next() {
        Some(arg) => arg.parse()?,
        None => DEFAULT_OCTAVE,
    };
    let seconds: f32 = match args.next() {
        Some(arg) => arg.parse()?,
        None => 6.0,
    };
    let path = args.next().unwrap_or_else(|| "drone.wav".to_owned());

    if chord::intervals(&quality).is_err() {
        eprintln!("known qualities: {}", chord::qualities().format(", "));
    }

    let mut drone = ChordDrone::new(SAMPLE_RATE);
    drone.resume();
    drone.play(&root, &quality, octave)?;

    let mut writer = hound::WavWriter::create(
        &path,
        hound::WavSpec {
            channels: 2,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        },
    )?;

    let total_blocks = (seconds * SAMPLE_RATE as f32) as usize / BLOCK;
    // Stop early enough that the release and reverb tail land on tape.
    let stop_block = total_blocks * 4 / 5;

    let mut left = [0.0f32; BLOCK];
    let mut right = [0.0f32; BLOCK];
    for block in 0..total_blocks {
        if block == stop_block {
            drone.stop_all();
        }
        drone.render(&mut left, &mut right);
        for (l, r) in left.iter().zip(right.iter()) {
            writer.write_sample((l.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
            writer.write_sample((r.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
        }
    }
    writer.finalize()?;

    println!("wrote {seconds}s of {root} {quality} to {path}");
    Ok(())
}
