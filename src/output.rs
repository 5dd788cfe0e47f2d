use basedrop::Handle;
use cpal::traits::DeviceTrait;
use cpal::{Device, Stream, StreamConfig};
use ringbuf_basedrop as ringbuf;
use std::sync::mpsc;
use tracing::error;

use crate::audio::buffer::StereoBuffer;
use crate::convert::interleave_stereo;

/// Streams rendered audio to an output device. The device callback pops
/// interleaved samples from a ring buffer; `write` refills it from the
/// render thread, blocking while the device catches up, which paces the
/// render loop to the hardware.
pub struct AudioOutput {
    channel: ringbuf::Producer<f32>,
    buffer: Vec<f32>,
    notify: mpsc::Receiver<()>,
}

impl AudioOutput {
    pub fn from_cpal(
        device: Device,
        config: &StreamConfig,
        buffer_size: usize,
        handle: &Handle,
    ) -> (Self, Stream) {
        let (tx, mut rx) = ringbuf::RingBuffer::new(buffer_size).split(handle);
        let (tx2, rx2) = mpsc::sync_channel(0);

        let stream = device
            .build_output_stream(
                config,
                move |data, _| {
                    rx.pop_slice(data);
                    tx2.try_send(()).ok();
                },
                move |err| {
                    error!("output stream error: {err}");
                },
                None,
            )
            .unwrap();

        (
            Self {
                channel: tx,
                buffer: vec![],
                notify: rx2,
            },
            stream,
        )
    }

    /// Interleaves a stereo block and enqueues it for the device,
    /// blocking until the ring buffer has room.
    pub fn write(&mut self, audio_in: StereoBuffer) {
        self.buffer.resize(2 * audio_in.len(), 0.0);
        interleave_stereo(audio_in.left, audio_in.right, &mut self.buffer);

        while self.channel.remaining() < self.buffer.len() {
            self.notify.recv().unwrap();
        }
        self.channel.push_slice(&self.buffer);
    }
}
