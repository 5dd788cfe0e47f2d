pub use self::envelope::GainEnvelope;
pub use self::voice::{Voice, VoiceStopFailure};

mod envelope;
pub mod oscillators;
mod voice;
