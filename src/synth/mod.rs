// Purpose: host-facing voices on top of the chip
// Each voice owns a private chip, resamples it to the host rate and takes
// patch updates without locking the audio thread. Pooling and stealing
// voices is left to the caller.

pub mod message;
pub mod params;
pub mod resampler;
pub mod voice;

#[cfg(feature = "rtrb")]
pub use params::ParamHandle;
pub use params::{GlobalParams, OperatorParams, ParamReceiver, PatchParams};
pub use resampler::VoiceResampler;
pub use voice::{FmVoice, VoiceState};
