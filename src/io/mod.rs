// Purpose - external interfaces, format conversions
// Instrument files live in `crate::patch::fui`.

pub mod converter;
pub mod midi;
