//! opn2 - play an FM instrument from the terminal
//!
//! Run with: cargo run -- [instrument.fui | preset] [--pal]

mod app;
mod keyboard;
mod pool;
mod ui;

use color_eyre::eyre::{bail, Result as EyreResult, WrapErr};
use std::path::Path;

use app::Opn2;
use opn2_fm::{
    chip::{CLOCK_NTSC, CLOCK_PAL},
    patch::fui,
    synth::GlobalParams,
    voices,
};

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut clock = CLOCK_NTSC;
    let mut source = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--pal" => clock = CLOCK_PAL,
            "--ntsc" => clock = CLOCK_NTSC,
            _ if arg.starts_with("--") => bail!("unknown option {arg}"),
            _ => source = Some(arg),
        }
    }

    let (name, patch) = match source {
        None => {
            let (name, patch) = voices::by_program(0);
            (name.to_string(), patch)
        }
        Some(arg) if Path::new(&arg).is_file() => {
            let instrument = fui::read_fui(&arg)
                .wrap_err_with(|| format!("failed to load instrument {arg}"))?;
            let patch = instrument.to_patch_params(&GlobalParams::default());
            (instrument.name, patch)
        }
        Some(arg) => match voices::by_name(&arg) {
            Some(patch) => (arg, patch),
            None => bail!(
                "{arg} is neither a file nor a preset (presets: {})",
                voices::PRESETS.map(|(name, _)| name).join(", ")
            ),
        },
    };

    Opn2::new(name, patch).clock(clock).run()
}
