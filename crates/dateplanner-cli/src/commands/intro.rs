use clap::Subcommand;

use super::{load_engine, print_json, CommandResult};

#[derive(Subcommand)]
pub enum IntroAction {
    /// Leave the intro and enter the stage sequence
    Complete,
    /// Record which intro screen is showing
    Screen {
        /// Screen name (e.g. "intro-2")
        name: String,
    },
}

pub fn run(action: IntroAction) -> CommandResult {
    let (mut engine, _) = load_engine()?;

    match action {
        IntroAction::Complete => engine.complete_intro(),
        IntroAction::Screen { name } => engine.set_screen(name),
    }

    Ok(print_json(&engine.resolved_view())?)
}
