use clap::Subcommand;

use super::{load_engine, print_json, CommandResult};

#[derive(Subcommand)]
pub enum StageAction {
    /// Print one stage as JSON
    Show {
        /// Stage index (0-based)
        index: usize,
    },
    /// Roll a random option for an unlocked stage
    Select { index: usize },
    /// Lock in the current selection and schedule the next unlock
    Confirm { index: usize },
    /// Reopen a stage; every later stage is locked again
    Retry { index: usize },
}

pub fn run(action: StageAction) -> CommandResult {
    let (mut engine, _) = load_engine()?;

    let view = match action {
        StageAction::Show { index } => engine.stage_view(index).ok_or_else(|| {
            format!("stage {index} out of range (0..{})", engine.stage_count())
        })?,
        StageAction::Select { index } => engine.select(index)?,
        StageAction::Confirm { index } => engine.confirm(index)?,
        StageAction::Retry { index } => engine.retry(index)?,
    };

    Ok(print_json(&view)?)
}
