use super::{load_engine, print_json, CommandResult};

pub fn run_status() -> CommandResult {
    let (_engine, view) = load_engine()?;
    Ok(print_json(&view)?)
}

pub fn run_summary() -> CommandResult {
    let (engine, _) = load_engine()?;
    Ok(print_json(&engine.itinerary())?)
}

pub fn run_restart() -> CommandResult {
    let (mut engine, _) = load_engine()?;
    let view = engine.restart();
    Ok(print_json(&view)?)
}
