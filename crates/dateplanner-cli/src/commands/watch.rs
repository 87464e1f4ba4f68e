use dateplanner_core::{format_remaining, run_countdown};

use super::{load_engine, print_json, CommandResult};

pub fn run() -> CommandResult {
    let (mut engine, view) = load_engine()?;

    let Some(countdown) = view.countdown else {
        eprintln!("no countdown running");
        return Ok(print_json(&view)?);
    };
    eprintln!("waiting for {} ...", countdown.target);

    engine.on_countdown_tick(|status| {
        eprintln!("{}", format_remaining(status.remaining_ms));
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    if let Some(event) = runtime.block_on(run_countdown(&mut engine)) {
        print_json(&event)?;
    }
    Ok(print_json(&engine.resolved_view())?)
}
