/****************
    IMPORTS
****************/
use common::{ChatConfig, ChatError, EXIT_KEYWORD};
use std::process::ExitCode;
use std::sync::Arc;
use turnchat::arbiter::TurnArbiter;
use turnchat::channel::{open_channel, SharedChannel};
use turnchat::console::StdConsole;
use turnchat::events::{ChatEvent, EventLog};
use turnchat::run_chat;

fn run() -> Result<(), ChatError> {
    println!("=== Turn-based chat ===");
    println!("The chats take turns sending and receiving messages");
    println!("Type '{}' to quit", EXIT_KEYWORD);
    println!();

    let config = ChatConfig::load(&ChatConfig::config_path())?;
    let events = EventLog::from_config(&config);
    let channel: Arc<dyn SharedChannel> = Arc::from(open_channel(&config, &events));
    let arbiter = Arc::new(TurnArbiter::new());

    // Ctrl-C stops the chat the same way "exit" does; a participant waiting
    // on input finishes that read first.
    let handler_arbiter = Arc::clone(&arbiter);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_arbiter.stop();
    }) {
        eprintln!("Could not install Ctrl-C handler: {}", e);
    }

    let reports = run_chat(
        arbiter,
        channel,
        Arc::new(StdConsole),
        events.clone(),
        config.turn_delay(),
    )?;

    let turns: u64 = reports.iter().map(|r| r.turns_taken).sum();
    events.record(None, ChatEvent::Stopped, &format!("chat finished after {} turns", turns));

    println!("Chat finished.");
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

