use common::Participant;
use std::io::{self, Write};

/// Terminal side of a participant: where its input lines come from and where
/// what it reads is shown.
pub trait ChatConsole: Send + Sync {
    /// Blocks for one line of input. `None` means no more input is coming.
    fn read_line(&self, participant: Participant) -> Option<String>;

    fn render(&self, participant: Participant, text: &str);
}

// Both participants share the process stdin/stdout; only the turn holder
// ever prompts, so their lines never interleave.
pub struct StdConsole;

impl ChatConsole for StdConsole {
    fn read_line(&self, participant: Participant) -> Option<String> {
        {
            let mut stdout = io::stdout().lock();
            let _ = write!(stdout, "{}: ", participant.label());
            let _ = stdout.flush();
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(trim_line_ending(line)),
            Err(e) => {
                eprintln!("Failed to read input for {}: {}", participant, e);
                None
            }
        }
    }

    fn render(&self, _participant: Participant, text: &str) {
        println!("{}", text);
    }
}

fn trim_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

#[cfg(test)]
pub use scripted::ScriptedConsole;

#[cfg(test)]
mod scripted {
    use super::ChatConsole;
    use common::Participant;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Console fed from canned input lines that records everything rendered.
    #[derive(Default)]
    pub struct ScriptedConsole {
        inputs: Mutex<HashMap<Participant, VecDeque<String>>>,
        transcript: Mutex<Vec<(Participant, String)>>,
    }

    impl ScriptedConsole {
        pub fn new() -> Self {
            ScriptedConsole::default()
        }

        pub fn with_input(self, participant: Participant, lines: &[&str]) -> Self {
            self.inputs
                .lock()
                .unwrap()
                .entry(participant)
                .or_default()
                .extend(lines.iter().map(|line| line.to_string()));
            self
        }

        pub fn transcript(&self) -> Vec<(Participant, String)> {
            self.transcript.lock().unwrap().clone()
        }
    }

    impl ChatConsole for ScriptedConsole {
        fn read_line(&self, participant: Participant) -> Option<String> {
            self.inputs
                .lock()
                .unwrap()
                .get_mut(&participant)
                .and_then(VecDeque::pop_front)
        }

        fn render(&self, participant: Participant, text: &str) {
            self.transcript
                .lock()
                .unwrap()
                .push((participant, text.to_string()));
        }
    }
}
