use chrono::Local;
use common::{ChatConfig, Participant};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatEvent {
    TurnAcquired,
    Read,
    Sent,
    Exit,
    Released,
    Stopped,
    ChannelError,
}

impl ChatEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatEvent::TurnAcquired => "TurnAcquired",
            ChatEvent::Read => "Read",
            ChatEvent::Sent => "Sent",
            ChatEvent::Exit => "Exit",
            ChatEvent::Released => "Released",
            ChatEvent::Stopped => "Stopped",
            ChatEvent::ChannelError => "ChannelError",
        }
    }
}

/// Append-only, timestamped record of what each participant did.
/// Clones share the same underlying file.
#[derive(Clone, Default)]
pub struct EventLog {
    file: Option<Arc<Mutex<File>>>,
}

impl EventLog {
    /// Opens `path` in append mode. If it cannot be opened the failure is
    /// reported on stderr and the returned log discards every entry.
    pub fn open(path: &Path) -> EventLog {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => EventLog {
                file: Some(Arc::new(Mutex::new(file))),
            },
            Err(e) => {
                eprintln!("Failed to open {}: {}", path.display(), e);
                EventLog::disabled()
            }
        }
    }

    pub fn from_config(config: &ChatConfig) -> EventLog {
        match &config.event_log {
            Some(path) => EventLog::open(path),
            None => EventLog::disabled(),
        }
    }

    pub fn disabled() -> EventLog {
        EventLog { file: None }
    }

    /*
     * Name: record
     * Function: Writes one log entry. Failing to write is reported on stderr
     *           and never interrupts the chat.
     */
    pub fn record(&self, participant: Option<Participant>, event: ChatEvent, detail: &str) {
        if event == ChatEvent::ChannelError {
            eprintln!("[LOG] Channel error: {}", detail);
        }

        let file = match &self.file {
            Some(file) => file,
            None => return,
        };

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let label = participant.map(Participant::label).unwrap_or("-");
        let mut file = file.lock().unwrap_or_else(PoisonError::into_inner);

        if let Err(e) = writeln!(
            file,
            "[{}] Participant: {}, Event: {}, Detail: {}",
            timestamp,
            label,
            event.as_str(),
            detail
        ) {
            eprintln!("Failed to write event log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_record_appends_entries() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("events.log");

        let log = EventLog::open(&path);
        log.record(Some(Participant::First), ChatEvent::Sent, "hello");
        log.clone().record(None, ChatEvent::Stopped, "chat finished");

        let contents = fs::read_to_string(&path).expect("Failed to read event log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("Participant: Chat1, Event: Sent, Detail: hello"));
        assert!(lines[1].ends_with("Participant: -, Event: Stopped, Detail: chat finished"));
    }

    #[test]
    fn test_reopen_keeps_previous_entries() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("events.log");

        EventLog::open(&path).record(Some(Participant::Second), ChatEvent::Exit, "");
        EventLog::open(&path).record(Some(Participant::Second), ChatEvent::Read, "hi");

        let contents = fs::read_to_string(&path).expect("Failed to read event log");
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_disabled_log_writes_nothing() {
        let config = ChatConfig {
            event_log: None,
            ..ChatConfig::default()
        };

        let log = EventLog::from_config(&config);
        assert!(log.file.is_none());
        log.record(Some(Participant::First), ChatEvent::Sent, "x");
    }

    #[test]
    fn test_unopenable_log_is_disabled() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        // A directory cannot be opened for appending.
        let log = EventLog::open(dir.path());
        assert!(log.file.is_none());
        log.record(Some(Participant::First), ChatEvent::Sent, "dropped");
    }
}
