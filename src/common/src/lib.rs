/**********************************
            IMPORTS
**********************************/
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/*************************************
        PROTOCOL CONSTANTS
**************************************/
pub const EXIT_KEYWORD: &str = "exit";
pub const DEFAULT_TURN_DELAY_MS: u64 = 100;
pub const DEFAULT_CHANNEL_FILE: &str = "chat_log.txt";
pub const DEFAULT_EVENT_LOG: &str = "chat_events.log";
pub const DEFAULT_CONFIG_FILE: &str = "turnchat.json";
pub const CONFIG_ENV_VAR: &str = "TURNCHAT_CONFIG";

/*************************************
            PARTICIPANTS
**************************************/
pub static PARTICIPANTS: [Participant; 2] = [Participant::First, Participant::Second];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Participant {
    First,
    Second,
}

impl Participant {
    pub fn other(self) -> Participant {
        match self {
            Participant::First => Participant::Second,
            Participant::Second => Participant::First,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Participant::First => 1,
            Participant::Second => 2,
        }
    }

    /// Human readable tag, also used as the sender field of the stored line.
    pub fn label(self) -> &'static str {
        match self {
            Participant::First => "Chat1",
            Participant::Second => "Chat2",
        }
    }

    pub fn from_label(label: &str) -> Option<Participant> {
        let label = label.trim();
        PARTICIPANTS.iter().copied().find(|p| p.label() == label)
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/*************************************
        CHANNEL MESSAGE
**************************************/

// The single slot exchanged between participants. `sender == None` means
// nothing has been written yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub sender: Option<Participant>,
    pub text: String,
}

impl ChannelMessage {
    pub fn new(sender: Participant, text: impl Into<String>) -> Self {
        ChannelMessage {
            sender: Some(sender),
            text: text.into(),
        }
    }

    pub fn empty() -> Self {
        ChannelMessage {
            sender: None,
            text: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sender.is_none()
    }
}

/*
 * Name: encode_line
 * Function: Serializes a message into the stored form "{label}: {text}".
 *           Line terminators inside the text become spaces so the stored
 *           content always stays a single line.
 */
pub fn encode_line(message: &ChannelMessage) -> String {
    let sender = match message.sender {
        Some(sender) => sender,
        None => return String::new(),
    };

    let text: String = message
        .text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    format!("{}: {}", sender.label(), text)
}

/*
 * Name: decode_line
 * Function: Parses stored content back into a message. Empty content, a line
 *           without a ':' separator or an unknown sender label all mean
 *           "no message yet".
 */
pub fn decode_line(content: &str) -> ChannelMessage {
    let line = match content.lines().next() {
        Some(line) => line,
        None => return ChannelMessage::empty(),
    };

    let (label, rest) = match line.split_once(':') {
        Some(parts) => parts,
        None => return ChannelMessage::empty(),
    };

    match Participant::from_label(label) {
        Some(sender) => ChannelMessage::new(sender, rest.strip_prefix(' ').unwrap_or(rest)),
        None => ChannelMessage::empty(),
    }
}

/*************************************
            ERRORS
**************************************/
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration in {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} worker panicked")]
    WorkerPanicked(Participant),
}

/*************************************
            CONFIGURATION
**************************************/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelBackend {
    Memory,
    #[default]
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub channel: ChannelBackend,
    pub channel_path: PathBuf,
    pub turn_delay_ms: u64,
    pub event_log: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig {
            channel: ChannelBackend::File,
            channel_path: PathBuf::from(DEFAULT_CHANNEL_FILE),
            turn_delay_ms: DEFAULT_TURN_DELAY_MS,
            event_log: Some(PathBuf::from(DEFAULT_EVENT_LOG)),
        }
    }
}

impl ChatConfig {
    /// Location of the configuration file: `$TURNCHAT_CONFIG` if set,
    /// otherwise `turnchat.json` in the working directory.
    pub fn config_path() -> PathBuf {
        env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Loads the configuration at `path`. A missing file is not an error and
    /// yields the defaults; fields absent from the file keep their defaults.
    pub fn load(path: &Path) -> Result<ChatConfig, ChatError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ChatConfig::default()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&raw).map_err(|source| ChatError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn turn_delay(&self) -> Duration {
        Duration::from_millis(self.turn_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_participant_other_alternates() {
        assert_eq!(Participant::First.other(), Participant::Second);
        assert_eq!(Participant::Second.other(), Participant::First);
        assert_eq!(Participant::First.other().other(), Participant::First);
    }

    #[test]
    fn test_participant_labels() {
        assert_eq!(Participant::First.label(), "Chat1");
        assert_eq!(Participant::Second.to_string(), "Chat2");
        assert_eq!(Participant::from_label("Chat2"), Some(Participant::Second));
        assert_eq!(Participant::from_label(" Chat1"), Some(Participant::First));
        assert_eq!(Participant::from_label("Chat3"), None);
    }

    #[test]
    fn test_encode_line() {
        let msg = ChannelMessage::new(Participant::First, "hello");
        assert_eq!(encode_line(&msg), "Chat1: hello");
        assert_eq!(encode_line(&ChannelMessage::empty()), "");

        let multiline = ChannelMessage::new(Participant::Second, "a\nb");
        assert_eq!(encode_line(&multiline), "Chat2: a b");
    }

    #[test]
    fn test_decode_line() {
        assert_eq!(
            decode_line("Chat2: hi"),
            ChannelMessage::new(Participant::Second, "hi")
        );
        // Only the first colon separates the sender.
        assert_eq!(
            decode_line("Chat1: time: 12:30"),
            ChannelMessage::new(Participant::First, "time: 12:30")
        );
        assert_eq!(
            decode_line("Chat1:"),
            ChannelMessage::new(Participant::First, "")
        );
        assert_eq!(
            decode_line("Chat1: привет"),
            ChannelMessage::new(Participant::First, "привет")
        );
    }

    #[test]
    fn test_decode_malformed_is_empty() {
        assert!(decode_line("").is_empty());
        assert!(decode_line("no separator here").is_empty());
        assert!(decode_line("Stranger: hello").is_empty());
        assert!(decode_line("\nChat1: hidden on second line").is_empty());
    }

    #[test]
    fn test_config_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = ChatConfig::load(&dir.path().join("absent.json"))
            .expect("Missing config should not be an error");
        assert_eq!(config, ChatConfig::default());
        assert_eq!(config.turn_delay(), Duration::from_millis(100));
        assert_eq!(config.channel, ChannelBackend::File);
    }

    #[test]
    fn test_config_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("turnchat.json");
        let mut file = fs::File::create(&path).expect("Failed to create config");
        write!(file, r#"{{ "channel": "memory", "turn_delay_ms": 0, "event_log": null }}"#)
            .expect("Failed to write config");

        let config = ChatConfig::load(&path).expect("Failed to load config");
        assert_eq!(config.channel, ChannelBackend::Memory);
        assert_eq!(config.turn_delay_ms, 0);
        assert_eq!(config.event_log, None);
        assert_eq!(config.channel_path, PathBuf::from(DEFAULT_CHANNEL_FILE));
    }

    #[test]
    fn test_config_malformed_file_is_error() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("turnchat.json");
        fs::write(&path, "{ not json").expect("Failed to write config");

        match ChatConfig::load(&path) {
            Err(ChatError::Config { path: bad, .. }) => assert_eq!(bad, path),
            other => panic!("Expected a config error, got {:?}", other),
        }
    }
}
