use crate::events::{ChatEvent, EventLog};
use common::{decode_line, encode_line, ChannelBackend, ChannelMessage, ChatConfig, Participant};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;

/// Single-slot store the two participants exchange messages through.
///
/// A write replaces the previous message entirely; a read never blocks and
/// returns [`ChannelMessage::empty`] when nothing has been written.
pub trait SharedChannel: Send + Sync {
    fn write(&self, sender: Participant, text: &str);
    fn read(&self) -> ChannelMessage;
}

/*
 * Name: open_channel
 * Function: Builds the channel backend selected by the configuration. The
 *           file backend starts from an emptied file.
 */
pub fn open_channel(config: &ChatConfig, events: &EventLog) -> Box<dyn SharedChannel> {
    match config.channel {
        ChannelBackend::Memory => Box::new(MemoryChannel::new()),
        ChannelBackend::File => Box::new(FileChannel::create(&config.channel_path, events.clone())),
    }
}

/****************
    IN MEMORY
****************/
#[derive(Default)]
pub struct MemoryChannel {
    slot: Mutex<ChannelMessage>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        MemoryChannel::default()
    }
}

impl SharedChannel for MemoryChannel {
    fn write(&self, sender: Participant, text: &str) {
        let message = ChannelMessage::new(sender, text);
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = message;
    }

    fn read(&self) -> ChannelMessage {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/****************
    FILE BACKED
****************/

// Holds the message as one "{label}: {text}" line. Any I/O failure is logged
// and treated as message loss: reads come back empty, writes are dropped.
pub struct FileChannel {
    path: PathBuf,
    events: EventLog,
}

impl FileChannel {
    /// Attaches to `path` and truncates it so a stale message from an earlier
    /// run is never read.
    pub fn create(path: impl Into<PathBuf>, events: EventLog) -> FileChannel {
        let channel = FileChannel::attach(path, events);
        if let Err(e) = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&channel.path)
        {
            channel.report("clear", e);
        }
        channel
    }

    /// Attaches to `path` as is, e.g. from a second process sharing the file.
    pub fn attach(path: impl Into<PathBuf>, events: EventLog) -> FileChannel {
        FileChannel {
            path: path.into(),
            events,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn report(&self, action: &str, e: std::io::Error) {
        self.events.record(
            None,
            ChatEvent::ChannelError,
            &format!("Failed to {} {}: {}", action, self.path.display(), e),
        );
    }

    // Each write goes to its own temporary file next to the channel file and
    // is then renamed over it, so a reader in another process sees either the
    // old line or the new one and concurrent writers never share staging.
    fn replace_contents(&self, line: &str) -> std::io::Result<()> {
        let mut staged = NamedTempFile::new_in(self.directory())?;
        staged.write_all(line.as_bytes())?;
        staged.flush()?;
        staged.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl SharedChannel for FileChannel {
    fn write(&self, sender: Participant, text: &str) {
        let line = encode_line(&ChannelMessage::new(sender, text));
        if let Err(e) = self.replace_contents(&line) {
            self.report("write", e);
        }
    }

    fn read(&self) -> ChannelMessage {
        match fs::read_to_string(&self.path) {
            Ok(contents) => decode_line(&contents),
            Err(e) if e.kind() == ErrorKind::NotFound => ChannelMessage::empty(),
            Err(e) => {
                self.report("read", e);
                ChannelMessage::empty()
            }
        }
    }
}
