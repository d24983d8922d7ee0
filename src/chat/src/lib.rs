//! Two participants taking strict turns over a single shared message slot.
//!
//! The [`arbiter::TurnArbiter`] decides whose turn it is, the
//! [`channel::SharedChannel`] holds the latest message, and one
//! [`worker::ParticipantWorker`] per participant runs the read / send /
//! release cycle. [`driver::run_chat`] wires the two workers together.

pub mod arbiter;
pub mod channel;
pub mod console;
pub mod driver;
pub mod events;
pub mod worker;

pub use driver::run_chat;
