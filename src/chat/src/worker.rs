use crate::arbiter::{Turn, TurnArbiter};
use crate::channel::SharedChannel;
use crate::console::ChatConsole;
use crate::events::{ChatEvent, EventLog};
use common::{Participant, EXIT_KEYWORD};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    WaitingTurn,
    Reading,
    Sending,
    Skipping,
    Releasing,
    Stopped,
}

// A worker's position in its cycle. Every state in which the worker may touch
// the channel carries the turn it holds.
enum Step<'a> {
    WaitingTurn,
    Reading(Turn<'a>),
    Sending(Turn<'a>),
    Skipping(Turn<'a>),
    Releasing(Turn<'a>),
    Stopped,
}

#[cfg(test)]
impl Step<'_> {
    fn state(&self) -> WorkerState {
        match self {
            Step::WaitingTurn => WorkerState::WaitingTurn,
            Step::Reading(_) => WorkerState::Reading,
            Step::Sending(_) => WorkerState::Sending,
            Step::Skipping(_) => WorkerState::Skipping,
            Step::Releasing(_) => WorkerState::Releasing,
            Step::Stopped => WorkerState::Stopped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub participant: Participant,
    pub turns_taken: u64,
    pub messages_sent: u64,
    pub stopped_chat: bool,
    // Every state the worker passed through, kept for tests only.
    #[cfg(test)]
    pub states: Vec<WorkerState>,
}

pub struct ParticipantWorker {
    participant: Participant,
    arbiter: Arc<TurnArbiter>,
    channel: Arc<dyn SharedChannel>,
    console: Arc<dyn ChatConsole>,
    events: EventLog,
    turn_delay: Duration,
}

// Stops the chat if the worker unwinds, so its partner is not left waiting
// for a turn that will never be released.
struct StopOnPanic<'a>(&'a TurnArbiter);

impl Drop for StopOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.stop();
        }
    }
}

impl ParticipantWorker {
    pub fn new(
        participant: Participant,
        arbiter: Arc<TurnArbiter>,
        channel: Arc<dyn SharedChannel>,
        console: Arc<dyn ChatConsole>,
        events: EventLog,
        turn_delay: Duration,
    ) -> Self {
        ParticipantWorker {
            participant,
            arbiter,
            channel,
            console,
            events,
            turn_delay,
        }
    }

    /*
     * Name: run
     * Function: Takes turns until the chat stops: wait for the turn, show the
     *           current message, send a line of input, hand the turn over.
     */
    pub fn run(&self) -> WorkerReport {
        let _guard = StopOnPanic(self.arbiter.as_ref());
        let mut report = WorkerReport {
            participant: self.participant,
            turns_taken: 0,
            messages_sent: 0,
            stopped_chat: false,
            #[cfg(test)]
            states: Vec::new(),
        };

        let mut step = Step::WaitingTurn;
        loop {
            #[cfg(test)]
            report.states.push(step.state());
            step = match step {
                Step::WaitingTurn => self.wait(&mut report),
                Step::Reading(turn) => self.read(turn),
                Step::Sending(turn) => self.send(turn, &mut report),
                Step::Skipping(turn) => Step::Releasing(turn),
                Step::Releasing(turn) => self.release(turn),
                Step::Stopped => break,
            };
        }

        self.events.record(
            Some(self.participant),
            ChatEvent::Stopped,
            &format!(
                "{} turns, {} messages sent",
                report.turns_taken, report.messages_sent
            ),
        );
        report
    }

    fn wait(&self, report: &mut WorkerReport) -> Step<'_> {
        match self.arbiter.wait_for_turn(self.participant) {
            Some(turn) => {
                report.turns_taken += 1;
                self.events
                    .record(Some(self.participant), ChatEvent::TurnAcquired, "");
                Step::Reading(turn)
            }
            None => Step::Stopped,
        }
    }

    fn read<'a>(&self, turn: Turn<'a>) -> Step<'a> {
        let message = self.channel.read();
        if let Some(sender) = message.sender {
            self.console.render(
                self.participant,
                &format!(
                    "{} read {}: \"{}\"",
                    self.participant.label(),
                    sender.label(),
                    message.text
                ),
            );
            self.events
                .record(Some(self.participant), ChatEvent::Read, &message.text);
        }

        if self.arbiter.is_active(self.participant) {
            Step::Sending(turn)
        } else {
            Step::Skipping(turn)
        }
    }

    // Exiting keeps the turn: the chat is over, there is nobody to hand it to.
    fn send<'a>(&self, turn: Turn<'a>, report: &mut WorkerReport) -> Step<'a> {
        let line = self.console.read_line(self.participant);

        // Stopped while this worker sat on its input read: drop the line.
        if !self.arbiter.is_running() {
            drop(turn);
            return Step::Stopped;
        }

        match line {
            Some(line) if line != EXIT_KEYWORD => {
                self.channel.write(turn.participant(), &line);
                report.messages_sent += 1;
                self.events
                    .record(Some(self.participant), ChatEvent::Sent, &line);
                Step::Releasing(turn)
            }
            _ => {
                drop(turn);
                self.arbiter.stop();
                report.stopped_chat = true;
                self.events.record(Some(self.participant), ChatEvent::Exit, "");
                Step::Stopped
            }
        }
    }

    fn release<'a>(&self, turn: Turn<'a>) -> Step<'a> {
        turn.release();
        self.events
            .record(Some(self.participant), ChatEvent::Released, "");
        if !self.turn_delay.is_zero() {
            thread::sleep(self.turn_delay);
        }
        Step::WaitingTurn
    }
}
