use crate::arbiter::TurnArbiter;
use crate::channel::SharedChannel;
use crate::console::ChatConsole;
use crate::events::EventLog;
use crate::worker::{ParticipantWorker, WorkerReport};
use common::{ChatError, PARTICIPANTS};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/*
 * Name: run_chat
 * Function: Starts one worker thread per participant and waits for both.
 *           A worker that panicked is reported once both threads are done.
 */
pub fn run_chat(
    arbiter: Arc<TurnArbiter>,
    channel: Arc<dyn SharedChannel>,
    console: Arc<dyn ChatConsole>,
    events: EventLog,
    turn_delay: Duration,
) -> Result<Vec<WorkerReport>, ChatError> {
    run_workers(arbiter, channel, console, events, turn_delay, spawn_worker)
}

fn spawn_worker(name: String, worker: ParticipantWorker) -> io::Result<JoinHandle<WorkerReport>> {
    thread::Builder::new().name(name).spawn(move || worker.run())
}

fn run_workers<S>(
    arbiter: Arc<TurnArbiter>,
    channel: Arc<dyn SharedChannel>,
    console: Arc<dyn ChatConsole>,
    events: EventLog,
    turn_delay: Duration,
    mut spawn: S,
) -> Result<Vec<WorkerReport>, ChatError>
where
    S: FnMut(String, ParticipantWorker) -> io::Result<JoinHandle<WorkerReport>>,
{
    let mut handles = Vec::with_capacity(PARTICIPANTS.len());

    for participant in PARTICIPANTS {
        let worker = ParticipantWorker::new(
            participant,
            Arc::clone(&arbiter),
            Arc::clone(&channel),
            Arc::clone(&console),
            events.clone(),
            turn_delay,
        );

        match spawn(format!("chat-{}", participant.id()), worker) {
            Ok(handle) => handles.push((participant, handle)),
            Err(e) => {
                // Wake the workers already running so they can be joined.
                arbiter.stop();
                for (_, handle) in handles {
                    let _ = handle.join();
                }
                return Err(e.into());
            }
        }
    }

    let mut reports = Vec::with_capacity(handles.len());
    let mut failure = None;
    for (participant, handle) in handles {
        match handle.join() {
            Ok(report) => reports.push(report),
            Err(_) => {
                eprintln!("{} worker stopped unexpectedly", participant);
                failure.get_or_insert(ChatError::WorkerPanicked(participant));
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(reports),
    }
}
