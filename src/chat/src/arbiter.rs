use common::Participant;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

struct TurnState {
    active: Participant,
    turns_completed: u64,
}

/// Monitor that hands the chat back and forth between the two participants.
///
/// Exactly one participant holds the turn at a time. A participant blocked in
/// [`TurnArbiter::wait_for_turn`] wakes when the turn is switched to it or when
/// the chat is stopped, never by polling.
pub struct TurnArbiter {
    state: Mutex<TurnState>,
    turn_changed: Condvar,
    // Only ever written while `state` is locked; read lock-free by observers.
    running: AtomicBool,
}

/// Proof that the holder currently has the turn. Releasing it is the only
/// way a worker hands the turn over; dropping it keeps the turn in place.
#[must_use = "dropping a turn without releasing it leaves the other participant waiting"]
pub struct Turn<'a> {
    arbiter: &'a TurnArbiter,
    participant: Participant,
}

impl<'a> Turn<'a> {
    pub fn participant(&self) -> Participant {
        self.participant
    }

    /// Hands the turn to the other participant.
    pub fn release(self) {
        self.arbiter.switch_turn();
    }
}

/// Outcome of [`TurnArbiter::wait_for_turn_timeout`].
pub enum TurnWait<'a> {
    Acquired(Turn<'a>),
    Stopped,
    TimedOut,
}

impl TurnArbiter {
    pub fn new() -> Self {
        TurnArbiter::starting_with(Participant::First)
    }

    pub fn starting_with(participant: Participant) -> Self {
        TurnArbiter {
            state: Mutex::new(TurnState {
                active: participant,
                turns_completed: 0,
            }),
            turn_changed: Condvar::new(),
            running: AtomicBool::new(true),
        }
    }

    // The guarded state is two plain fields written in single assignments, so
    // a panic elsewhere can never leave it half updated.
    fn lock_state(&self) -> MutexGuard<'_, TurnState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn keep_waiting(&self, state: &TurnState, participant: Participant) -> bool {
        self.running.load(Ordering::SeqCst) && state.active != participant
    }

    /*
     * Name: wait_for_turn
     * Function: Blocks until `participant` holds the turn or the chat stops.
     *           Returns None once the chat has stopped.
     */
    pub fn wait_for_turn(&self, participant: Participant) -> Option<Turn<'_>> {
        let state = self.lock_state();
        let state = self
            .turn_changed
            .wait_while(state, |s| self.keep_waiting(s, participant))
            .unwrap_or_else(PoisonError::into_inner);

        if self.running.load(Ordering::SeqCst) && state.active == participant {
            Some(Turn {
                arbiter: self,
                participant,
            })
        } else {
            None
        }
    }

    /// Same as [`TurnArbiter::wait_for_turn`], giving up after `timeout`.
    pub fn wait_for_turn_timeout(&self, participant: Participant, timeout: Duration) -> TurnWait<'_> {
        let state = self.lock_state();
        let (state, _) = self
            .turn_changed
            .wait_timeout_while(state, timeout, |s| self.keep_waiting(s, participant))
            .unwrap_or_else(PoisonError::into_inner);

        if !self.running.load(Ordering::SeqCst) {
            TurnWait::Stopped
        } else if state.active == participant {
            TurnWait::Acquired(Turn {
                arbiter: self,
                participant,
            })
        } else {
            TurnWait::TimedOut
        }
    }

    /// Flips the turn to the other participant and wakes every waiter.
    ///
    /// Must only be called by the current turn holder; [`Turn::release`] is
    /// the way workers reach it.
    pub fn switch_turn(&self) {
        let mut state = self.lock_state();
        state.active = state.active.other();
        state.turns_completed += 1;
        self.turn_changed.notify_all();
    }

    /// Stops the chat for good and wakes every waiter. Returns true only for
    /// the call that actually performed the transition.
    pub fn stop(&self) -> bool {
        let _state = self.lock_state();
        let was_running = self.running.swap(false, Ordering::SeqCst);
        self.turn_changed.notify_all();
        was_running
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_active(&self, participant: Participant) -> bool {
        self.lock_state().active == participant
    }

    pub fn active_participant(&self) -> Participant {
        self.lock_state().active
    }

    pub fn turns_completed(&self) -> u64 {
        self.lock_state().turns_completed
    }
}

impl Default for TurnArbiter {
    fn default() -> Self {
        TurnArbiter::new()
    }
}
