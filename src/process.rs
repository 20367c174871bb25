/* Copyright © 2018 Gianmarco Garrisi

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>. */

//! Resumable processes: a hand-rolled state machine driven by the kernel's
//! handler dispatch, used in place of generators or async/await.
//!
//! A process does not run on its own stack. Instead, [`ProcessLogic::resume`]
//! is called once per suspension point and returns where to pick up next.
//! Implementors typically keep a `pc: u32` field (a program counter) and
//! `match` on it, the same technique `simcpp`'s C++ processes used before
//! coroutines existed in that language.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::trace;

use crate::event::Event;
use crate::sim::Simulation;

/// What a process wants to do after a call to [`ProcessLogic::resume`].
pub enum Resume {
    /// Suspend until `0` triggers, then call `resume` again.
    Await(Event),
    /// The process has finished; its handle's event triggers immediately.
    Done,
}

/// The body of a process.
///
/// Implementors hold whatever state the process needs across suspension
/// points (a program counter, local variables that would otherwise live on a
/// generator's stack) and advance it one step at a time in `resume`.
pub trait ProcessLogic {
    /// Called once to start the process and again every time an event it
    /// returned from [`Resume::Await`] triggers.
    fn resume(&mut self, sim: &Simulation) -> Resume;

    /// Called if the process is aborted while suspended. The default does
    /// nothing; override to release resources the process was holding.
    fn on_aborted(&mut self) {}
}

struct ProcessState {
    event: Event,
    logic: RefCell<Box<dyn ProcessLogic>>,
}

/// A handle to a running (or finished) process.
///
/// `ProcessHandle` is itself usable wherever an [`Event`] is: it triggers
/// once the process's `resume` first returns [`Resume::Done`]. Cloning a
/// handle does not start a second process, it creates another reference to
/// the same one.
#[derive(Clone)]
pub struct ProcessHandle(Rc<ProcessState>);

impl ProcessHandle {
    /// The process's completion event.
    pub fn event(&self) -> Event {
        self.0.event.clone()
    }

    /// Still running (has not reached [`Resume::Done`] and was not aborted).
    pub fn is_pending(&self) -> bool {
        self.0.event.is_pending()
    }

    /// `resume` has returned [`Resume::Done`], whether or not the completion
    /// event has been dispatched yet.
    pub fn is_triggered(&self) -> bool {
        self.0.event.is_triggered()
    }

    /// The completion event has been dispatched.
    pub fn is_processed(&self) -> bool {
        self.0.event.is_processed()
    }

    /// The process was cancelled before it finished.
    pub fn is_aborted(&self) -> bool {
        self.0.event.is_aborted()
    }

    /// Cancels the process. A no-op if it has already finished or was
    /// already aborted. Runs [`ProcessLogic::on_aborted`] via the completion
    /// event's abort hook (see [`start`]) before returning.
    pub fn abort(&self) -> bool {
        self.0.event.abort()
    }
}

impl From<ProcessHandle> for Event {
    fn from(handle: ProcessHandle) -> Self {
        handle.event()
    }
}

/// Starts `logic` running: schedules an immediate (zero-delay) first resume
/// and returns the handle the caller will use to track completion.
///
/// The start event and the per-suspension handlers below capture only a
/// [`Weak`] reference to the kernel (never the owning `Simulation`/`Rc`
/// directly) so that a process that never finishes does not leak a
/// reference cycle through the FEL back to itself.
pub(crate) fn start(sim: &Simulation, logic: impl ProcessLogic + 'static) -> ProcessHandle {
    let state = Rc::new(ProcessState {
        event: sim.event(),
        logic: RefCell::new(Box::new(logic)),
    });

    let abort_state: Weak<ProcessState> = Rc::downgrade(&state);
    state.event.on_abort(move || {
        if let Some(state) = abort_state.upgrade() {
            state.logic.borrow_mut().on_aborted();
        }
    });

    let handle = ProcessHandle(state);
    let weak_sim = sim.weak();
    let weak_handle = handle.clone();
    let start_event = sim.event();
    start_event.add_handler(move || {
        if let Some(sim) = Simulation::from_weak(&weak_sim) {
            drive(&sim, &weak_handle);
        }
    });
    let _ = start_event.trigger(0.0);

    trace!("process started");
    handle
}

/// Runs `handle`'s process forward until it either suspends on a pending
/// event or finishes. Called once to kick the process off and again every
/// time a suspension event triggers.
pub(crate) fn drive(sim: &Simulation, handle: &ProcessHandle) {
    if !handle.is_pending() {
        return;
    }
    let next = handle.0.logic.borrow_mut().resume(sim);
    match next {
        Resume::Done => {
            trace!("process done");
            let _ = handle.0.event.trigger(0.0);
        }
        Resume::Await(event) => {
            let weak_sim = sim.weak();
            let weak_handle = handle.clone();
            let attached = event.add_handler(move || {
                if let Some(sim) = Simulation::from_weak(&weak_sim) {
                    drive(&sim, &weak_handle);
                }
            });
            if !attached {
                // The awaited event was already triggered (or processed) by
                // the time we asked: it will never run our handler, so pick
                // the process back up immediately instead of stalling.
                drive(sim, handle);
            }
        }
    }
}
