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

//! The one-shot [`Event`] signal and its four-state lifecycle.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use log::trace;

use crate::error::SimError;
use crate::sim::SimCore;
use crate::SimTime;

/// Where an [`Event`] currently sits in its lifecycle.
///
/// Valid transitions are `Pending -> Triggered -> Processed` and
/// `Pending -> Aborted`; every other transition is rejected by the event
/// itself and never observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventState {
    /// Not yet triggered. Handlers may still be attached. An event
    /// scheduled with a positive delay stays `Pending` (with an entry
    /// sitting in the FEL) until that entry is actually popped.
    Pending,
    /// `trigger(0.0)` has run synchronously: the event is committed to fire
    /// at the current time and no longer accepts handlers or an abort, even
    /// though dispatch itself has not happened yet.
    Triggered,
    /// The event has been popped from the FEL and its handlers have run.
    Processed,
    /// `abort()` was called while the event was pending.
    Aborted,
}

/// A callback invoked at most once, when the [`Event`] it is attached to is
/// dispatched.
pub(crate) type Handler = Box<dyn FnOnce()>;

pub(crate) struct EventInner {
    state: Cell<EventState>,
    handlers: RefCell<Vec<Handler>>,
    sim: Weak<RefCell<SimCore>>,
    abort_hook: RefCell<Option<Box<dyn FnMut()>>>,
}

/// A one-shot signal that a [`Process`](crate::ProcessLogic) may suspend on
/// and that arbitrary handlers may be attached to.
///
/// `Event` is a cheap, reference-counted handle: cloning it does not create a
/// new event, it creates another handle to the same underlying signal. This
/// is what lets a `Customer` process hand the same `Event` to both a resource
/// queue and an `any_of` timeout race without either side owning it
/// exclusively.
#[derive(Clone)]
pub struct Event(pub(crate) Rc<EventInner>);

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event").field("state", &self.state()).finish()
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Event {}

impl Event {
    pub(crate) fn new(sim: Weak<RefCell<SimCore>>) -> Self {
        Event(Rc::new(EventInner {
            state: Cell::new(EventState::Pending),
            handlers: RefCell::new(Vec::new()),
            sim,
            abort_hook: RefCell::new(None),
        }))
    }

    /// The event's current state.
    pub fn state(&self) -> EventState {
        self.0.state.get()
    }

    /// Still waiting to be triggered; handlers may be attached.
    pub fn is_pending(&self) -> bool {
        self.state() == EventState::Pending
    }

    /// `trigger()` has run, whether or not dispatch has happened yet.
    pub fn is_triggered(&self) -> bool {
        matches!(self.state(), EventState::Triggered | EventState::Processed)
    }

    /// Dispatch has completed: every handler has run exactly once.
    pub fn is_processed(&self) -> bool {
        self.state() == EventState::Processed
    }

    /// The event was cancelled before it could trigger.
    pub fn is_aborted(&self) -> bool {
        self.state() == EventState::Aborted
    }

    /// Appends `handler` to this event's handler list, to be invoked once,
    /// in registration order, when the event is dispatched.
    ///
    /// Returns `false` without invoking `handler` if the event is not
    /// `Pending` (already triggered, already processed, or aborted). Callers
    /// that need "run now if already triggered" semantics must check
    /// [`Event::is_triggered`] themselves before calling this; this is
    /// exactly what [`Simulation::any_of`](crate::Simulation::any_of) and
    /// process suspension do.
    pub fn add_handler(&self, handler: impl FnOnce() + 'static) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.0.handlers.borrow_mut().push(Box::new(handler));
        true
    }

    /// Registers a hook run when [`Event::abort`] succeeds. Intended for
    /// resource-like collaborators that need to react to the cancellation of
    /// one of their own pending requests; the kernel itself never calls this
    /// except from `abort()`. Only one hook may be registered; a later call
    /// replaces an earlier one.
    pub fn on_abort(&self, hook: impl FnMut() + 'static) {
        *self.0.abort_hook.borrow_mut() = Some(Box::new(hook));
    }

    /// Schedules this event to trigger `delay` simulation time units from
    /// now. Only legal from `Pending`; returns `Ok(false)` as a no-op
    /// otherwise. A negative `delay` is rejected with
    /// [`SimError::InvalidDelay`] before any state is touched.
    ///
    /// Only a zero delay flips the state to `Triggered` synchronously (so
    /// `is_triggered()` is true for the rest of the current call chain even
    /// though dispatch has not happened yet); a positive delay leaves the
    /// event `Pending` until the scheduler actually pops it off the FEL and
    /// dispatches it. This asymmetry is what lets [`Simulation::any_of`] and
    /// [`Simulation::all_of`] tell "already resolved" members from merely
    /// "scheduled for later" ones by checking `is_triggered()`.
    pub fn trigger(&self, delay: SimTime) -> Result<bool, SimError> {
        if delay < 0.0 {
            return Err(SimError::InvalidDelay(delay));
        }
        if !self.is_pending() {
            return Ok(false);
        }
        let sim = self
            .0
            .sim
            .upgrade()
            .expect("Event outlived the Simulation that created it");
        let seq = SimCore::schedule(&sim, self.clone(), delay);
        if delay == 0.0 {
            self.0.state.set(EventState::Triggered);
        }
        trace!("event#{seq} trigger delay={delay}");
        Ok(true)
    }

    /// Cancels this event. Only legal from `Pending`; returns `false` as a
    /// no-op otherwise (including on a second call: abort is idempotent).
    /// Clears the handler list and invokes the abort hook, if any. An event
    /// already sitting in the FEL at the time of abort is not removed from
    /// it; [`Event::dispatch`] treats an aborted event as a no-op when its
    /// turn comes.
    pub fn abort(&self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.0.state.set(EventState::Aborted);
        self.0.handlers.borrow_mut().clear();
        if let Some(hook) = self.0.abort_hook.borrow_mut().as_mut() {
            hook();
        }
        trace!("event aborted");
        true
    }

    /// Delivers the event's signal: marks it `Processed` and invokes every
    /// handler exactly once, in registration order. A no-op if the event is
    /// already `Processed` or `Aborted`. Called only by
    /// [`Simulation::step`](crate::Simulation::step).
    pub(crate) fn dispatch(&self) {
        if self.is_aborted() || self.is_processed() {
            return;
        }
        self.0.state.set(EventState::Processed);
        let handlers = std::mem::take(&mut *self.0.handlers.borrow_mut());
        trace!("event dispatch handlers={}", handlers.len());
        for handler in handlers {
            handler();
        }
    }
}
