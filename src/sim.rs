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

//! The [`Simulation`] façade: the clock, the future event list, and the
//! step/run/advance family that drives both.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::{Rc, Weak};

use log::debug;

use crate::error::SimError;
use crate::event::Event;
use crate::process::{self, ProcessHandle, ProcessLogic};
use crate::SimTime;

struct QueuedEvent {
    time: SimTime,
    seq: u64,
    event: Event,
}

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}
impl Eq for QueuedEvent {}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedEvent {
    // Min-heap by (time, seq): BinaryHeap is a max-heap, so callers store
    // `Reverse(QueuedEvent)` to pop the earliest-scheduled event first.
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.partial_cmp(&other.time) {
            Some(ord) => ord.then_with(|| self.seq.cmp(&other.seq)),
            None => panic!("event time was uncomparable. Maybe a NaN"),
        }
    }
}

pub(crate) struct SimCore {
    now: SimTime,
    next_id: u64,
    fel: BinaryHeap<std::cmp::Reverse<QueuedEvent>>,
}

impl SimCore {
    /// Enqueues `event` at `now + delay` with a fresh, monotonically
    /// increasing sequence number, and returns that sequence number (used
    /// only for diagnostics).
    pub(crate) fn schedule(this: &Rc<RefCell<SimCore>>, event: Event, delay: SimTime) -> u64 {
        let mut core = this.borrow_mut();
        let seq = core.next_id;
        core.next_id += 1;
        let time = core.now + delay;
        core.fel.push(std::cmp::Reverse(QueuedEvent { time, seq, event }));
        seq
    }
}

/// Entry point of the simulation kernel.
///
/// Owns the virtual clock and the future event list. `Simulation` is a
/// cheap, reference-counted handle. Clone it freely to hand copies to
/// processes and example models; every clone drives the same clock and FEL.
#[derive(Clone)]
pub struct Simulation(Rc<RefCell<SimCore>>);

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    /// Creates a new simulation with `now = 0` and an empty FEL.
    pub fn new() -> Self {
        Simulation(Rc::new(RefCell::new(SimCore {
            now: 0.0,
            next_id: 0,
            fel: BinaryHeap::new(),
        })))
    }

    /// The current virtual time.
    pub fn now(&self) -> SimTime {
        self.0.borrow().now
    }

    /// A fresh, `Pending` event bound to this simulation.
    pub fn event(&self) -> Event {
        Event::new(Rc::downgrade(&self.0))
    }

    /// A fresh event already triggered to fire `delay` time units from now.
    /// `delay` must be non-negative.
    pub fn timeout(&self, delay: SimTime) -> Result<Event, SimError> {
        let event = self.event();
        event.trigger(delay)?;
        Ok(event)
    }

    /// A composite event that triggers as soon as any member of `events`
    /// triggers (immediately, if `events` is empty or already has a
    /// triggered member). See the crate documentation for the full
    /// semantics.
    pub fn any_of(&self, events: impl IntoIterator<Item = Event>) -> Event {
        crate::composite::any_of(self, events)
    }

    /// A composite event that triggers once every member of `events` has
    /// triggered (immediately, if `events` is empty or all members are
    /// already triggered). See the crate documentation for the full
    /// semantics.
    pub fn all_of(&self, events: impl IntoIterator<Item = Event>) -> Event {
        crate::composite::all_of(self, events)
    }

    /// Starts `logic` as a process: schedules its first resume at the
    /// current time and returns a handle that is itself usable as an event,
    /// triggering once the process finishes.
    pub fn start_process(&self, logic: impl ProcessLogic + 'static) -> ProcessHandle {
        process::start(self, logic)
    }

    /// Pops and dispatches the single earliest-scheduled event, advancing
    /// `now` to its time. Returns whether there was an event to process.
    pub fn step(&self) -> bool {
        let popped = { self.0.borrow_mut().fel.pop() };
        match popped {
            Some(std::cmp::Reverse(queued)) => {
                self.0.borrow_mut().now = queued.time;
                debug!("step now={}", queued.time);
                queued.event.dispatch();
                true
            }
            None => false,
        }
    }

    /// Steps through every event due at or before `now + duration`, then
    /// unconditionally sets `now := now + duration`, so the clock reaches the
    /// target even if the FEL empties before then. `duration` must be
    /// non-negative.
    pub fn advance_by(&self, duration: SimTime) -> Result<(), SimError> {
        if duration < 0.0 {
            return Err(SimError::InvalidDelay(duration));
        }
        let target = self.now() + duration;
        while self.peek_next_time().is_some_and(|t| t <= target) {
            self.step();
        }
        self.0.borrow_mut().now = target;
        Ok(())
    }

    /// Steps until `event` is no longer pending or the FEL is empty.
    /// Returns whether `event` ended up triggered (as opposed to aborted, or
    /// left pending because the FEL ran dry).
    pub fn advance_to(&self, event: &Event) -> bool {
        while event.is_pending() && self.has_next() {
            self.step();
        }
        event.is_triggered()
    }

    /// Steps until the FEL is empty.
    pub fn run(&self) {
        while self.step() {}
    }

    /// Whether the FEL holds at least one event.
    pub fn has_next(&self) -> bool {
        !self.0.borrow().fel.is_empty()
    }

    /// The time of the next event due to be popped, if any.
    pub fn peek_next_time(&self) -> Option<SimTime> {
        self.0.borrow().fel.peek().map(|std::cmp::Reverse(q)| q.time)
    }

    pub(crate) fn weak(&self) -> Weak<RefCell<SimCore>> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn from_weak(weak: &Weak<RefCell<SimCore>>) -> Option<Simulation> {
        weak.upgrade().map(Simulation)
    }
}
