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

//! `any_of` and `all_of`: composite events built out of other events.

use std::cell::Cell;
use std::rc::Rc;

use crate::event::Event;
use crate::sim::Simulation;

/// An event that triggers as soon as one member of `events` triggers.
///
/// Triggers immediately (at the current time) if `events` is empty or any
/// member is already triggered when this is called. Members that have not
/// yet triggered when the race is won keep running to completion; `any_of`
/// does not abort them.
pub(crate) fn any_of(sim: &Simulation, events: impl IntoIterator<Item = Event>) -> Event {
    let combined = sim.event();
    let members: Vec<Event> = events.into_iter().collect();

    if members.is_empty() || members.iter().any(Event::is_triggered) {
        let _ = combined.trigger(0.0);
        return combined;
    }

    for member in &members {
        let combined = combined.clone();
        member.add_handler(move || {
            let _ = combined.trigger(0.0);
        });
    }
    combined
}

/// An event that triggers once every member of `events` has triggered.
///
/// Triggers immediately if `events` is empty or every member is already
/// triggered when this is called.
pub(crate) fn all_of(sim: &Simulation, events: impl IntoIterator<Item = Event>) -> Event {
    let combined = sim.event();
    let members: Vec<Event> = events.into_iter().collect();
    let remaining = Rc::new(Cell::new(members.iter().filter(|e| !e.is_triggered()).count()));

    if remaining.get() == 0 {
        let _ = combined.trigger(0.0);
        return combined;
    }

    for member in &members {
        if member.is_triggered() {
            continue;
        }
        let combined = combined.clone();
        let remaining = Rc::clone(&remaining);
        member.add_handler(move || {
            remaining.set(remaining.get() - 1);
            if remaining.get() == 0 {
                let _ = combined.trigger(0.0);
            }
        });
    }
    combined
}
