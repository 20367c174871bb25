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

//! A discrete-event simulation kernel built around a small set of
//! primitives: a virtual clock, a future event list (FEL), one-shot
//! [`Event`]s with a four-state lifecycle, and [`ProcessLogic`], a
//! resumable-process abstraction for code that needs to suspend across
//! multiple events.
//!
//! ```
//! use desim::Simulation;
//!
//! let sim = Simulation::new();
//! let a = sim.timeout(3.0).unwrap();
//! let b = sim.timeout(1.0).unwrap();
//! let first = sim.any_of([a, b]);
//! sim.advance_to(&first);
//! assert_eq!(sim.now(), 1.0);
//! ```
//!
//! Everything above the event/process core (resources, random arrival
//! processes, the example models used in this crate's tests) is deliberately
//! left out of the library surface. An `Event` is cheap to clone (it is a
//! reference-counted handle, not a copy of the signal) and carries no
//! payload; attach state to the process or handler that observes it instead.

mod composite;
mod error;
mod event;
mod process;
mod sim;

pub use error::SimError;
pub use event::{Event, EventState};
pub use process::{ProcessHandle, ProcessLogic, Resume};
pub use sim::Simulation;

/// Simulation time, in abstract units defined by the model using this crate.
pub type SimTime = f64;
