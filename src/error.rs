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

use thiserror::Error;

use crate::SimTime;

/// Errors that can be returned from the kernel's public API.
///
/// Mis-ordered calls (triggering an already-triggered event, aborting a
/// processed one, ...) are not represented here: they are part of the normal
/// control flow and are reported as a `bool`/`Option` return instead, per the
/// "local recovery is the norm" policy of the crate.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SimError {
    /// A negative delay was passed to `trigger`, `timeout` or `advance_by`.
    #[error("delay must be non-negative, got {0}")]
    InvalidDelay(SimTime),
}
