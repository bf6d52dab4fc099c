// termstack: operator-evaluation stack engine for SMT term/type construction.
//
// Copyright (C) 2019  Brandon Lewis
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public License
// as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public
// License along with this program.  If not, see
// <https://www.gnu.org/licenses/>.

//! An operator-evaluation stack for constructing terms and types in a
//! bit-vector-capable SMT frontend. A parser drives a `Stack<B>` by pushing
//! leaf values and operator frames and calling `evaluate`; each evaluation
//! collapses one frame into a single result cell via a constructor request
//! handed to an external `TermBank`/`TypeBank` implementation, which is
//! responsible for hash-consing and hands back opaque handles.
//!
//! See `Stack` for the entry point.

pub mod arena;
pub mod bank;
pub mod buffers;
pub mod checks;
pub mod coerce;
pub mod config;
mod evals;
pub mod error;
pub mod location;
pub mod opcode;
pub mod optable;
pub mod stack;
pub mod value;

pub use bank::{BankError, BankResult, CmpKind, InMemoryBank, TermBank, TermCtor, TypeBank, TypeCtor};
pub use config::StackConfig;
pub use error::{ErrorKind, Result, StackError};
pub use location::Location;
pub use opcode::Opcode;
pub use stack::Stack;
pub use value::{Cell, MacroHandle, Payload, Tag, TermHandle, TypeHandle};
