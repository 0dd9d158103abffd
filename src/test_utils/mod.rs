//! Fixtures shared by the unit tests: an in-memory store wired to a registered
//! coordinator, plus helpers that play the part of external watchers.
mod harness;

pub(crate) use harness::*;
