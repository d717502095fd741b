//! Client-side session state for Threadline: the provisional-thread merge
//! algorithm, a reducer-style state machine, and a thin HTTP client.

pub mod api;
pub mod merge;
pub mod state;
