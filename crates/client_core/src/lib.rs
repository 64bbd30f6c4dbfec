//! Client-side state for the admin users view.

pub mod controller;
pub mod error;
pub mod source;

pub use controller::{RosterEvent, RosterState, RosterView, UserRosterController};
pub use error::RosterError;
pub use source::{HttpRosterSource, RosterSource};
