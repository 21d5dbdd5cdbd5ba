pub mod engine;
pub mod service;

pub use crate::domain::model::{Attendee, Group, GroupSet};
pub use crate::domain::ports::{AttendeeSource, Store};
pub use crate::utils::error::Result;
