#![forbid(unsafe_code)]

pub mod mastery;
pub mod model;
pub mod time;
pub mod unlock;

pub use mastery::{Strength, classify};
pub use time::Clock;
pub use unlock::{UNLOCK_THRESHOLD, is_unlocked, remaining_to_unlock};
