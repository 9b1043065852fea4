pub mod time_utils;

pub use time_utils::{age_of, Clock, ManualClock, SystemClock};
