pub mod night;

pub use night::{SleepNight, MAX_QUALITY, MIN_QUALITY, UNRATED_QUALITY};
