pub mod adapter;
pub mod commands;
pub mod events;
pub mod quality;
pub mod state;
pub mod view_model;

pub use adapter::{NightRow, RowStyle, SleepNightAdapter, DEFAULT_LOW_QUALITY_THRESHOLD};
pub use commands::{Command, Shell};
pub use events::{EventQueue, QualityEvent, TrackerEvent};
pub use quality::SleepQualityViewModel;
pub use state::{TrackerSnapshot, TrackerState};
pub use view_model::SleepTrackerViewModel;
