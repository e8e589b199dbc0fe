pub mod scheduler;

pub use scheduler::{DailyPushScheduler, PushChannel, PushSummary};
