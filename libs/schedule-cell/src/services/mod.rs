pub mod schedule;

pub use schedule::{schedule_conflicts, ScheduleService};
