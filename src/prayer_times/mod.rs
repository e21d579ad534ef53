pub mod calculator;
pub mod provider;
pub mod schedule;
pub mod window;

pub use provider::AladhanClient;
pub use schedule::{ResolveMode, ResolvedSchedule, ScheduleService};
pub use window::{classify, Classification, IqamahPhase, IqamahTracker, IqamahWindow};
