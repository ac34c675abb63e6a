//! Extraction job scheduler: an optimistic lease-based claim protocol, the
//! nine-step execution loop per claimed job, and stale-lease recovery.

pub mod cancel;
pub mod clock;
pub mod engine;
pub mod pg;
pub mod traits;

pub use cancel::CancellationToken;
pub use clock::{Clock, SystemClock};
pub use engine::{Scheduler, SchedulerConfig};
pub use traits::{
    DayEntryRecord, EmployeeRecord, EmployeeRecordStore, ImageStore, JobLogger, JobRecord, JobStore,
    TracingLogger, WorkCardRecord, WorkCardStore,
};
