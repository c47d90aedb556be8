pub mod export;
pub mod hours;
pub mod lifecycle;
pub mod reports;
pub mod status;
pub mod summary;

pub use lifecycle::{AttendanceService, RecordState};
pub use status::{AttendancePolicy, classify};
