pub mod appointment;
pub mod audit_record;
pub mod lab_result;
pub mod medication;
pub mod metric;
pub mod patient;
pub mod user;

pub use appointment::{Appointment, AppointmentStatus};
pub use audit_record::AuditRecord;
pub use lab_result::LabResult;
pub use medication::Medication;
pub use metric::HealthMetric;
pub use patient::Patient;
pub use user::{Role, User};
