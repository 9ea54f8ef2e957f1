pub mod meta;
pub mod record;
pub mod recorder;
pub mod store;

pub use meta::RequestMeta;
pub use record::{ActorType, AuditEvent, AuditModule, DEFAULT_USER_AGENT, Outcome};
pub use recorder::AuditRecorder;
pub use store::{AuditStore, AuditStoreError, PgAuditStore};
