pub mod audit;
pub mod facts;
pub mod redact;

pub use audit::{Decision, EventBuilder, EventType, StageLogger};
pub use facts::{AuditSink, ChannelEmitter, FactRecord, FactsEmitter, LogEmitter, NoopSink};
pub use redact::{now_iso, redact_event, EVENT_ID_ZERO, TS_ZERO};
