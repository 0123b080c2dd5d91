use std::sync::mpsc::Sender;

use log::Level;
use serde_json::Value;

/// Receiver of structured domain events.
///
/// Events are delivered synchronously, in publication order, at most once.
/// Implementations must not assume durability: nothing is buffered or retried.
pub trait FactsEmitter {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value);
}

/// Receiver of operator-facing progress lines.
pub trait AuditSink {
    fn log(&self, level: Level, msg: &str);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl FactsEmitter for NoopSink {
    fn emit(&self, _subsystem: &str, _event: &str, _decision: &str, _fields: Value) {}
}

impl AuditSink for NoopSink {
    fn log(&self, _level: Level, _msg: &str) {}
}

/// Forwards facts and audit lines to the `log` facade. Facts are rendered as
/// one JSON object per line under the `groundwork::facts` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogEmitter;

impl FactsEmitter for LogEmitter {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value) {
        let level = if decision == "failure" {
            Level::Warn
        } else {
            Level::Info
        };
        log::log!(target: "groundwork::facts", level, "{subsystem}.{event} {fields}");
    }
}

impl AuditSink for LogEmitter {
    fn log(&self, level: Level, msg: &str) {
        log::log!(target: "groundwork::audit", level, "{msg}");
    }
}

/// One event as carried over a [`ChannelEmitter`].
#[derive(Clone, Debug, PartialEq)]
pub struct FactRecord {
    pub subsystem: String,
    pub event: String,
    pub decision: String,
    pub fields: Value,
}

/// Publishes facts onto an `mpsc` channel. A dropped receiver silently drops
/// events: delivery is best-effort.
#[derive(Clone, Debug)]
pub struct ChannelEmitter {
    tx: Sender<FactRecord>,
}

impl ChannelEmitter {
    pub fn new(tx: Sender<FactRecord>) -> Self {
        Self { tx }
    }

    /// Convenience: build an emitter together with its receiving end.
    pub fn pair() -> (Self, std::sync::mpsc::Receiver<FactRecord>) {
        let (tx, rx) = std::sync::mpsc::channel();
        (Self { tx }, rx)
    }
}

impl FactsEmitter for ChannelEmitter {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value) {
        let _ = self.tx.send(FactRecord {
            subsystem: subsystem.to_string(),
            event: event.to_string(),
            decision: decision.to_string(),
            fields,
        });
    }
}
