//! Domain event emission for the apply engine.
//!
//! Every event carries the envelope `{schema_version, event_id, scaffold_id,
//! plan_id, timestamp, type, decision, payload}`; builders only fill `payload`.
use serde_json::{json, Map, Value};

use crate::api::errors::{exit_code_for, id_str, ErrorId};
use crate::constants::{EVENT_SCHEMA_VERSION, SUBSYSTEM};
use crate::logging::{now_iso, FactsEmitter};
use crate::types::ids::new_event_id;

pub(crate) struct AuditCtx<'a> {
    pub facts: &'a dyn FactsEmitter,
    pub scaffold_id: String,
    pub plan_id: String,
}

impl<'a> AuditCtx<'a> {
    pub(crate) fn new(facts: &'a dyn FactsEmitter, scaffold_id: String, plan_id: String) -> Self {
        Self {
            facts,
            scaffold_id,
            plan_id,
        }
    }
}

/// Event types published by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventType {
    ApplyStarted,
    ConflictDetected,
    DecisionPointNeeded,
    Applied,
    ApplyFailed,
    CheckpointCreated,
    CheckpointRestored,
}

impl EventType {
    pub const fn as_event(self) -> &'static str {
        match self {
            EventType::ApplyStarted => "scaffold_apply_started",
            EventType::ConflictDetected => "scaffold_conflict_detected",
            EventType::DecisionPointNeeded => "decision_point_needed",
            EventType::Applied => "scaffold_applied",
            EventType::ApplyFailed => "scaffold_apply_failed",
            EventType::CheckpointCreated => "checkpoint_created",
            EventType::CheckpointRestored => "checkpoint_restored",
        }
    }
}

/// Decision severity for emitted events.
#[derive(Clone, Copy, Debug)]
pub enum Decision {
    Success,
    Failure,
    Warn,
}

impl Decision {
    const fn as_str(self) -> &'static str {
        match self {
            Decision::Success => "success",
            Decision::Failure => "failure",
            Decision::Warn => "warn",
        }
    }
}

/// Builder facade over event emission with a centralized envelope.
pub struct StageLogger<'a> {
    ctx: &'a AuditCtx<'a>,
}

impl<'a> StageLogger<'a> {
    pub(crate) fn new(ctx: &'a AuditCtx<'a>) -> Self {
        Self { ctx }
    }

    pub fn apply_started(&'a self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, EventType::ApplyStarted)
    }
    pub fn conflict_detected(&'a self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, EventType::ConflictDetected)
    }
    pub fn decision_needed(&'a self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, EventType::DecisionPointNeeded)
    }
    pub fn applied(&'a self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, EventType::Applied)
    }
    pub fn apply_failed(&'a self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, EventType::ApplyFailed)
    }
    pub fn checkpoint_created(&'a self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, EventType::CheckpointCreated)
    }
    pub fn checkpoint_restored(&'a self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, EventType::CheckpointRestored)
    }
}

pub struct EventBuilder<'a> {
    ctx: &'a AuditCtx<'a>,
    kind: EventType,
    payload: Map<String, Value>,
}

impl<'a> EventBuilder<'a> {
    fn new(ctx: &'a AuditCtx<'a>, kind: EventType) -> Self {
        Self {
            ctx,
            kind,
            payload: Map::new(),
        }
    }

    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.payload.insert(key.to_string(), value);
        self
    }

    pub fn merge(mut self, extra: &Value) -> Self {
        if let Some(obj) = extra.as_object() {
            for (k, v) in obj {
                self.payload.insert(k.clone(), v.clone());
            }
        }
        self
    }

    pub fn error_id(mut self, id: ErrorId) -> Self {
        self.payload.insert("error_id".into(), json!(id_str(id)));
        self.payload
            .insert("exit_code".into(), json!(exit_code_for(id)));
        self
    }

    pub fn emit(self, decision: Decision) {
        let envelope = json!({
            "schema_version": EVENT_SCHEMA_VERSION,
            "event_id": new_event_id(),
            "scaffold_id": self.ctx.scaffold_id,
            "plan_id": self.ctx.plan_id,
            "timestamp": now_iso(),
            "type": self.kind.as_event(),
            "decision": decision.as_str(),
            "payload": Value::Object(self.payload),
        });
        self.ctx
            .facts
            .emit(SUBSYSTEM, self.kind.as_event(), decision.as_str(), envelope);
    }

    pub fn emit_success(self) {
        self.emit(Decision::Success);
    }
    pub fn emit_failure(self) {
        self.emit(Decision::Failure);
    }
    pub fn emit_warn(self) {
        self.emit(Decision::Warn);
    }
}
