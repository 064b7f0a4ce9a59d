//! Batch ⇄ wire document codec
//!
//! Encoding renders every timestamp through the one [`TimestampFormat`] the
//! codec was built with, so all records from a process share a pattern.
//! Decoding goes the other way for documents read back from the cache and
//! rejects malformed temporal fields instead of defaulting them.

use chrono::{DateTime, Duration, Utc};
use codetrail_core::{ActivityBatch, ActivityEncoder};
use codetrail_domain::utils::{format_duration, parse_duration, parse_timestamp};
use codetrail_domain::{
    ActivityEntryInfo, ActivityEvent, ActivityInfo, ActivityKind, ActivityState, CodeContext,
    DecodeError, TimestampFormat,
};
use uuid::Uuid;

/// Serializer shared by the flush service and the file stores.
#[derive(Debug, Clone)]
pub struct WireCodec {
    timestamps: TimestampFormat,
    instance: String,
}

impl WireCodec {
    pub fn new(timestamps: TimestampFormat, instance: impl Into<String>) -> Self {
        Self { timestamps, instance: instance.into() }
    }

    pub fn timestamps(&self) -> &TimestampFormat {
        &self.timestamps
    }

    pub fn format_timestamp(&self, at: &DateTime<Utc>) -> String {
        self.timestamps.format(at)
    }

    fn state_entry(&self, parent_id: Uuid, state: &ActivityState) -> ActivityEntryInfo {
        ActivityEntryInfo {
            parent_id,
            start: self.timestamps.format(&state.created_at()),
            end: self.timestamps.format(&state.end()),
            kind: state.wire_kind(),
            duration: format_duration(state.duration()),
            context: None,
        }
    }

    fn event_entry(&self, parent_id: Uuid, event: &ActivityEvent) -> ActivityEntryInfo {
        ActivityEntryInfo {
            parent_id,
            start: self.timestamps.format(&event.created_at()),
            end: self.timestamps.format(&event.end()),
            kind: event.kind(),
            duration: format_duration(event.duration()),
            context: Some(event.context().into()),
        }
    }

    /// Decode one entry's temporal fields.
    ///
    /// # Errors
    /// The first malformed timestamp or duration.
    pub fn decode_entry(&self, entry: &ActivityEntryInfo) -> Result<DecodedEntry, DecodeError> {
        Ok(DecodedEntry {
            parent_id: entry.parent_id,
            kind: entry.kind,
            start: parse_timestamp(&entry.start)?,
            end: parse_timestamp(&entry.end)?,
            duration: parse_duration(&entry.duration)?,
            context: entry.context.clone().map(CodeContext::from),
        })
    }

    /// Check that a whole document decodes.
    ///
    /// # Errors
    /// The first malformed temporal field in the header, states or events.
    pub fn validate(&self, activity: &ActivityInfo) -> Result<(), DecodeError> {
        parse_timestamp(&activity.start_time)?;
        parse_timestamp(&activity.end_time)?;
        for entry in activity.states.iter().chain(&activity.events) {
            self.decode_entry(entry)?;
        }
        Ok(())
    }
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new(TimestampFormat::default(), "default")
    }
}

impl ActivityEncoder for WireCodec {
    fn encode(&self, batch: &ActivityBatch) -> ActivityInfo {
        ActivityInfo {
            instance: self.instance.clone(),
            project_id: batch.project_id,
            batch_id: batch.batch_id,
            start_time: self.timestamps.format(&batch.started_at),
            end_time: self.timestamps.format(&batch.ended_at),
            states: batch.states.iter().map(|s| self.state_entry(batch.batch_id, s)).collect(),
            events: batch.events.iter().map(|e| self.event_entry(batch.batch_id, e)).collect(),
        }
    }
}

/// An entry with its temporal fields parsed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEntry {
    pub parent_id: Uuid,
    pub kind: ActivityKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration: Duration,
    pub context: Option<CodeContext>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn batch() -> ActivityBatch {
        let project_id = Uuid::now_v7();
        let mut coding = ActivityState::create_design_state(project_id, at(0));
        coding.close_duration(at(90));
        let mut edit = ActivityEvent::new(
            project_id,
            ActivityKind::DocumentEdit,
            CodeContext::in_file("shop", "src/cart.rs"),
            at(10),
        );
        edit.close_duration(at(25));

        ActivityBatch {
            batch_id: Uuid::now_v7(),
            project_id,
            started_at: at(0),
            ended_at: at(90),
            states: vec![coding],
            events: vec![edit],
        }
    }

    #[test]
    fn encodes_batch_with_shared_format() {
        let batch = batch();
        let info = WireCodec::new(TimestampFormat::default(), "vm-1").encode(&batch);

        assert_eq!(info.instance, "vm-1");
        assert_eq!(info.start_time, "2024-05-01T09:00:00.000");
        assert_eq!(info.end_time, "2024-05-01T09:01:30.000");

        let state = &info.states[0];
        assert_eq!(state.parent_id, batch.batch_id);
        assert_eq!(state.kind, ActivityKind::Coding);
        assert_eq!(state.duration, "00:01:30.000");
        assert!(state.context.is_none());

        let event = &info.events[0];
        assert_eq!(event.start, "2024-05-01T09:00:10.000");
        assert_eq!(event.duration, "00:00:15.000");
        assert_eq!(event.context.as_ref().unwrap().file.as_deref(), Some("src/cart.rs"));
    }

    #[test]
    fn encoded_document_uses_numeric_kinds() {
        let info = WireCodec::default().encode(&batch());
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["States"][0]["Type"], json!(4));
        assert_eq!(value["Events"][0]["Type"], json!(7));
        assert_eq!(value["Events"][0]["Context"]["Project"], json!("shop"));
    }

    #[test]
    fn null_placeholders_are_sent_as_idle() {
        let mut batch = batch();
        let mut null = ActivityState::create_null_state(batch.project_id, at(90));
        null.close_duration(at(120));
        batch.states.push(null);

        let value = serde_json::to_value(WireCodec::default().encode(&batch)).unwrap();
        assert_eq!(value["States"][0]["Type"], json!(4));
        assert_eq!(value["States"][1]["Type"], json!(1));
        assert_eq!(value["States"][1]["Duration"], json!("00:00:30.000"));
    }

    #[test]
    fn decodes_what_it_encodes() {
        let codec = WireCodec::default();
        let info = codec.encode(&batch());
        codec.validate(&info).unwrap();

        let decoded = codec.decode_entry(&info.events[0]).unwrap();
        assert_eq!(decoded.start, at(10));
        assert_eq!(decoded.end, at(25));
        assert_eq!(decoded.duration, Duration::seconds(15));
        assert_eq!(decoded.context, Some(CodeContext::in_file("shop", "src/cart.rs")));
    }

    #[test]
    fn malformed_duration_fails_validation() {
        let codec = WireCodec::default();
        let mut info = codec.encode(&batch());
        info.states[0].duration = "ninety seconds".into();
        assert_eq!(
            codec.validate(&info),
            Err(DecodeError::InvalidDuration("ninety seconds".into()))
        );
    }

    #[test]
    fn out_of_range_duration_fails_validation() {
        let codec = WireCodec::default();
        let mut info = codec.encode(&batch());
        info.events[0].duration = "P99999999999999D".into();
        assert_eq!(
            codec.validate(&info),
            Err(DecodeError::InvalidDuration("P99999999999999D".into()))
        );
    }

    #[test]
    fn high_precision_timestamps_truncate() {
        let codec = WireCodec::default();
        let mut info = codec.encode(&batch());
        info.events[0].start = "2024-05-01T09:00:10.000999".into();
        let decoded = codec.decode_entry(&info.events[0]).unwrap();
        assert_eq!(decoded.start, at(10));
    }
}
