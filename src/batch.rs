//! Sequential execution of state-changing calls with per-item accounting.
//!
//! Each target is sent on its own and classified on its own. A failed target
//! is recorded and the batch moves on; nothing short of the caller stopping
//! the process ends a batch early.

use crate::classify::{Envelope, ResourceEnvelope, ResultEnvelope, Verdict};
use crate::desired::StreamKind;
use crate::error::Result;
use crate::models::StreamPayload;
use crate::reconcile::PlannedStream;
use crate::transport::Transport;
use std::fmt;

const CREATE_PATH: &str = "/broadcasts/create?autoStart=true";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Start,
    Stop,
    Delete,
}

impl Operation {
    pub fn progressive(&self) -> &'static str {
        match self {
            Operation::Create => "creating",
            Operation::Start => "starting",
            Operation::Stop => "stopping",
            Operation::Delete => "deleting",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Start => "start",
            Operation::Stop => "stop",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Operations addressed to an existing stream by ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Start,
    Stop,
    Delete,
}

impl From<Lifecycle> for Operation {
    fn from(op: Lifecycle) -> Self {
        match op {
            Lifecycle::Start => Operation::Start,
            Lifecycle::Stop => Operation::Stop,
            Lifecycle::Delete => Operation::Delete,
        }
    }
}

/// Outcome of one target, handed to the observer as soon as it is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub operation: Operation,
    pub stream_id: String,
    pub name: Option<String>,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub stream_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<ItemFailure>,
}

impl BatchOutcome {
    fn record(&mut self, stream_id: &str, verdict: &Verdict) {
        self.attempted += 1;
        if verdict.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
            self.failures.push(ItemFailure {
                stream_id: stream_id.to_string(),
                reason: verdict.message.clone(),
            });
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attempted {}, succeeded {}, failed {}",
            self.attempted, self.succeeded, self.failed
        )
    }
}

/// Builds every create payload up front so a bad row aborts before any
/// request is sent.
pub fn prepare_payloads(planned: &[PlannedStream], kind: StreamKind) -> Result<Vec<StreamPayload>> {
    planned
        .iter()
        .map(|p| p.spec.payload(kind, &p.stream_id))
        .collect()
}

pub struct BatchExecutor<'a> {
    transport: &'a dyn Transport,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    pub async fn create(
        &self,
        payloads: &[StreamPayload],
        observer: &mut dyn FnMut(&ItemReport),
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for payload in payloads {
            tracing::debug!(
                "{} {} (type={})",
                Operation::Create.progressive(),
                payload.stream_id,
                payload.stream_type.as_str()
            );
            let verdict = self.create_one(payload).await;
            self.finish(
                &mut outcome,
                Operation::Create,
                &payload.stream_id,
                Some(&payload.name),
                verdict,
                observer,
            );
        }
        tracing::info!("{}: {}", Operation::Create, outcome);
        outcome
    }

    pub async fn apply(
        &self,
        op: Lifecycle,
        stream_ids: &[String],
        observer: &mut dyn FnMut(&ItemReport),
    ) -> BatchOutcome {
        let operation = Operation::from(op);
        let mut outcome = BatchOutcome::default();
        for stream_id in stream_ids {
            tracing::debug!("{} {}", operation.progressive(), stream_id);
            let verdict = self.apply_one(op, stream_id).await;
            self.finish(&mut outcome, operation, stream_id, None, verdict, observer);
        }
        tracing::info!("{}: {}", operation, outcome);
        outcome
    }

    async fn create_one(&self, payload: &StreamPayload) -> Verdict {
        let body = match serde_json::to_value(payload) {
            Ok(body) => body,
            Err(e) => return Verdict::failed(format!("cannot encode payload: {}", e)),
        };
        match self.transport.post(CREATE_PATH, Some(&body)).await {
            Ok(response) => ResourceEnvelope::classify(&response),
            Err(e) => Verdict::failed(e.to_string()),
        }
    }

    async fn apply_one(&self, op: Lifecycle, stream_id: &str) -> Verdict {
        let result = match op {
            Lifecycle::Start => self
                .transport
                .post(&format!("/broadcasts/{}/start", stream_id), None)
                .await
                .map(|r| ResultEnvelope::classify(&r)),
            Lifecycle::Stop => self
                .transport
                .post(&format!("/broadcasts/{}/stop", stream_id), None)
                .await
                .map(|r| ResultEnvelope::classify(&r)),
            Lifecycle::Delete => self
                .transport
                .delete(&format!("/broadcasts/{}", stream_id))
                .await
                .map(|r| ResourceEnvelope::classify(&r)),
        };
        result.unwrap_or_else(|e| Verdict::failed(e.to_string()))
    }

    fn finish(
        &self,
        outcome: &mut BatchOutcome,
        operation: Operation,
        stream_id: &str,
        name: Option<&str>,
        verdict: Verdict,
        observer: &mut dyn FnMut(&ItemReport),
    ) {
        if !verdict.success {
            tracing::warn!("{} {} failed: {}", operation, stream_id, verdict.message);
        }
        outcome.record(stream_id, &verdict);
        observer(&ItemReport {
            operation,
            stream_id: stream_id.to_string(),
            name: name.map(str::to_string),
            verdict,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desired::DesiredStreamSpec;
    use crate::identity::{derive_stream_id, IdGenerator};
    use crate::reconcile::reconcile;
    use crate::transport::testing::ScriptedTransport;
    use serde_json::json;

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("s{}", i)).collect()
    }

    #[tokio::test]
    async fn continues_past_failed_target() {
        let transport = ScriptedTransport::new()
            .reply(200, json!({"success": true}))
            .reply(200, json!({"success": true}))
            .reply(200, json!({"success": false, "message": "not found"}))
            .reply(200, json!({"success": true}))
            .reply(200, json!({"success": true}));

        let mut seen = Vec::new();
        let outcome = BatchExecutor::new(&transport)
            .apply(Lifecycle::Start, &ids(5), &mut |r: &ItemReport| seen.push(r.clone()))
            .await;

        assert_eq!(outcome.attempted, 5);
        assert_eq!(outcome.succeeded, 4);
        assert_eq!(outcome.failed, 1);
        assert_eq!(
            outcome.failures,
            [ItemFailure {
                stream_id: "s3".to_string(),
                reason: "not found".to_string()
            }]
        );
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[4].stream_id, "s5");
        assert_eq!(outcome.to_string(), "attempted 5, succeeded 4, failed 1");
    }

    #[tokio::test]
    async fn network_error_is_recorded_not_fatal() {
        let transport = ScriptedTransport::new()
            .unreachable()
            .reply(200, json!({"success": true}));
        let outcome = BatchExecutor::new(&transport)
            .apply(Lifecycle::Stop, &ids(2), &mut |_| {})
            .await;
        assert_eq!((outcome.succeeded, outcome.failed), (1, 1));
        assert_eq!(outcome.failures[0].stream_id, "s1");
    }

    #[tokio::test]
    async fn lifecycle_routes() {
        let transport = ScriptedTransport::new()
            .reply(200, json!({"success": true}))
            .reply(200, json!({"success": true}))
            .reply(200, json!({"streamId": "s1"}));
        let executor = BatchExecutor::new(&transport);
        let target = ids(1);
        executor.apply(Lifecycle::Start, &target, &mut |_| {}).await;
        executor.apply(Lifecycle::Stop, &target, &mut |_| {}).await;
        let outcome = executor.apply(Lifecycle::Delete, &target, &mut |_| {}).await;
        assert!(outcome.is_clean());

        let calls: Vec<(&str, String)> = transport
            .calls()
            .into_iter()
            .map(|c| (c.method, c.path))
            .collect();
        assert_eq!(
            calls,
            [
                ("POST", "/broadcasts/s1/start".to_string()),
                ("POST", "/broadcasts/s1/stop".to_string()),
                ("DELETE", "/broadcasts/s1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn delete_uses_resource_envelope() {
        let transport = ScriptedTransport::new().reply(200, json!({"success": true}));
        let outcome = BatchExecutor::new(&transport)
            .apply(Lifecycle::Delete, &ids(1), &mut |_| {})
            .await;
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.failures[0].reason, "Unknown error");
    }

    #[tokio::test]
    async fn end_to_end_create() {
        let spec = DesiredStreamSpec {
            code: "camA".to_string(),
            source_address: Some("10.0.0.1".to_string()),
            credentials: None,
            description: None,
            metadata: None,
            origin_address: "10.0.0.9".to_string(),
            camera_defaults: None,
        };
        let plan = reconcile(vec![spec], &[], &IdGenerator::default()).unwrap();
        assert_eq!(plan.to_create.len(), 1);

        let expected_id = derive_stream_id("camA").unwrap();
        let transport = ScriptedTransport::new().reply(200, json!({"streamId": expected_id}));
        let payloads = prepare_payloads(&plan.to_create, StreamKind::IpCamera).unwrap();

        let mut names = Vec::new();
        let outcome = BatchExecutor::new(&transport)
            .create(&payloads, &mut |r: &ItemReport| names.push(r.name.clone()))
            .await;

        assert_eq!(
            outcome,
            BatchOutcome {
                attempted: 1,
                succeeded: 1,
                failed: 0,
                failures: Vec::new(),
            }
        );
        assert_eq!(names, [Some("camA".to_string())]);

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "POST");
        assert_eq!(calls[0].path, "/broadcasts/create?autoStart=true");
        let body = calls[0].body.as_ref().unwrap();
        assert_eq!(body["streamId"], json!(expected_id));
        assert_eq!(body["name"], "camA");
        assert_eq!(body["type"], "ipCamera");
        assert_eq!(body["ipAddr"], "10.0.0.1");
    }

    #[test]
    fn bad_spec_fails_before_any_request() {
        let spec = DesiredStreamSpec {
            code: "noip".to_string(),
            source_address: None,
            credentials: None,
            description: None,
            metadata: None,
            origin_address: "10.0.0.9".to_string(),
            camera_defaults: None,
        };
        let plan = reconcile(vec![spec], &[], &IdGenerator::default()).unwrap();
        assert!(prepare_payloads(&plan.to_create, StreamKind::StreamSource).is_err());
    }
}
