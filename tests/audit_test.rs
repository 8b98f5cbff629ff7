mod common;

use common::{mock_tsa, FakeLog};
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use wiremock::MockServer;

use tlog_monitor::audit::{AuditRecorder, AuditStage, Auditor, TimestampedAuditRecord};
use tlog_monitor::crypto::verify_signature;
use tlog_monitor::entry::{EntryBody, KindRegistry};
use tlog_monitor::error::MonitorError;
use tlog_monitor::store::AuditStore;
use tlog_monitor::tsa::TsaClient;

struct Harness {
    log: FakeLog,
    tsa: MockServer,
    store: Arc<AuditStore>,
    _dir: TempDir,
}

impl Harness {
    async fn new(tree_size: u64, tsa_status: u16, create_status: u16) -> Self {
        let log = FakeLog::start().await;
        log.mount_tree_size(tree_size).await;
        log.mount_create(create_status).await;
        let tsa = mock_tsa(tsa_status).await;

        let dir = tempdir().unwrap();
        let store = Arc::new(AuditStore::open(dir.path().join("globals.json"), 10).unwrap());
        Self {
            log,
            tsa,
            store,
            _dir: dir,
        }
    }

    async fn auditor(&self) -> Auditor {
        let tsa = TsaClient::new(format!("{}/tsr", self.tsa.uri()), Duration::from_secs(5)).unwrap();
        let recorder = AuditRecorder::new(self.log.client(), self.log.verifier(), tsa);
        Auditor::new(recorder, self.store.clone()).await
    }
}

#[tokio::test]
async fn test_successful_audit_is_recorded_and_republished() {
    let h = Harness::new(77, 200, 201).await;
    let auditor = h.auditor().await;

    let record = auditor.tick().await.unwrap();

    assert_eq!(record.record.tree_size, 77);
    assert_eq!(record.record.root_hash, vec![0x5a; 32]);
    assert_eq!(record.external_timestamp, vec![0x30, 0x03, 0x02, 0x01, 0x00]);
    assert_eq!(record.timestamp_authority, format!("{}/tsr", h.tsa.uri()));

    assert_eq!(h.store.records().await, vec![record.clone()]);
    assert_eq!(h.store.snapshot().await, vec![record.to_line().unwrap()]);
    assert_eq!(h.log.created_bodies().await.len(), 1);
}

#[tokio::test]
async fn test_republished_entry_decodes_to_the_signed_record() {
    let h = Harness::new(12, 200, 201).await;
    let record = h.auditor().await.tick().await.unwrap();

    let posted = h.log.created_bodies().await.remove(0);
    let body = KindRegistry::default()
        .decode_body(&serde_json::to_vec(&posted).unwrap())
        .unwrap();
    let spec = match body {
        EntryBody::SignedArtifact(spec) => spec,
        other => panic!("unexpected entry kind: {:?}", other),
    };

    assert_eq!(spec.signature.format.as_deref(), Some("x509"));
    let public_key = spec.signature.public_key.as_ref().unwrap().content.clone();
    assert_eq!(public_key, h.store.public_key());

    let payload = spec.data.content.clone().unwrap();
    let signature = spec.signature.content.clone().unwrap();
    verify_signature(&public_key, &payload, &signature).unwrap();
    assert_eq!(TimestampedAuditRecord::from_bytes(&payload).unwrap(), record);
}

#[tokio::test]
async fn test_timestamp_outage_leaves_history_untouched() {
    let h = Harness::new(77, 503, 201).await;
    let auditor = h.auditor().await;

    let err = auditor.tick().await.unwrap_err();

    assert_eq!(err.stage, AuditStage::Timestamp);
    assert!(matches!(err.source, MonitorError::TimestampError(_)));
    assert!(!err.is_fatal_to_trust());
    assert!(h.store.is_empty().await);
    assert!(h.log.created_bodies().await.is_empty());
}

#[tokio::test]
async fn test_rejected_republish_keeps_the_signed_record() {
    let h = Harness::new(77, 200, 500).await;
    let auditor = h.auditor().await;

    let err = auditor.tick().await.unwrap_err();

    assert_eq!(err.stage, AuditStage::Republish);
    let records = h.store.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record.tree_size, 77);
}

#[tokio::test]
async fn test_unverifiable_log_state_is_not_timestamped() {
    let h = Harness::new(77, 200, 201).await;
    h.log.server.reset().await;
    h.log.mount_forged_tree_size(77).await;

    let err = h.auditor().await.tick().await.unwrap_err();

    assert_eq!(err.stage, AuditStage::Verify);
    assert!(h.tsa.received_requests().await.unwrap().is_empty());
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_log_smaller_than_last_audit_is_fatal() {
    let h = Harness::new(50, 200, 201).await;
    h.auditor().await.tick().await.unwrap();

    h.log.server.reset().await;
    h.log.mount_tree_size(40).await;
    h.log.mount_create(201).await;

    // a new auditor picks up the last audited size from the store
    let err = h.auditor().await.tick().await.unwrap_err();

    assert_eq!(err.stage, AuditStage::Verify);
    assert!(err.is_fatal_to_trust());
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test]
async fn test_timestamp_request_is_der_encoded() {
    let h = Harness::new(5, 200, 201).await;
    h.auditor().await.tick().await.unwrap();

    let requests = h.tsa.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(
        request.headers.get("content-type").unwrap(),
        "application/timestamp-query"
    );
    // SEQUENCE { INTEGER 1, ... }
    assert_eq!(request.body[0], 0x30);
    assert_eq!(&request.body[2..5], &[0x02, 0x01, 0x01]);
}

#[tokio::test]
async fn test_second_root_for_same_size_is_fatal() {
    let h = Harness::new(100, 200, 201).await;
    let auditor = h.auditor().await;
    auditor.tick().await.unwrap();

    h.log.server.reset().await;
    h.log.mount_tree_head(100, 0x11).await;
    h.log.mount_create(201).await;

    let err = auditor.tick().await.unwrap_err();
    assert_eq!(err.stage, AuditStage::Verify);
    assert!(matches!(
        err.source,
        MonitorError::ConsistencyViolation {
            previous: 100,
            current: 100
        }
    ));
    assert!(err.is_fatal_to_trust());
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test]
async fn test_stored_root_seeds_fork_detection_after_restart() {
    let h = Harness::new(100, 200, 201).await;
    h.auditor().await.tick().await.unwrap();

    h.log.server.reset().await;
    h.log.mount_tree_head(100, 0x11).await;
    h.log.mount_create(201).await;

    let err = h.auditor().await.tick().await.unwrap_err();
    assert!(err.is_fatal_to_trust());
    assert_eq!(h.tsa.received_requests().await.unwrap().len(), 1);
}
