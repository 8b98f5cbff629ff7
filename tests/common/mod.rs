#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{TimeZone, Utc};
use p256::ecdsa::signature::Signer as _;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::{EncodePublicKey, LineEnding};
use rand::rngs::OsRng;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tlog_monitor::audit::{AuditRecord, TimestampedAuditRecord};
use tlog_monitor::tlog::LogClient;
use tlog_monitor::verify::{CommitmentVerifier, LogRootV1};

pub const LOG_ENTRIES: &str = "/api/v1/log/entries";

/// A mock transparency log that signs its tree heads with a throwaway P-256 key
pub struct FakeLog {
    pub server: MockServer,
    key: SigningKey,
}

impl FakeLog {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            key: SigningKey::random(&mut OsRng),
        }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    pub fn client(&self) -> LogClient {
        LogClient::new(self.url(), Duration::from_secs(5)).expect("log client")
    }

    pub fn public_key_pem(&self) -> String {
        self.key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .expect("pem")
    }

    pub fn verifier(&self) -> CommitmentVerifier {
        CommitmentVerifier::from_pem(&self.public_key_pem()).expect("verifier")
    }

    pub async fn mount_public_key(&self) {
        Mock::given(method("GET"))
            .and(path("/api/v1/log/publicKey"))
            .respond_with(ResponseTemplate::new(200).set_body_string(self.public_key_pem()))
            .mount(&self.server)
            .await;
    }

    pub fn tree_head(&self, tree_size: u64) -> Value {
        self.tree_head_with_root(tree_size, 0x5a)
    }

    pub fn tree_head_with_root(&self, tree_size: u64, root: u8) -> Value {
        let root_data = LogRootV1 {
            tree_size,
            root_hash: vec![root; 32],
            timestamp_nanos: 1_700_000_000_000_000_000,
            revision: tree_size,
            metadata: vec![],
        }
        .encode();
        let signature: Signature = self.key.sign(&root_data);
        json!({
            "rootHash": format!("{:02x}", root).repeat(32),
            "treeSize": tree_size,
            "signedTreeHead": {
                "keyHint": STANDARD.encode(7u32.to_be_bytes()),
                "logRoot": STANDARD.encode(&root_data),
                "signature": STANDARD.encode(signature.to_der().as_bytes()),
            }
        })
    }

    pub async fn mount_tree_size(&self, tree_size: u64) {
        Mock::given(method("GET"))
            .and(path("/api/v1/log"))
            .respond_with(ResponseTemplate::new(200).set_body_json(self.tree_head(tree_size)))
            .mount(&self.server)
            .await;
    }

    /// Correctly signed tree head committing to a root of repeated `root` bytes
    pub async fn mount_tree_head(&self, tree_size: u64, root: u8) {
        Mock::given(method("GET"))
            .and(path("/api/v1/log"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(self.tree_head_with_root(tree_size, root)),
            )
            .mount(&self.server)
            .await;
    }

    /// Tree head signed by some other key
    pub async fn mount_forged_tree_size(&self, tree_size: u64) {
        let forger = FakeLog {
            server: MockServer::start().await,
            key: SigningKey::random(&mut OsRng),
        };
        Mock::given(method("GET"))
            .and(path("/api/v1/log"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forger.tree_head(tree_size)))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_entry(&self, index: u64, body: &Value) {
        self.mount_entry_reporting(index, index, body).await;
    }

    /// Entry served for `index` whose payload claims it sits at `reported`
    pub async fn mount_entry_reporting(&self, index: u64, reported: u64, body: &Value) {
        let uuid = format!("uuid-{}", index);
        let encoded = STANDARD.encode(serde_json::to_vec(body).expect("body"));
        Mock::given(method("GET"))
            .and(path(LOG_ENTRIES))
            .and(query_param("logIndex", index.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Object(
                [(
                    uuid,
                    json!({
                        "body": encoded,
                        "integratedTime": 1_700_000_000,
                        "logID": "c0d23d6ad406973f",
                        "logIndex": reported,
                    }),
                )]
                .into_iter()
                .collect(),
            )))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_failing_entry(&self, index: u64) {
        Mock::given(method("GET"))
            .and(path(LOG_ENTRIES))
            .and(query_param("logIndex", index.to_string()))
            .respond_with(ResponseTemplate::new(500))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_create(&self, status: u16) {
        let response = if status == 201 {
            ResponseTemplate::new(201).set_body_json(json!({
                "24296fb24b8ad77a": {"logIndex": 1001, "integratedTime": 1_700_000_000}
            }))
        } else {
            ResponseTemplate::new(status)
        };
        Mock::given(method("POST"))
            .and(path(LOG_ENTRIES))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Bodies POSTed to the entries endpoint, in arrival order
    pub async fn created_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.method.as_str() == "POST" && r.url.path() == LOG_ENTRIES)
            .map(|r| serde_json::from_slice(&r.body).expect("json body"))
            .collect()
    }
}

/// rekord entry signed by `public_key`
pub fn rekord_body(public_key: &[u8], signature: &[u8], content_hash: &str) -> Value {
    json!({
        "apiVersion": "0.0.1",
        "kind": "rekord",
        "spec": {
            "data": {"hash": {"algorithm": "sha256", "value": content_hash}},
            "signature": {
                "format": "x509",
                "content": STANDARD.encode(signature),
                "publicKey": {"content": STANDARD.encode(public_key)},
            }
        }
    })
}

pub async fn mock_tsa(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tsr"))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(vec![0x30, 0x03, 0x02, 0x01, 0x00]))
        .mount(&server)
        .await;
    server
}

/// A distinct stamped record per `n`
pub fn record(n: u64) -> TimestampedAuditRecord {
    TimestampedAuditRecord {
        record: AuditRecord {
            observed_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + chrono::Duration::minutes(n as i64),
            tree_size: n,
            root_hash: vec![n as u8; 32],
        },
        external_timestamp: vec![0x30, n as u8],
        timestamp_authority: "https://freetsa.org/tsr".to_string(),
    }
}
