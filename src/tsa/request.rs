//! RFC 3161 `TimeStampReq` encoding.
//!
//! ```text
//! TimeStampReq ::= SEQUENCE {
//!    version        INTEGER { v1(1) },
//!    messageImprint MessageImprint,
//!    nonce          INTEGER OPTIONAL,
//!    certReq        BOOLEAN DEFAULT FALSE }
//! MessageImprint ::= SEQUENCE {
//!    hashAlgorithm  AlgorithmIdentifier,
//!    hashedMessage  OCTET STRING }
//! ```

use sha2::{Digest, Sha256};

const TAG_BOOLEAN: u8 = 0x01;
const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_NULL: u8 = 0x05;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;

/// 2.16.840.1.101.3.4.2.1
const SHA256_OID: [u8; 9] = [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampRequest {
    pub digest: [u8; 32],
    pub nonce: u64,
    pub cert_req: bool,
}

impl TimestampRequest {
    /// Request a timestamp over the SHA-256 of `data`
    pub fn for_data(data: &[u8], nonce: u64) -> Self {
        Self {
            digest: Sha256::digest(data).into(),
            nonce,
            cert_req: true,
        }
    }

    pub fn to_der(&self) -> Vec<u8> {
        let algorithm = tlv(
            TAG_SEQUENCE,
            &[tlv(TAG_OID, &SHA256_OID), tlv(TAG_NULL, &[])].concat(),
        );
        let imprint = tlv(
            TAG_SEQUENCE,
            &[algorithm, tlv(TAG_OCTET_STRING, &self.digest)].concat(),
        );

        let mut body = tlv(TAG_INTEGER, &[1]);
        body.extend(imprint);
        body.extend(tlv(TAG_INTEGER, &unsigned_integer(self.nonce)));
        if self.cert_req {
            body.extend(tlv(TAG_BOOLEAN, &[0xff]));
        }
        tlv(TAG_SEQUENCE, &body)
    }
}

fn tlv(tag: u8, value: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = value.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let len_bytes: Vec<u8> = len
            .to_be_bytes()
            .into_iter()
            .skip_while(|b| *b == 0)
            .collect();
        out.push(0x80 | len_bytes.len() as u8);
        out.extend(len_bytes);
    }
    out.extend_from_slice(value);
    out
}

/// Minimal two's-complement encoding of a non-negative integer
fn unsigned_integer(value: u64) -> Vec<u8> {
    let mut bytes: Vec<u8> = value
        .to_be_bytes()
        .into_iter()
        .skip_while(|b| *b == 0)
        .collect();
    if bytes.is_empty() || bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0);
    }
    bytes
}
