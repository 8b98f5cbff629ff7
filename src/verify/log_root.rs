//! Trillian `LogRootV1` TLS decoding.

use crate::error::{MonitorError, Result};

pub const LOG_ROOT_V1: u16 = 1;
const MAX_ROOT_HASH_LEN: usize = 128;

/// Decoded body of a signed commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRootV1 {
    pub tree_size: u64,
    pub root_hash: Vec<u8>,
    pub timestamp_nanos: u64,
    pub revision: u64,
    pub metadata: Vec<u8>,
}

impl LogRootV1 {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = Reader { data, pos: 0 };

        let version = reader.u16()?;
        if version != LOG_ROOT_V1 {
            return Err(MonitorError::malformed_commitment(format!(
                "unsupported log root version {}",
                version
            )));
        }

        let tree_size = reader.u64()?;
        let hash_len = reader.u8()? as usize;
        if hash_len > MAX_ROOT_HASH_LEN {
            return Err(MonitorError::malformed_commitment("root hash too long"));
        }
        let root_hash = reader.bytes(hash_len)?.to_vec();
        let timestamp_nanos = reader.u64()?;
        let revision = reader.u64()?;
        let metadata_len = reader.u16()? as usize;
        let metadata = reader.bytes(metadata_len)?.to_vec();

        if reader.pos != data.len() {
            return Err(MonitorError::malformed_commitment(format!(
                "{} trailing bytes after log root",
                data.len() - reader.pos
            )));
        }

        Ok(Self {
            tree_size,
            root_hash,
            timestamp_nanos,
            revision,
            metadata,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + 8 + 1 + self.root_hash.len() + 16 + 2 + self.metadata.len());
        out.extend_from_slice(&LOG_ROOT_V1.to_be_bytes());
        out.extend_from_slice(&self.tree_size.to_be_bytes());
        out.push(self.root_hash.len() as u8);
        out.extend_from_slice(&self.root_hash);
        out.extend_from_slice(&self.timestamp_nanos.to_be_bytes());
        out.extend_from_slice(&self.revision.to_be_bytes());
        out.extend_from_slice(&(self.metadata.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.metadata);
        out
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| MonitorError::malformed_commitment("log root truncated"))?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        buf.copy_from_slice(self.bytes(2)?);
        Ok(u16::from_be_bytes(buf))
    }

    fn u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.bytes(8)?);
        Ok(u64::from_be_bytes(buf))
    }
}
