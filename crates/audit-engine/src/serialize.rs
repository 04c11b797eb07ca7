//! Session snapshot format.
//!
//! A suspended session is stored as a binary envelope around a JSON
//! payload, with a SHA-256 trailer so a truncated or hand-edited checkpoint
//! is refused instead of resumed with silently wrong answers.
//!
//! Layout:
//!   [magic: 4 bytes "DAS\0"] [version_major: 1] [version_minor: 1]
//!   [flags: 1] [reserved: 1] [document_count: u32 LE] [answer_count: u32 LE]
//!   [payload_length: u32 LE] [json_payload: N bytes] [sha256: 32 bytes]
//!
//! Flag bit 0 marks a revision session.

use sha2::{Digest, Sha256};

use audit_core::hash::hash_hex;

use crate::error::{EngineError, Result};
use crate::session::ControlSession;

const MAGIC: [u8; 4] = *b"DAS\0";

const VERSION_MAJOR: u8 = 0;
const VERSION_MINOR: u8 = 1;

const FLAG_REVISION: u8 = 0b0000_0001;

const HEADER_SIZE: usize = 4 + 1 + 1 + 1 + 1 + 4 + 4 + 4;
const HASH_SIZE: usize = 32;

/// A serialized control session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session: ControlSession,
}

impl SessionSnapshot {
    pub fn new(session: ControlSession) -> Self {
        Self { session }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(&self.session)
            .map_err(|e| EngineError::Serialization(e.to_string()))?;

        let (documents, answers) = counts(&self.session);
        let flags = if self.session.is_revision() {
            FLAG_REVISION
        } else {
            0
        };

        let mut buf = Vec::with_capacity(HEADER_SIZE + json.len() + HASH_SIZE);
        buf.extend_from_slice(&MAGIC);
        buf.push(VERSION_MAJOR);
        buf.push(VERSION_MINOR);
        buf.push(flags);
        buf.push(0);
        buf.extend_from_slice(&documents.to_le_bytes());
        buf.extend_from_slice(&answers.to_le_bytes());
        buf.extend_from_slice(&(json.len() as u32).to_le_bytes());
        buf.extend_from_slice(&json);

        let hash = Sha256::digest(&buf);
        buf.extend_from_slice(&hash);
        Ok(buf)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE + HASH_SIZE {
            return Err(EngineError::TooShort {
                expected: HEADER_SIZE + HASH_SIZE,
                actual: data.len(),
            });
        }
        if data[0..4] != MAGIC {
            return Err(EngineError::InvalidMagic);
        }
        let (major, minor) = (data[4], data[5]);
        if major != VERSION_MAJOR {
            return Err(EngineError::UnsupportedVersion { major, minor });
        }

        let documents = read_u32(data, 8);
        let answers = read_u32(data, 12);
        let payload_len = read_u32(data, 16) as usize;

        let payload_end = HEADER_SIZE + payload_len;
        if data.len() < payload_end + HASH_SIZE {
            return Err(EngineError::TooShort {
                expected: payload_end + HASH_SIZE,
                actual: data.len(),
            });
        }

        let stored = &data[payload_end..payload_end + HASH_SIZE];
        let computed = Sha256::digest(&data[..payload_end]);
        if computed.as_slice() != stored {
            return Err(EngineError::IntegrityFailed {
                expected: hash_hex(stored),
                actual: hash_hex(computed.as_slice()),
            });
        }

        let session: ControlSession = serde_json::from_slice(&data[HEADER_SIZE..payload_end])
            .map_err(|e| EngineError::Deserialization(e.to_string()))?;

        if counts(&session) != (documents, answers) {
            return Err(EngineError::Deserialization(format!(
                "count mismatch: header says {documents} document(s) / {answers} answer(s)"
            )));
        }
        if session.is_revision() != (data[6] & FLAG_REVISION != 0) {
            return Err(EngineError::Deserialization(
                "revision flag does not match payload".into(),
            ));
        }

        Ok(Self { session })
    }
}

fn counts(session: &ControlSession) -> (u32, u32) {
    let documents = session.documents().count() as u32;
    let answers = session
        .documents()
        .map(|d| d.answered_count() as u32)
        .sum();
    (documents, answers)
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}
