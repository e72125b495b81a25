//! Form record on-disk format
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE, whole record)
//! +------------------+
//! | Collection       | (length-prefixed string)
//! +------------------+
//! | Document ID      | (length-prefixed string)
//! +------------------+
//! | Tombstone Flag   | (u8: 0 = live, 1 = deleted)
//! +------------------+
//! | Body             | (length-prefixed bytes, JSON)
//! +------------------+
//! | Checksum         | (u32 LE, CRC32)
//! +------------------+
//! ```
//!
//! The checksum covers every byte before it.

use std::io::{self, Read};

use crc32fast::Hasher;
use serde_json::Value;

use super::errors::{StorageError, StorageResult};

/// Smallest possible record: length + two empty strings + flag + empty body + checksum
pub(crate) const MIN_RECORD_SIZE: usize = 4 + 4 + 4 + 1 + 4 + 4;

/// One append to the form store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRecord {
    pub collection: String,
    pub document_id: String,
    pub is_tombstone: bool,
    /// JSON body; empty for tombstones
    pub body: Vec<u8>,
}

impl FormRecord {
    /// Live document record. The document must encode as JSON.
    pub fn document(
        collection: impl Into<String>,
        document_id: impl Into<String>,
        document: &Value,
    ) -> StorageResult<Self> {
        let collection = collection.into();
        let document_id = document_id.into();
        let body = serde_json::to_vec(document).map_err(|e| {
            StorageError::invalid_document(&format!("{}:{}", collection, document_id), e.to_string())
        })?;
        Ok(Self {
            collection,
            document_id,
            is_tombstone: false,
            body,
        })
    }

    /// Deletion marker
    pub fn tombstone(collection: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            document_id: document_id.into(),
            is_tombstone: true,
            body: Vec::new(),
        }
    }

    /// `collection:document_id`
    pub fn key(&self) -> String {
        format!("{}:{}", self.collection, self.document_id)
    }

    /// Decode the JSON body
    pub fn to_value(&self) -> StorageResult<Value> {
        serde_json::from_slice(&self.body)
            .map_err(|e| StorageError::invalid_document(&self.key(), e.to_string()))
    }

    fn serialize_body(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            12 + self.collection.len() + self.document_id.len() + 1 + self.body.len(),
        );

        write_bytes(&mut buf, self.collection.as_bytes());
        write_bytes(&mut buf, self.document_id.as_bytes());
        buf.push(u8::from(self.is_tombstone));
        write_bytes(&mut buf, &self.body);

        buf
    }

    /// Encode the full record including length prefix and checksum.
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.serialize_body();
        let record_length = (4 + body.len() + 4) as u32;

        let mut record = Vec::with_capacity(record_length as usize);
        record.extend_from_slice(&record_length.to_le_bytes());
        record.extend_from_slice(&body);

        let checksum = compute_checksum(&record);
        record.extend_from_slice(&checksum.to_le_bytes());

        record
    }

    /// Decode one record from the front of `data`, verifying its checksum.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Record too short",
            ));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

        if record_length < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if data.len() < record_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Record truncated: expected {} bytes, got {}",
                    record_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_length - 4;
        let mut stored = [0u8; 4];
        stored.copy_from_slice(&data[checksum_offset..record_length]);
        let stored_checksum = u32::from_le_bytes(stored);
        let computed_checksum = compute_checksum(&data[..checksum_offset]);

        if computed_checksum != stored_checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed_checksum, stored_checksum
                ),
            ));
        }

        let mut cursor = io::Cursor::new(&data[4..checksum_offset]);

        let collection = read_string(&mut cursor)?;
        let document_id = read_string(&mut cursor)?;

        let mut flag = [0u8; 1];
        cursor.read_exact(&mut flag)?;
        let body = read_bytes(&mut cursor)?;

        Ok((
            Self {
                collection,
                document_id,
                is_tombstone: flag[0] != 0,
                body,
            },
            record_length,
        ))
    }
}

/// CRC32 (IEEE) over `data`
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_string<R: Read>(reader: &mut R) -> io::Result<String> {
    String::from_utf8(read_bytes(reader)?).map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidData, format!("Invalid UTF-8: {}", e))
    })
}
