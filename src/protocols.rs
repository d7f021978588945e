//! Messages exchanged between [`KvsClient`](crate::client::KvsClient) and
//! [`KvsServer`](crate::server::KvsServer).
//!
//! Both sides write one JSON document per message on the TCP stream and read
//! them back with a streaming deserializer.
use serde::{Deserialize, Serialize};

/// request sent by a client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// read the value of `key`
    Get {
        /// key to read
        key: Vec<u8>,
    },
    /// replace the value of `key` and report the previous one
    Put {
        /// key to write
        key: Vec<u8>,
        /// new value
        value: Vec<u8>,
    },
}

/// outcome of a successful get
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetStatus {
    /// the key exists, the value is attached
    Found = 0,
    /// the key was never written
    NotFound = 1,
}

/// outcome of a successful put
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutStatus {
    /// the key held a value before, it is attached
    HadOldValue = 0,
    /// the key was never written before
    NoOldValue = 1,
}

/// response to [`Request::Get`]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum GetResponse {
    /// the call completed
    Ok {
        /// whether the key was found
        status: GetStatus,
        /// stored value, empty unless `status` is `Found`
        value: Vec<u8>,
    },
    /// the call failed on the server, no status is available
    Err(String),
}

/// response to [`Request::Put`]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum PutResponse {
    /// the call completed
    Ok {
        /// whether a previous value existed
        status: PutStatus,
        /// previous value, empty unless `status` is `HadOldValue`
        old_value: Vec<u8>,
    },
    /// the call failed on the server, the write may or may not have happened
    Err(String),
}

impl GetResponse {
    /// build the response for the value read from the store
    pub fn from_value(value: Option<Vec<u8>>) -> Self {
        match value {
            Some(value) => GetResponse::Ok { status: GetStatus::Found, value },
            None => GetResponse::Ok { status: GetStatus::NotFound, value: Vec::new() },
        }
    }

    /// turn the response back into the value read from the store
    pub fn into_value(self) -> Result<Option<Vec<u8>>, String> {
        match self {
            GetResponse::Ok { status: GetStatus::Found, value } => Ok(Some(value)),
            GetResponse::Ok { status: GetStatus::NotFound, .. } => Ok(None),
            GetResponse::Err(err) => Err(err),
        }
    }
}

impl PutResponse {
    /// build the response for the old value captured by the store
    pub fn from_old_value(old_value: Option<Vec<u8>>) -> Self {
        match old_value {
            Some(old_value) => PutResponse::Ok { status: PutStatus::HadOldValue, old_value },
            None => PutResponse::Ok { status: PutStatus::NoOldValue, old_value: Vec::new() },
        }
    }

    /// turn the response back into the old value captured by the store
    pub fn into_old_value(self) -> Result<Option<Vec<u8>>, String> {
        match self {
            PutResponse::Ok { status: PutStatus::HadOldValue, old_value } => Ok(Some(old_value)),
            PutResponse::Ok { status: PutStatus::NoOldValue, .. } => Ok(None),
            PutResponse::Err(err) => Err(err),
        }
    }
}
