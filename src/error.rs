use failure::Fail;
use std::{any::type_name, io, sync::PoisonError};

/// Error type for kvstore.
#[derive(Fail, Debug)]
pub enum KvsError {
    /// A lock guarding the store was poisoned by a panicking holder.
    #[fail(display = "{}", _0)]
    PoisonError(String),
    /// String error.
    #[fail(display = "{}", _0)]
    StringError(String),
    /// IO error.
    #[fail(display = "{}", _0)]
    Io(#[cause] io::Error),
    /// Serialization or deserialization error.
    #[fail(display = "{}", _0)]
    Serde(#[cause] serde_json::Error),
    /// sled engine error, the durable map failed to read or write.
    #[fail(display = "storage fault: {}", _0)]
    Storage(#[cause] sled::Error),
    /// Storage fault reported by a non-sled engine.
    #[fail(display = "storage fault: {}", _0)]
    StorageFault(String),
    /// The server answered the call with a failure instead of a status.
    #[fail(display = "remote failure: {}", _0)]
    Remote(String),
    /// The session was shut down or never connected.
    #[fail(display = "not connected")]
    NotConnected,
    /// An earlier call of the session failed on the wire.
    #[fail(display = "connection lost, shut down and init a new session")]
    ConnectionLost,
    /// rayon threadpool builder error
    #[fail(display = "{}", _0)]
    ThreadPoolBuildError(#[cause] rayon::ThreadPoolBuildError),
}

impl KvsError {
    /// Whether the error came from the durable map rather than the transport.
    pub fn is_storage_fault(&self) -> bool {
        matches!(self, KvsError::Storage(_) | KvsError::StorageFault(_))
    }
}

impl From<io::Error> for KvsError {
    fn from(err: io::Error) -> KvsError {
        KvsError::Io(err)
    }
}

impl From<sled::Error> for KvsError {
    fn from(err: sled::Error) -> KvsError {
        KvsError::Storage(err)
    }
}

impl From<serde_json::Error> for KvsError {
    fn from(err: serde_json::Error) -> KvsError {
        KvsError::Serde(err)
    }
}

impl<T> From<PoisonError<T>> for KvsError {
    fn from(_value: PoisonError<T>) -> Self {
        KvsError::PoisonError(format!("poison error with type: {}", type_name::<T>()))
    }
}

impl From<rayon::ThreadPoolBuildError> for KvsError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        KvsError::ThreadPoolBuildError(err)
    }
}

/// Result type for kvstore.
pub type Result<T> = std::result::Result<T, KvsError>;
