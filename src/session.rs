use std::net::{SocketAddr, ToSocketAddrs};

use crate::client::KvsClient;
use crate::{KvsError, Result};

/// Result of one [`Session`] call, flattened to the three client outcomes.
#[derive(Debug)]
pub enum Outcome {
    /// The call succeeded and carries a payload: the stored value for a get,
    /// the replaced value for a put. Result code `0`.
    Present(Vec<u8>),
    /// The call succeeded without a payload: the key is absent for a get, no
    /// value existed before a put. Result code `1`.
    Absent,
    /// The call did not complete, either on the wire or on the server.
    /// Result code `-1`. After a failed put the write may or may not have
    /// happened; re-query with a get before retrying.
    Failed(KvsError),
}

impl Outcome {
    /// the numeric result code, `0`, `1` or `-1`
    pub fn code(&self) -> i32 {
        match self {
            Outcome::Present(_) => 0,
            Outcome::Absent => 1,
            Outcome::Failed(_) => -1,
        }
    }

    /// the payload, only for `Present`
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            Outcome::Present(value) => Some(value),
            _ => None,
        }
    }

    /// consumes the outcome and returns the payload, only for `Present`
    pub fn into_value(self) -> Option<Vec<u8>> {
        match self {
            Outcome::Present(value) => Some(value),
            _ => None,
        }
    }

    /// whether the call failed
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

impl From<Result<Option<Vec<u8>>>> for Outcome {
    fn from(result: Result<Option<Vec<u8>>>) -> Self {
        match result {
            Ok(Some(value)) => Outcome::Present(value),
            Ok(None) => Outcome::Absent,
            Err(err) => Outcome::Failed(err),
        }
    }
}

/// An explicit client connection handle.
///
/// [`Session::init`] only checks that the server address can be resolved; the
/// TCP connection is dialed by the first call. Every call is single-shot over
/// that one connection: once it fails on the wire, the session is broken and
/// every later call fails with `ConnectionLost` until it is shut down and a new
/// session is initialized.
///
/// ```rust,no_run
/// # use kvstore::{Result, Session};
/// # fn try_main() -> Result<()> {
/// let mut session = Session::init("127.0.0.1:4000")?;
/// let outcome = session.put(b"k1", b"A");
/// assert_eq!(outcome.code(), 1);
/// assert_eq!(session.get(b"k1").value(), Some(&b"A"[..]));
/// session.shutdown()?;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    addrs: Vec<SocketAddr>,
    link: Link,
}

enum Link {
    // not dialed yet
    Pending,
    Open(KvsClient),
    // a call failed on the wire, the stream state is unknown
    Broken,
    Closed,
}

impl Session {
    /// Prepares a session with the server at `server`, given as `host:port`.
    ///
    /// # Errors
    ///
    /// Fails if the address is malformed or does not resolve.
    pub fn init(server: &str) -> Result<Session> {
        let addrs: Vec<SocketAddr> = server.to_socket_addrs()?.collect();
        if addrs.is_empty() {
            return Err(KvsError::StringError(format!("{server} resolves to no address")));
        }
        Ok(Session { addrs, link: Link::Pending })
    }

    /// the resolved server addresses
    pub fn server_addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }

    /// Reads `key`: `Present(value)` if stored, `Absent` if never written.
    pub fn get(&mut self, key: &[u8]) -> Outcome {
        self.call(|client| client.get(key.to_vec()))
    }

    /// Writes `value` under `key`: `Present(old_value)` if a value was
    /// replaced, `Absent` if the key was new.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Outcome {
        self.call(|client| client.put(key.to_vec(), value.to_vec()))
    }

    /// Releases the connection. Later calls fail with `NotConnected`.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` if the session was already shut down.
    pub fn shutdown(&mut self) -> Result<()> {
        if let Link::Closed = self.link {
            return Err(KvsError::NotConnected);
        }
        self.link = Link::Closed;
        Ok(())
    }

    fn call<F>(&mut self, f: F) -> Outcome
    where
        F: FnOnce(&mut KvsClient) -> Result<Option<Vec<u8>>>,
    {
        if let Link::Pending = self.link {
            match KvsClient::connect(&self.addrs[..]) {
                Ok(client) => self.link = Link::Open(client),
                Err(err) => {
                    self.link = Link::Broken;
                    return Outcome::Failed(err);
                }
            }
        }
        let client = match &mut self.link {
            Link::Open(client) => client,
            Link::Broken => return Outcome::Failed(KvsError::ConnectionLost),
            Link::Pending | Link::Closed => return Outcome::Failed(KvsError::NotConnected),
        };
        let result = f(client);
        if let Err(err) = &result {
            // a server-side failure leaves the stream in sync
            if !matches!(err, KvsError::Remote(_)) {
                self.link = Link::Broken;
            }
        }
        result.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_codes() {
        assert_eq!(Outcome::Present(b"v".to_vec()).code(), 0);
        assert_eq!(Outcome::Absent.code(), 1);
        assert_eq!(Outcome::Failed(KvsError::NotConnected).code(), -1);
    }

    #[test]
    fn malformed_address_fails_init() {
        assert!(Session::init("not an address").is_err());
        assert!(Session::init("127.0.0.1").is_err());
    }

    #[test]
    fn calls_after_shutdown_fail() -> Result<()> {
        let mut session = Session::init("127.0.0.1:1")?;
        session.shutdown()?;
        assert!(matches!(session.get(b"k"), Outcome::Failed(KvsError::NotConnected)));
        assert!(matches!(session.put(b"k", b"v"), Outcome::Failed(KvsError::NotConnected)));
        assert!(session.shutdown().is_err());
        Ok(())
    }

    #[test]
    fn failed_dial_breaks_session() -> Result<()> {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
            listener.local_addr()?
        };
        let mut session = Session::init(&addr.to_string())?;
        assert!(matches!(session.get(b"k"), Outcome::Failed(KvsError::Io(_))));
        assert!(matches!(session.get(b"k"), Outcome::Failed(KvsError::ConnectionLost)));
        session.shutdown()?;
        Ok(())
    }
}
