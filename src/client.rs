use std::io::Write;
use std::net::{TcpStream,ToSocketAddrs};
use serde::Deserialize;
use serde_json::{Deserializer, de::IoRead};
use crate::protocols::*;
use crate::Result;
use crate::KvsError;
use std::io::BufWriter;


/// kvs client to connect to a kvs server and issue get and put calls
///
/// Each call is one request and one response on the same connection; nothing
/// is retried.
pub struct KvsClient {
    writer: BufWriter<TcpStream>,
    reader: Deserializer<IoRead<TcpStream>>
}

impl KvsClient {
    /// connect to specific kvs-server address
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let write_connection = TcpStream::connect(addr)?;
        write_connection.set_nodelay(true)?;
        let read_connection = write_connection.try_clone()?;
        let writer = BufWriter::new( write_connection);
        let reader = Deserializer::from_reader(read_connection);
        Ok(
            KvsClient { writer, reader }
        )
    }

    /// get value of key from the store via kvs-server
    ///
    /// Returns `None` if the key was never written.
    pub fn get(&mut self, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
        let request = Request::Get { key };
        serde_json::to_writer(&mut self.writer, &request)?;
        self.writer.flush()?;

        let response = GetResponse::deserialize(&mut self.reader)?;
        response.into_value().map_err(KvsError::Remote)
    }

    /// put value of key to the store via kvs-server, returning the old value
    ///
    /// Returns `None` if the key held no value before this call. On error the
    /// write may or may not have been applied.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<Option<Vec<u8>>> {
        let request = Request::Put { key, value };
        serde_json::to_writer(&mut self.writer, &request)?;
        self.writer.flush()?;

        let response = PutResponse::deserialize(&mut self.reader)?;
        response.into_old_value().map_err(KvsError::Remote)
    }
}
