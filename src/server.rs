use core::time;
use std::{net::{TcpListener, ToSocketAddrs, TcpStream}, io::{BufRead, BufReader, BufWriter, Write, self}, sync::{Arc, atomic::{AtomicBool, Ordering}}, thread};

use crossbeam::channel::bounded;
use serde::Deserialize;
use serde_json::Deserializer;
use slog::{o, info, error, Logger, warn};

use crate::{KvsEngine, Result, protocols::{Request, GetResponse, PutResponse}, thread_pool::ThreadPool, KvsError, StoreCoordinator};

const ACCEPT_POLL: time::Duration = time::Duration::from_millis(10);
const IDLE_POLL: time::Duration = time::Duration::from_secs(2);


/// kvs server answering get and put requests from kvs clients
///
/// Each accepted connection gets its own reader thread, which decodes one
/// request at a time and hands it to the thread pool. The pool only ever runs
/// single store calls, so idle connections hold no worker. Requests on a
/// connection are answered in order; the [`StoreCoordinator`] is the only
/// point where connections synchronize.
#[derive(Clone)]
pub struct KvsServer<E: KvsEngine, P: ThreadPool> {
    store: StoreCoordinator<E>,
    log: Logger,
    pool: P,
    terminated: Arc<AtomicBool>,
}

impl<E: KvsEngine, P: ThreadPool> KvsServer<E, P> {
    /// create a kvs server in front of the given store
    pub fn new(store: StoreCoordinator<E>, pool: P, log: Logger) -> Self {
        let terminated = Arc::new(AtomicBool::new(false));
        KvsServer { store, log, pool, terminated }
    }

    /// bind to the specified address and serve requests until closed
    pub fn run<A: ToSocketAddrs>(&self, addr: &A) -> Result<()> {
        let listener = TcpListener::bind(addr)?;
        self.run_on(listener)
    }

    /// serve requests arriving on an already bound listener until closed
    pub fn run_on(&self, listener: TcpListener) -> Result<()> {
        listener.set_nonblocking(true)?;
        info!(self.log, "listening on {addr}", addr=listener.local_addr()?.to_string());
        for possible_stream in listener.incoming() {
            if self.terminated.load(Ordering::SeqCst) {
                warn!(self.log, "server got terminated");
                break;
            }
            match possible_stream {
                Ok(stream) => {
                    let conn = Connection {
                        store: self.store.clone(),
                        pool: self.pool.clone(),
                        log: self.log.new(o!("name" => "conn_logger")),
                        terminated: self.terminated.clone(),
                    };
                    thread::spawn(move || {
                        if let Err(err) = conn.serve(stream) {
                            error!(conn.log, "failed to serve with {err}", err=err.to_string())
                        }
                    });
                },
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                },
                Err(err) => {
                    error!(self.log, "connection failed with {err}", err=err.to_string())
                },
            }
        }
        Ok(())
    }

    /// stop to accept new connection and ask existing connections to exit
    ///
    /// A connection notices at its next idle poll; a request already being
    /// received is still answered.
    pub fn close(&self) {
        self.terminated.store(true, Ordering::SeqCst);
    }
}

enum Reply {
    Get(GetResponse),
    Put(PutResponse),
}

enum Incoming {
    // the first bytes of a request are buffered
    Ready,
    Idle,
    Closed,
}

struct Connection<E: KvsEngine, P: ThreadPool> {
    store: StoreCoordinator<E>,
    pool: P,
    log: Logger,
    terminated: Arc<AtomicBool>,
}

impl<E: KvsEngine, P: ThreadPool> Connection<E, P> {
    fn serve(&self, stream: TcpStream) -> Result<()> {
        // accepted sockets may inherit the listener's non-blocking mode
        stream.set_nonblocking(false)?;
        stream.set_nodelay(true)?;
        let remote_addr = stream.peer_addr()?.to_string();
        info!(self.log, "serving connection from {addr}", addr=&remote_addr);

        let mut reader = BufReader::new(stream.try_clone()?);
        let mut writer = BufWriter::new(stream.try_clone()?);
        let (reply_sender, reply_receiver) = bounded::<Reply>(1);

        loop {
            if self.terminated.load(Ordering::SeqCst) {
                warn!(self.log, "connection handling got terminated!");
                break;
            }

            match poll_incoming(&stream, &mut reader)? {
                Incoming::Idle => continue,
                Incoming::Closed => {
                    info!(self.log, "connection from {addr} closed", addr=&remote_addr);
                    break;
                },
                Incoming::Ready => {},
            }

            // a started request is read to its end however slowly it arrives
            stream.set_read_timeout(None)?;
            let request = Request::deserialize(&mut Deserializer::from_reader(&mut reader))?;

            let store = self.store.clone();
            let log = self.log.clone();
            let reply = reply_sender.clone();
            self.pool.spawn(move || {
                let _ = reply.send(handle(&store, request, &log));
            });
            let reply = reply_receiver
                .recv()
                .map_err(|_| KvsError::StringError("request job ended without a reply".to_owned()))?;

            match reply {
                Reply::Get(resp) => serde_json::to_writer(&mut writer, &resp)?,
                Reply::Put(resp) => serde_json::to_writer(&mut writer, &resp)?,
            }
            writer.flush()?;
        }
        Ok(())
    }
}

// Waits at most one idle poll for the next request to start arriving.
fn poll_incoming(stream: &TcpStream, reader: &mut BufReader<TcpStream>) -> Result<Incoming> {
    stream.set_read_timeout(Some(IDLE_POLL))?;
    match reader.fill_buf() {
        Ok(buf) if buf.is_empty() => Ok(Incoming::Closed),
        Ok(_) => Ok(Incoming::Ready),
        Err(err) => match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted => Ok(Incoming::Idle),
            io::ErrorKind::ConnectionReset => Ok(Incoming::Closed),
            _ => Err(KvsError::from(err)),
        },
    }
}

fn handle<E: KvsEngine>(store: &StoreCoordinator<E>, request: Request, logger: &Logger) -> Reply {
    match request {
        Request::Get { key } => {
            let shown = String::from_utf8_lossy(&key).into_owned();
            info!(logger, "handling request try to {method} {key}", method="get", key=&shown);
            Reply::Get(match store.read(&key) {
                Ok(value) => GetResponse::from_value(value),
                Err(kvs_error) => {
                    error!(logger, "get {key} failed with {err}", key=&shown, err=kvs_error.to_string());
                    GetResponse::Err(format!("{}", kvs_error))
                },
            })
        },
        Request::Put { key, value } => {
            let shown = String::from_utf8_lossy(&key).into_owned();
            info!(logger, "handling request try to {method} {key} with {len} bytes", method="put", key=&shown, len=value.len());
            Reply::Put(match store.write(&key, &value) {
                Ok(old_value) => PutResponse::from_old_value(old_value),
                Err(kvs_error) => {
                    error!(logger, "put {key} failed with {err}", key=&shown, err=kvs_error.to_string());
                    PutResponse::Err(format!("{}", kvs_error))
                },
            })
        },
    }
}
