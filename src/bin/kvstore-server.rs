use clap::{Parser, ValueEnum};
use kvstore::{KvsError, Result, SledKvsEngine, StoreCoordinator, server::KvsServer, thread_pool::*};
use std::path::PathBuf;
use slog::{Drain, o, info, error, Logger};


#[derive(ValueEnum, Clone, Debug, PartialEq)]
enum Pool {
    /// one fresh thread per request
    Naive,

    /// fixed workers fed by a shared queue
    Shared,

    /// rayon thread pool
    Rayon,
}


#[derive(Parser)]
#[command(name=env!("CARGO_BIN_NAME"))]
#[command(version=env!("CARGO_PKG_VERSION"))]
#[command(author=env!("CARGO_PKG_AUTHORS"))]
#[command(about=env!("CARGO_PKG_DESCRIPTION"))]
struct Cli {
    /// the ip:port address to bind to
    listen_address: String,

    /// directory of the store, created if absent
    storage_path: PathBuf,

    /// the thread pool running store calls; `shared` and `rayon` run at most
    /// `--threads` requests at once, idle connections hold no worker
    #[arg(long, value_enum, default_value_t = Pool::Shared)]
    pool: Pool,

    /// worker threads for the `shared` and `rayon` pools, default as cpu count
    #[arg(long)]
    threads: Option<u32>,

    /// number of key-hash lock stripes in front of the store
    #[arg(long, default_value_t = 1)]
    lock_stripes: usize,
}


fn main() -> Result<()> {
    let decorator = slog_term::PlainSyncDecorator::new(std::io::stderr());
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let root_log = slog::Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")));

    let cli = Cli::parse();

    let server_log = root_log.new(o!(
        "addr" => cli.listen_address.clone(),
        "storage" => cli.storage_path.display().to_string(),
    ));
    info!(server_log, "starting kvstore server..."; "pid" => std::process::id());

    let engine = match SledKvsEngine::open(&cli.storage_path) {
        Ok(engine) => engine,
        Err(err) => {
            error!(server_log, "unable to open or create store: {err}", err=err.to_string());
            return Err(err);
        }
    };
    let store = StoreCoordinator::with_stripes(engine, cli.lock_stripes);
    let threads = cli.threads.unwrap_or(num_cpus::get() as u32);

    match cli.pool {
        Pool::Naive => serve(store, NaiveThreadPool::new(threads)?, &cli.listen_address, server_log),
        Pool::Shared => serve(store, SharedQueueThreadPool::new(threads)?, &cli.listen_address, server_log),
        Pool::Rayon => serve(store, RayonThreadPool::new(threads)?, &cli.listen_address, server_log),
    }
}

fn serve<P: ThreadPool>(store: StoreCoordinator<SledKvsEngine>, pool: P, addr: &str, log: Logger) -> Result<()> {
    let server = KvsServer::new(store, pool, log.clone());

    let stopper = server.clone();
    let signal_log = log.clone();
    ctrlc::set_handler(move || {
        info!(signal_log, "received termination signal, shutting down");
        stopper.close();
    })
    .map_err(|err| KvsError::StringError(format!("unable to install signal handler: {err}")))?;

    if let Err(err) = server.run(&addr) {
        error!(log, "server stopped with {err}", err=err.to_string());
        return Err(err);
    }
    info!(log, "server stopped");
    Ok(())
}
