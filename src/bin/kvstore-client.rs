use clap::{Parser, Subcommand};
use kvstore::{Outcome, Result, Session};
use std::process::exit;

const DEFAULT_ADDR: &str = "127.0.0.1:4000";


#[derive(Parser)]
#[command(name=env!("CARGO_BIN_NAME"))]
#[command(version=env!("CARGO_PKG_VERSION"))]
#[command(author=env!("CARGO_PKG_AUTHORS"))]
#[command(about=env!("CARGO_PKG_DESCRIPTION"))]
struct Cli {
    /// address:port of kvstore server
    #[arg(long, global = true, default_value_t = DEFAULT_ADDR.to_string())]
    addr: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// get the value of the key
    Get {
        /// key to get
        key: String,
    },

    /// put the value of the key and print the value it replaced
    Put {
        /// key to put
        key: String,

        /// value to put
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut session = match Session::init(&cli.addr) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("{}", err);
            exit(2);
        }
    };

    let (outcome, absent_msg) = match &cli.command {
        Command::Get { key } => (session.get(key.as_bytes()), "Key not found"),
        Command::Put { key, value } => (session.put(key.as_bytes(), value.as_bytes()), "No old value"),
    };
    session.shutdown()?;

    match outcome {
        Outcome::Present(value) => println!("{}", String::from_utf8_lossy(&value)),
        Outcome::Absent => {
            println!("{}", absent_msg);
            exit(1);
        }
        Outcome::Failed(err) => {
            eprintln!("{}", err);
            exit(2);
        }
    }
    Ok(())
}
