use assert_cmd::prelude::*;
use predicates::str::contains;
use std::fs::{self, File};
use std::process::{Child, Command};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn start_server(addr: &str, storage: &std::path::Path) -> Child {
    let child = Command::cargo_bin("kvstore-server")
        .unwrap()
        .args(&[addr, storage.to_str().unwrap()])
        .spawn()
        .unwrap();
    thread::sleep(Duration::from_secs(1));
    child
}

fn kill_server(mut child: Child) {
    child.kill().expect("server exited before killed");
    child.wait().unwrap();
}

// `kvstore-client` with no args should exit with a non-zero code.
#[test]
fn client_cli_no_args() {
    let temp_dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("kvstore-client").unwrap();
    cmd.current_dir(&temp_dir).assert().failure();
}

#[test]
fn client_cli_invalid_args() {
    let temp_dir = TempDir::new().unwrap();
    for args in [
        &["get"][..],
        &["get", "extra", "field"],
        &["put", "missing_value"],
        &["put", "key", "value", "extra_field"],
        &["get", "key", "--unknown-flag"],
        &["unknown"],
    ] {
        Command::cargo_bin("kvstore-client")
            .unwrap()
            .args(args)
            .current_dir(&temp_dir)
            .assert()
            .failure();
    }
}

// A malformed address is a failed call, exit code 2
#[test]
fn client_cli_invalid_addr() {
    Command::cargo_bin("kvstore-client")
        .unwrap()
        .args(&["get", "key", "--addr", "invalid-addr"])
        .assert()
        .code(2);
}

#[test]
fn client_cli_no_server() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };
    Command::cargo_bin("kvstore-client")
        .unwrap()
        .args(&["put", "key", "value", "--addr", &addr])
        .assert()
        .code(2);
}

// `-V` should print the version
#[test]
fn cli_version() {
    for bin in ["kvstore-client", "kvstore-server"] {
        Command::cargo_bin(bin)
            .unwrap()
            .args(&["-V"])
            .assert()
            .stdout(contains(env!("CARGO_PKG_VERSION")));
    }
}

#[test]
fn server_cli_missing_args() {
    let temp_dir = TempDir::new().unwrap();
    Command::cargo_bin("kvstore-server")
        .unwrap()
        .current_dir(&temp_dir)
        .assert()
        .failure();
    Command::cargo_bin("kvstore-server")
        .unwrap()
        .args(&["127.0.0.1:4100"])
        .current_dir(&temp_dir)
        .assert()
        .failure();
}

// The server refuses to start when the storage path cannot be opened
#[test]
fn server_cli_bad_storage_path() {
    let temp_dir = TempDir::new().unwrap();
    let not_a_dir = temp_dir.path().join("file");
    File::create(&not_a_dir).unwrap();
    Command::cargo_bin("kvstore-server")
        .unwrap()
        .args(&["127.0.0.1:4101", not_a_dir.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("unable to open"));
}

#[test]
fn cli_log_configuration() {
    let temp_dir = TempDir::new().unwrap();
    let storage = temp_dir.path().join("db");
    let stderr_path = temp_dir.path().join("stderr");
    let mut child = Command::cargo_bin("kvstore-server")
        .unwrap()
        .args(&["127.0.0.1:4102", storage.to_str().unwrap()])
        .stderr(File::create(&stderr_path).unwrap())
        .spawn()
        .unwrap();
    thread::sleep(Duration::from_secs(1));
    child.kill().expect("server exited before killed");
    child.wait().unwrap();

    let content = fs::read_to_string(&stderr_path).expect("unable to read from stderr file");
    assert!(content.contains(env!("CARGO_PKG_VERSION")));
    assert!(content.contains("127.0.0.1:4102"));
    assert!(content.contains("pid"));
    assert!(storage.is_dir());
}

#[test]
fn cli_access_server() {
    let addr = "127.0.0.1:4103";
    let temp_dir = TempDir::new().unwrap();
    let server = start_server(addr, &temp_dir.path().join("db"));

    Command::cargo_bin("kvstore-client")
        .unwrap()
        .args(&["put", "k1", "A", "--addr", addr])
        .assert()
        .code(1)
        .stdout(contains("No old value"));

    Command::cargo_bin("kvstore-client")
        .unwrap()
        .args(&["get", "k1", "--addr", addr])
        .assert()
        .success()
        .stdout("A\n");

    Command::cargo_bin("kvstore-client")
        .unwrap()
        .args(&["put", "k1", "B", "--addr", addr])
        .assert()
        .success()
        .stdout("A\n");

    Command::cargo_bin("kvstore-client")
        .unwrap()
        .args(&["get", "k1", "--addr", addr])
        .assert()
        .success()
        .stdout("B\n");

    Command::cargo_bin("kvstore-client")
        .unwrap()
        .args(&["get", "missing", "--addr", addr])
        .assert()
        .code(1)
        .stdout(contains("Key not found"));

    kill_server(server);
}

// put, kill -9 the server, restart on the same storage path, value is still there
#[test]
fn cli_value_survives_crash() {
    let addr = "127.0.0.1:4104";
    let temp_dir = TempDir::new().unwrap();
    let storage = temp_dir.path().join("db");

    let server = start_server(addr, &storage);
    Command::cargo_bin("kvstore-client")
        .unwrap()
        .args(&["put", "d", "X", "--addr", addr])
        .assert()
        .code(1);
    kill_server(server);

    let server = start_server(addr, &storage);
    Command::cargo_bin("kvstore-client")
        .unwrap()
        .args(&["get", "d", "--addr", addr])
        .assert()
        .success()
        .stdout("X\n");
    Command::cargo_bin("kvstore-client")
        .unwrap()
        .args(&["put", "d", "Y", "--addr", addr])
        .assert()
        .success()
        .stdout("X\n");
    kill_server(server);
}

// SIGTERM closes the server and it exits cleanly, puts made before are kept
#[cfg(unix)]
#[test]
fn server_exits_cleanly_on_sigterm() {
    let addr = "127.0.0.1:4105";
    let temp_dir = TempDir::new().unwrap();
    let storage = temp_dir.path().join("db");

    let mut server = start_server(addr, &storage);
    Command::cargo_bin("kvstore-client")
        .unwrap()
        .args(&["put", "t", "V", "--addr", addr])
        .assert()
        .code(1);

    Command::new("kill")
        .args(&["-TERM", &server.id().to_string()])
        .assert()
        .success();
    let status = server.wait().unwrap();
    assert!(status.success());

    let server = start_server(addr, &storage);
    Command::cargo_bin("kvstore-client")
        .unwrap()
        .args(&["get", "t", "--addr", addr])
        .assert()
        .success()
        .stdout("V\n");
    kill_server(server);
}
