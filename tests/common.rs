//! Test utilities & fixtures.
//!
//! Spins up a real game server on an ephemeral port backed by a throwaway
//! sled store, plus a small line-oriented JSON client to drive it.

use std::net::SocketAddr;

use serde_json::Value;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use startrader::config::Config;
use startrader::server::GameServer;

/// A running server with its backing data directory kept alive.
pub struct TestServer {
    pub addr: SocketAddr,
    pub data_dir: TempDir,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Stop the accept loop and release the store so the same data
    /// directory can be reopened (restart tests).
    #[allow(dead_code)] // Only the restart tests shut servers down explicitly.
    pub async fn shutdown(self) -> TempDir {
        self.handle.abort();
        let _ = self.handle.await;
        self.data_dir
    }
}

/// Config pointing at a temp data directory.
#[allow(dead_code)]
pub fn test_config(data_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = data_dir.path().to_string_lossy().to_string();
    config
}

/// Start a server on an ephemeral port over a fresh data directory.
pub async fn start_server() -> TestServer {
    let data_dir = TempDir::new().expect("tempdir");
    let config = test_config(&data_dir);
    start_server_with(config, data_dir).await
}

/// Start a server over an existing data directory (for restart tests).
#[allow(dead_code)]
pub async fn start_server_with(config: Config, data_dir: TempDir) -> TestServer {
    let server = GameServer::new(config, false).expect("server");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    TestServer {
        addr,
        data_dir,
        handle,
    }
}

/// Line-oriented JSON client.
pub struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    /// Connect and consume the greeting snapshot.
    pub async fn connect(addr: SocketAddr) -> (Self, Value) {
        let stream = TcpStream::connect(addr).await.expect("connect");
        let (read_half, writer) = stream.into_split();
        let mut client = TestClient {
            lines: BufReader::new(read_half).lines(),
            writer,
        };
        let greeting = client.recv().await;
        (client, greeting)
    }

    pub async fn recv(&mut self) -> Value {
        let line = self
            .lines
            .next_line()
            .await
            .expect("read line")
            .expect("connection open");
        serde_json::from_str(&line).expect("valid JSON response")
    }

    /// Send one command object and read the snapshot that answers it.
    pub async fn send(&mut self, command: Value) -> Value {
        let mut line = command.to_string();
        line.push('\n');
        self.writer
            .write_all(line.as_bytes())
            .await
            .expect("write command");
        self.recv().await
    }
}
