//! Common test utilities for sync integration tests.

pub mod fixtures;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use charmander_manager::{InMemoryManager, Manager, Node, Task};
use charmander_proto::{Decode, ReplyDecoder};

/// Commands grouped per accepted connection, in accept order.
type CommandLog = Arc<Mutex<Vec<Vec<Vec<String>>>>>;

/// Scripted key-value store speaking the wire protocol on a loopback
/// listener.
///
/// Records every command it receives; answers `KEYS` with the configured
/// intelligence keys and `GET` with their values. `SET` and `EXPIRE` are
/// recorded only; the reporter never reads their replies.
pub struct FakeStore {
    address: String,
    commands: CommandLog,
    intelligence: Arc<Mutex<BTreeMap<String, String>>>,
    phantom_keys: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<usize>>,
    accept_loop: JoinHandle<()>,
}

impl FakeStore {
    /// Starts the store on an ephemeral port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let commands = Arc::new(Mutex::new(Vec::new()));
        let intelligence = Arc::new(Mutex::new(BTreeMap::new()));
        let phantom_keys = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(Mutex::new(0));

        let accept_loop = tokio::spawn({
            let commands = commands.clone();
            let intelligence = intelligence.clone();
            let phantom_keys = phantom_keys.clone();
            let closed = closed.clone();
            async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        return;
                    };
                    let slot = {
                        let mut log = commands.lock().unwrap();
                        log.push(Vec::new());
                        log.len() - 1
                    };
                    tokio::spawn(handle_client(
                        stream,
                        commands.clone(),
                        slot,
                        intelligence.clone(),
                        phantom_keys.clone(),
                        closed.clone(),
                    ));
                }
            }
        });

        Self {
            address,
            commands,
            intelligence,
            phantom_keys,
            closed,
            accept_loop,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Publishes an intelligence entry under its full store key.
    pub fn set_intelligence(&self, key: &str, value: &str) {
        self.intelligence
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
    }

    /// Lists a key in `KEYS` replies that `GET` then answers nil for, as
    /// if it expired between the two commands.
    pub fn set_phantom_key(&self, key: &str) {
        self.phantom_keys.lock().unwrap().push(key.to_owned());
    }

    /// All commands received so far, grouped by connection in accept
    /// order and flattened. The reporter opens its connections
    /// sequentially, so this order is deterministic even though the
    /// per-connection handlers run concurrently.
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Waits until `n` client connections have been fully drained, so
    /// fire-and-forget writes are visible in [`commands`](Self::commands).
    pub async fn wait_for_closed(&self, n: usize) {
        for _ in 0..500 {
            if *self.closed.lock().unwrap() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("fake store never saw {n} connections close");
    }
}

impl Drop for FakeStore {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

async fn handle_client(
    mut stream: TcpStream,
    commands: CommandLog,
    slot: usize,
    intelligence: Arc<Mutex<BTreeMap<String, String>>>,
    phantom_keys: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<usize>>,
) {
    let mut decoder = ReplyDecoder::new();
    let mut buf = [0u8; 4096];

    'connection: loop {
        // request frames share the array-reply shape
        let args = loop {
            match decoder.try_array() {
                Ok(Decode::Ready(args)) => break args,
                Ok(Decode::Incomplete) => match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break 'connection,
                    Ok(n) => decoder.feed(&buf[..n]),
                },
                Err(_) => break 'connection,
            }
        };
        commands.lock().unwrap()[slot].push(args.clone());

        match args.first().map(String::as_str) {
            Some("KEYS") => {
                let mut keys: Vec<String> = intelligence.lock().unwrap().keys().cloned().collect();
                keys.extend(phantom_keys.lock().unwrap().iter().cloned());
                let mut reply = format!("*{}\r\n", keys.len());
                for key in &keys {
                    reply.push_str(&format!("${}\r\n{key}\r\n", key.len()));
                }
                let _ = stream.write_all(reply.as_bytes()).await;
            }
            Some("GET") => {
                let value = args
                    .get(1)
                    .and_then(|key| intelligence.lock().unwrap().get(key).cloned());
                let reply = match value {
                    Some(value) => format!("${}\r\n{value}\r\n", value.len()),
                    None => "$-1\r\n".to_owned(),
                };
                let _ = stream.write_all(reply.as_bytes()).await;
            }
            _ => {}
        }
    }

    *closed.lock().unwrap() += 1;
}

/// Manager double that records every `set_task_intelligence` call on top
/// of the in-memory implementation.
pub struct RecordingManager {
    inner: InMemoryManager,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl RecordingManager {
    pub fn new(store_address: impl Into<String>) -> Self {
        Self {
            inner: InMemoryManager::new(store_address),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &InMemoryManager {
        &self.inner
    }

    /// Every recorded `(task_id, attribute, value)` call, in order.
    pub fn intelligence_calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Manager for RecordingManager {
    fn nodes(&self) -> Vec<Node> {
        self.inner.nodes()
    }

    fn tasks(&self) -> Vec<Task> {
        self.inner.tasks()
    }

    fn set_task_intelligence(&self, task_id: &str, attribute: &str, value: &str) {
        self.calls.lock().unwrap().push((
            task_id.to_owned(),
            attribute.to_owned(),
            value.to_owned(),
        ));
        self.inner.set_task_intelligence(task_id, attribute, value);
    }

    fn store_address(&self) -> String {
        self.inner.store_address()
    }
}
