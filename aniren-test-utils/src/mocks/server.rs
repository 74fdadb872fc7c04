//! Scripted AniDB UDP server
//!
//! Binds a localhost UDP socket and answers AUTH, FILE, PING and LOGOUT the
//! way AniDB does, recording every request with the instant it arrived.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// One datagram received by the mock server
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    /// Full command text as sent
    pub command: String,
    /// Arrival time
    pub at: Instant,
}

impl ReceivedRequest {
    /// Command name (first word)
    pub fn name(&self) -> &str {
        self.command.split(' ').next().unwrap_or_default()
    }

    /// Value of a `key=value` parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        let (_, params) = self.command.split_once(' ')?;
        params
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

#[derive(Debug, Clone)]
struct Script {
    auth_reply: String,
    files: HashMap<String, String>,
    missing_file_reply: String,
    silent: HashSet<String>,
}

impl Script {
    fn reply(&self, request: &ReceivedRequest) -> Option<String> {
        if self.silent.contains(request.name()) {
            return None;
        }

        let reply = match request.name() {
            "AUTH" => self.auth_reply.clone(),
            "FILE" => request
                .param("ed2k")
                .and_then(|hash| self.files.get(&hash.to_ascii_lowercase()))
                .cloned()
                .unwrap_or_else(|| self.missing_file_reply.clone()),
            "PING" => "300 PONG".to_string(),
            "LOGOUT" => "203 LOGGED OUT".to_string(),
            _ => "598 UNKNOWN COMMAND".to_string(),
        };
        Some(format!("{reply}\n"))
    }
}

/// Builder for `MockAniDBServer`
#[derive(Debug, Clone)]
pub struct MockServerBuilder {
    script: Script,
}

impl Default for MockServerBuilder {
    fn default() -> Self {
        Self {
            script: Script {
                auth_reply: "200 iQUO2 LOGIN ACCEPTED".to_string(),
                files: HashMap::new(),
                missing_file_reply: "320 NO SUCH FILE".to_string(),
                silent: HashSet::new(),
            },
        }
    }
}

impl MockServerBuilder {
    /// Reply to AUTH with `reply` (code and message, no newline)
    pub fn auth_reply(mut self, reply: &str) -> Self {
        self.script.auth_reply = reply.to_string();
        self
    }

    /// Reply to FILE requests for `ed2k` with `reply`
    pub fn file(mut self, ed2k: &str, reply: &str) -> Self {
        self.script
            .files
            .insert(ed2k.to_ascii_lowercase(), reply.to_string());
        self
    }

    /// Reply to FILE requests for unknown hashes with `reply`
    pub fn missing_file_reply(mut self, reply: &str) -> Self {
        self.script.missing_file_reply = reply.to_string();
        self
    }

    /// Never answer the named command
    pub fn silent_on(mut self, command: &str) -> Self {
        self.script.silent.insert(command.to_string());
        self
    }

    /// Bind and start answering
    pub async fn start(self) -> MockAniDBServer {
        let socket = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("bind mock AniDB socket");
        let addr = socket.local_addr().expect("mock socket address");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        let script = self.script;
        let task = tokio::spawn(async move {
            let mut buf = vec![0u8; 2048];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    break;
                };
                let request = ReceivedRequest {
                    command: String::from_utf8_lossy(&buf[..len]).into_owned(),
                    at: Instant::now(),
                };
                let reply = script.reply(&request);
                recorded.lock().unwrap().push(request);

                if let Some(reply) = reply {
                    let _ = socket.send_to(reply.as_bytes(), peer).await;
                }
            }
        });

        MockAniDBServer {
            addr,
            requests,
            task,
        }
    }
}

/// Localhost UDP responder standing in for api.anidb.net
pub struct MockAniDBServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<ReceivedRequest>>>,
    task: JoinHandle<()>,
}

impl MockAniDBServer {
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::default()
    }

    /// Start a server with the default script
    pub async fn start() -> Self {
        Self::builder().start().await
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Every request received so far, in arrival order
    pub fn requests(&self) -> Vec<ReceivedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests with the given command name
    pub fn commands_named(&self, name: &str) -> Vec<ReceivedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.name() == name)
            .collect()
    }

    /// Command names in arrival order
    pub fn command_names(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r.name().to_string())
            .collect()
    }
}

impl Drop for MockAniDBServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
