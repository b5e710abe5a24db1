//! Shared utilities for integration testing.

#![allow(dead_code)]

use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use signatory::blockchain::NonceResolver;
use signatory::config::SecurityConfig;
use signatory::keystore::{
    DecryptError, EncryptedKeyFile, KeyDecryptor, KeyStore, UnlockSettings,
};
use signatory::lifecycle::{unlock_key, Shutdown};
use signatory::policy::{Network, TransferPolicy};
use signatory::secret::{ChannelError, Clock, PassphrasePrompt, SecretBuffer, SecretChannel};
use signatory::{HttpServer, TransactionAuthorizer};

/// Anvil's well-known test account #0.
pub const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const SOURCE: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const ALLOWED: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
pub const OTHER: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";
pub const PASSPHRASE: &[u8] = b"correct horse battery staple";

/// An explorer answer: HTTP status, body, and an optional delay.
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: "{}".into(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// JSON-RPC body returned by the explorer proxy for a transaction count.
pub fn transaction_count(hex: &str) -> String {
    format!(r#"{{"jsonrpc":"2.0","id":1,"result":"{}"}}"#, hex)
}

/// Start a programmable mock explorer on an ephemeral port.
///
/// `f` receives the request line (method, path, and query) of each request.
/// Returns the bound address and the request lines seen so far.
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, Arc<Mutex<Vec<String>>>)
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Reply> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let log = seen.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let log = log.clone();
                    tokio::spawn(async move {
                        let request_line = read_request_head(&mut socket).await;
                        log.lock().unwrap().push(request_line.clone());

                        let reply = f(request_line).await;
                        tokio::time::sleep(reply.delay).await;

                        let status_text = match reply.status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
                             Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            reply.body.len(),
                            reply.body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, seen)
}

// Reads up to the end of the headers and returns the request line.
async fn read_request_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&head)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Channel that answers from a script; `None` simulates a broken terminal.
pub struct ScriptedChannel {
    pub lines: VecDeque<Option<Vec<u8>>>,
    pub shown: Vec<String>,
}

impl ScriptedChannel {
    pub fn new(lines: Vec<Option<&[u8]>>) -> Self {
        Self {
            lines: lines.into_iter().map(|l| l.map(|b| b.to_vec())).collect(),
            shown: Vec::new(),
        }
    }
}

impl SecretChannel for ScriptedChannel {
    fn display(&mut self, text: &str) -> io::Result<()> {
        self.shown.push(text.to_string());
        Ok(())
    }

    fn read_hidden(&mut self) -> Result<SecretBuffer, ChannelError> {
        match self.lines.pop_front() {
            Some(Some(line)) => Ok(SecretBuffer::capture(&mut line.as_slice())?),
            _ => Err(ChannelError::NotInteractive("script exhausted".into())),
        }
    }
}

/// Clock that advances a fixed step on every reading.
pub struct StepClock {
    now: Mutex<Instant>,
    step: Duration,
}

impl StepClock {
    pub fn new(step: Duration) -> Self {
        Self {
            now: Mutex::new(Instant::now()),
            step,
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> Instant {
        let mut now = self.now.lock().unwrap();
        *now += self.step;
        *now
    }
}

/// Decrypts to the test key for one passphrase only.
pub struct FixedDecryptor {
    pub passphrase: &'static [u8],
}

impl KeyDecryptor for FixedDecryptor {
    fn decrypt(
        &self,
        _file: &EncryptedKeyFile,
        passphrase: &[u8],
    ) -> Result<PrivateKeySigner, DecryptError> {
        if passphrase == self.passphrase {
            Ok(TEST_KEY.parse().unwrap())
        } else {
            Err(DecryptError("Mac Mismatch".into()))
        }
    }
}

pub fn key_file() -> EncryptedKeyFile {
    EncryptedKeyFile::from_bytes(
        "keys/test.json",
        br#"{"version":3,"crypto":{"cipher":"aes-128-ctr"}}"#,
    )
    .unwrap()
}

pub fn unlocked_store() -> KeyStore {
    let mut prompt = PassphrasePrompt::with_clock(
        ScriptedChannel::new(vec![Some(PASSPHRASE)]),
        StepClock::new(Duration::from_secs(2)),
    );
    unlock_key(
        &key_file(),
        SOURCE.parse().unwrap(),
        &mut prompt,
        &FixedDecryptor {
            passphrase: PASSPHRASE,
        },
        &UnlockSettings::default(),
    )
    .unwrap()
}

pub fn policy(network: Network) -> TransferPolicy {
    TransferPolicy::new(
        SOURCE.parse().unwrap(),
        [ALLOWED.parse::<Address>().unwrap()],
        U256::from(1000u64),
        41_000_000_000,
        network,
    )
    .unwrap()
}

pub fn resolver(explorer: SocketAddr, timeout: Duration) -> NonceResolver {
    NonceResolver::new(
        "test-token".into(),
        timeout,
        Some(format!("http://{}", explorer).parse().unwrap()),
    )
    .unwrap()
}

/// A running signing service.
pub struct TestService {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<Result<(), io::Error>>,
}

impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Serve an unlocked authorizer on an ephemeral port, using `explorer` for nonces.
pub async fn start_service(explorer: SocketAddr, network: Network) -> TestService {
    let authorizer = Arc::new(TransactionAuthorizer::new(
        Arc::new(unlocked_store()),
        Arc::new(policy(network)),
        resolver(explorer, Duration::from_secs(1)),
    ));
    let server = HttpServer::new(authorizer, &SecurityConfig::default());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestService {
        addr,
        shutdown,
        handle,
    }
}
