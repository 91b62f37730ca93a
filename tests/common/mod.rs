#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use blunder_worker::error::OracleError;
use blunder_worker::oracle::{Evaluation, Oracle};
use shakmaty::fen::Fen;
use shakmaty::{Chess, Color, EnPassantMode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Shared view of what a `ScriptedOracle` was asked, kept after the oracle
/// itself has been moved into a walk.
#[derive(Clone, Default)]
pub struct OracleLog {
    pub calls: Rc<RefCell<Vec<(String, Color)>>>,
    pub closes: Rc<Cell<usize>>,
}

impl OracleLog {
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

/// Oracle that hands out pre-scripted perspective scores in call order.
pub struct ScriptedOracle {
    scores: VecDeque<i32>,
    fail_on_call: Option<usize>,
    pub log: OracleLog,
}

impl ScriptedOracle {
    pub fn new(scores: &[i32]) -> Self {
        Self {
            scores: scores.iter().copied().collect(),
            fail_on_call: None,
            log: OracleLog::default(),
        }
    }

    /// Make the n-th call (zero-based) fail as if the engine died.
    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }
}

impl Oracle for ScriptedOracle {
    async fn evaluate(
        &mut self,
        position: &Chess,
        perspective: Color,
    ) -> Result<Evaluation, OracleError> {
        let index = self.log.call_count();
        let fen = Fen::from_position(position, EnPassantMode::Legal).to_string();
        self.log.calls.borrow_mut().push((fen, perspective));

        if self.fail_on_call == Some(index) {
            return Err(OracleError::Exited);
        }
        let score = self.scores.pop_front().unwrap_or(0);
        Ok(Evaluation {
            score,
            mate: None,
            best_move: None,
        })
    }

    async fn close(&mut self) {
        self.log.closes.set(self.log.closes.get() + 1);
    }
}

/// Four plies, both players named.
pub const FOUR_PLY: &str = r#"[Event "Casual"]
[White "Alice"]
[Black "bob"]
[Result "*"]

1. e4 e5 2. Nf3 Nc6 *
"#;

/// A complete HTTP/1.1 response that closes the connection.
pub fn http_response(status: u16, body: &str) -> String {
    format!(
        "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Serve `responses` on 127.0.0.1, one connection each, in order.
/// Returns the base URL and the raw requests as they arrive.
pub async fn spawn_http_stub(responses: Vec<String>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        for response in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            seen.lock().unwrap().push(request);
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
    });

    (format!("http://{addr}"), requests)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
