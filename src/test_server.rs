//! Minimal HTTP/1.1 server for exercising the downloader against real sockets.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct ServerState {
    files: HashMap<String, Vec<u8>>,
    pages: HashMap<String, String>,
    failing_ranges: HashSet<String>,
    short_ranges: HashSet<String>,
    ignored_ranges: HashSet<String>,
    unsized_heads: HashSet<String>,
    stalled: HashSet<String>,
    requests: Vec<RecordedRequest>,
}

pub struct TestServer {
    addr: SocketAddr,
    state: Arc<Mutex<ServerState>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(ServerState::default()));

        let accept_state = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = accept_state.clone();
                tokio::spawn(async move {
                    let _ = handle(stream, state).await;
                });
            }
        });

        Self { addr, state }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn add_file(&self, path: &str, body: Vec<u8>) {
        self.state.lock().unwrap().files.insert(path.to_string(), body);
    }

    pub fn add_page(&self, path: &str, html: &str) {
        self.state.lock().unwrap().pages.insert(path.to_string(), html.to_string());
    }

    /// Ranged GETs for `path` answer 500 while HEAD keeps working.
    pub fn fail_ranges(&self, path: &str) {
        self.state.lock().unwrap().failing_ranges.insert(path.to_string());
    }

    /// Ranged GETs for `path` return only the first half of the range.
    pub fn shorten_ranges(&self, path: &str) {
        self.state.lock().unwrap().short_ranges.insert(path.to_string());
    }

    /// Ranged GETs for `path` get the whole body with `200 OK`.
    pub fn ignore_ranges(&self, path: &str) {
        self.state.lock().unwrap().ignored_ranges.insert(path.to_string());
    }

    /// HEAD for `path` answers without a `Content-Length` header.
    pub fn omit_length(&self, path: &str) {
        self.state.lock().unwrap().unsized_heads.insert(path.to_string());
    }

    /// Every request for `path` waits several seconds before the reply.
    pub fn stall(&self, path: &str) {
        self.state.lock().unwrap().stalled.insert(path.to_string());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

struct Reply {
    status: &'static str,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Reply {
    fn new(status: &'static str, body: Vec<u8>) -> Self {
        Self { status, headers: vec![], body }
    }
}

async fn handle(stream: TcpStream, state: Arc<Mutex<ServerState>>) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();
    let path = target.split('?').next().unwrap_or_default().to_string();

    let mut headers = vec![];
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let request = RecordedRequest { method, path, headers };
    let reply = respond(&request, &state);
    let (stalled, r#unsized) = {
        let mut state = state.lock().unwrap();
        state.requests.push(request.clone());
        (
            state.stalled.contains(&request.path),
            request.method == "HEAD" && state.unsized_heads.contains(&request.path),
        )
    };

    if stalled {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    let mut head = format!("HTTP/1.1 {}\r\nConnection: close\r\n", reply.status);
    if !r#unsized {
        head.push_str(&format!("Content-Length: {}\r\n", reply.body.len()));
    }
    for (name, value) in &reply.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");

    let mut stream = reader.into_inner();
    stream.write_all(head.as_bytes()).await?;
    if request.method != "HEAD" {
        stream.write_all(&reply.body).await?;
    }
    stream.flush().await?;
    stream.shutdown().await
}

fn respond(request: &RecordedRequest, state: &Mutex<ServerState>) -> Reply {
    let state = state.lock().unwrap();

    if let Some(html) = state.pages.get(&request.path) {
        let mut reply = Reply::new("200 OK", html.clone().into_bytes());
        reply.headers.push(("Content-Type".into(), "text/html".into()));
        return reply;
    }

    let Some(body) = state.files.get(&request.path) else {
        return Reply::new("404 Not Found", b"not found".to_vec());
    };

    let range = request
        .header("range")
        .and_then(parse_range)
        .filter(|_| !state.ignored_ranges.contains(&request.path));
    match range {
        Some(_) if state.failing_ranges.contains(&request.path) => {
            Reply::new("500 Internal Server Error", b"boom".to_vec())
        }
        Some((start, end)) if start < body.len() as u64 => {
            let end = end.min(body.len() as u64 - 1);
            let mut slice = body[start as usize..=end as usize].to_vec();
            if state.short_ranges.contains(&request.path) {
                slice.truncate(slice.len() / 2);
            }
            let mut reply = Reply::new("206 Partial Content", slice);
            reply.headers.push((
                "Content-Range".into(),
                format!("bytes {}-{}/{}", start, end, body.len()),
            ));
            reply
        }
        Some(_) => Reply::new("416 Range Not Satisfiable", vec![]),
        None => Reply::new("200 OK", body.clone()),
    }
}

fn parse_range(value: &str) -> Option<(u64, u64)> {
    let bounds = value.strip_prefix("bytes=")?;
    let (start, end) = bounds.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}
