//! Minimal HTTP/1.1 stand-in for the B2 API used by the app tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

struct Route {
    path: String,
    /// Served in order; the last one repeats.
    responses: VecDeque<(u16, String)>,
}

/// Answers requests by path. Each connection carries one request.
#[derive(Clone)]
pub(crate) struct MockB2 {
    url: String,
    routes: Arc<Mutex<Vec<Route>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockB2 {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let mock = Self {
            url: format!("http://127.0.0.1:{port}"),
            routes: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        };

        let server = mock.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let server = server.clone();
                tokio::spawn(async move { server.serve(stream).await });
            }
        });
        mock
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Queues a response for requests whose path ends with `path`.
    pub fn respond(&self, path: &str, status: u16, body: impl Into<String>) {
        let mut routes = self.routes.lock().unwrap();
        match routes.iter_mut().find(|r| r.path == path) {
            Some(route) => route.responses.push_back((status, body.into())),
            None => routes.push(Route {
                path: path.to_string(),
                responses: VecDeque::from([(status, body.into())]),
            }),
        }
    }

    /// Raw text of every request received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose request line targets `path`.
    pub fn requests_to(&self, path: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| request_path(r) == Some(path))
            .collect()
    }

    async fn serve(&self, mut stream: TcpStream) {
        let request = read_request(&mut stream).await;
        let path = request_path(&request).unwrap_or_default().to_string();
        self.requests.lock().unwrap().push(request);

        let (status, body) = {
            let mut routes = self.routes.lock().unwrap();
            match routes.iter_mut().find(|r| path.ends_with(&r.path)) {
                Some(route) if route.responses.len() > 1 => {
                    route.responses.pop_front().unwrap_or((500, String::new()))
                }
                Some(route) => route.responses.front().cloned().unwrap_or((500, String::new())),
                None => (
                    404,
                    r#"{"status":404,"code":"not_found","message":"no route"}"#.to_string(),
                ),
            }
        };

        let resp = format!(
            "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let _ = stream.write_all(resp.as_bytes()).await;
        let _ = stream.shutdown().await;
    }
}

fn request_path(request: &str) -> Option<&str> {
    request.lines().next()?.split_whitespace().nth(1)
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(end) = text.find("\r\n\r\n") {
            let content_length = text[..end]
                .lines()
                .find_map(|l| {
                    l.to_ascii_lowercase()
                        .strip_prefix("content-length:")
                        .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
