//! A throwaway HTTP server standing in for the Roblox endpoints.

#![allow(dead_code)]

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const LOOKUP_PATH: &str = "/users/get-by-username";
pub const VALIDATE_PATH: &str = "/v1/usernames/validate";

/// One request as seen by the server.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: String,
    pub target: String,
    pub body: String,
}

impl Call {
    pub fn is_lookup(&self) -> bool {
        self.method == "GET" && self.target.starts_with(LOOKUP_PATH)
    }

    pub fn is_validate(&self) -> bool {
        self.method == "POST" && self.target.starts_with(VALIDATE_PATH)
    }

    /// Username from the query string or the JSON body.
    pub fn username(&self) -> String {
        if let Some((_, rest)) = self.target.split_once("username=") {
            return rest.split('&').next().unwrap_or_default().to_string();
        }
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|v| v["username"].as_str().map(str::to_string))
            .unwrap_or_default()
    }
}

/// How the server answers a call.
pub enum Reply {
    Json(u16, String),
    Stall(Duration),
}

impl Reply {
    pub fn ok(body: serde_json::Value) -> Self {
        Self::Json(200, body.to_string())
    }
}

type Route = dyn Fn(&Call) -> Reply + Send + Sync;

pub struct FixtureServer {
    base: String,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FixtureServer {
    pub fn start(route: impl Fn(&Call) -> Reply + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fixture server");
        let addr = listener.local_addr().expect("local addr");
        let calls = Arc::new(Mutex::new(Vec::new()));
        let route: Arc<Route> = Arc::new(route);

        let server_calls = Arc::clone(&calls);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let route = Arc::clone(&route);
                let calls = Arc::clone(&server_calls);
                thread::spawn(move || {
                    let _ = handle(stream, route.as_ref(), &calls);
                });
            }
        });

        Self {
            base: format!("http://{addr}"),
            calls,
        }
    }

    pub fn lookup_url(&self) -> String {
        format!("{}{LOOKUP_PATH}", self.base)
    }

    pub fn validate_url(&self) -> String {
        format!("{}{VALIDATE_PATH}", self.base)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }
}

/// The standard fixture: a fixed set of existing accounts and validation
/// verdicts keyed by username; everything else is valid.
pub fn roblox_fixture(
    accounts: &'static [(&'static str, u64, &'static str)],
    rejections: &'static [(&'static str, &'static str)],
) -> FixtureServer {
    FixtureServer::start(move |call| {
        let name = call.username();
        if call.is_lookup() {
            return match accounts.iter().find(|(n, _, _)| *n == name) {
                Some((_, id, resolved)) => {
                    Reply::ok(serde_json::json!({ "Id": id, "Username": resolved }))
                }
                None => Reply::ok(serde_json::json!({
                    "success": false,
                    "errorMessage": "User not found"
                })),
            };
        }
        if call.is_validate() {
            return match rejections.iter().find(|(n, _)| *n == name) {
                Some((_, message)) => {
                    Reply::ok(serde_json::json!({ "code": 2, "message": message }))
                }
                None => Reply::ok(serde_json::json!({
                    "code": 0,
                    "message": "Username is valid"
                })),
            };
        }
        Reply::Json(404, "{}".to_string())
    })
}

/// An address nothing is listening on.
pub fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}/closed")
}

fn handle(stream: TcpStream, route: &Route, calls: &Mutex<Vec<Call>>) -> io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);

    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            if key.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body)?;

    let call = Call {
        method,
        target,
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    calls.lock().expect("calls lock").push(call.clone());

    let mut stream = stream;
    match route(&call) {
        Reply::Json(status, body) => {
            write!(
                stream,
                "HTTP/1.1 {status} Fixture\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )?;
            stream.flush()
        }
        Reply::Stall(duration) => {
            thread::sleep(duration);
            Ok(())
        }
    }
}
