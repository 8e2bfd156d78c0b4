//! Stand-in detection service.
//!
//! Serves the same endpoints as the real service (sync, via `tiny_http`)
//! backed by a synthetic [`colony::Colony`], so the dashboard can be run and
//! tested without a camera or model:
//! - `GET /get_stats`, `GET /get_time_series`
//! - `POST /start_detection`, `POST /stop_detection`
//! - `GET /api/sessions?limit=N`, `GET /api/metrics?limit=N&session_id=ID`
//! - `GET /test-email`
//!
//! Launched via `hivewatch simulate` (default: `http://127.0.0.1:5000`).

pub mod colony;

use std::io::Cursor;
use std::net::SocketAddr;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::model::EmailTestResult;

use colony::Colony;

type HttpResponse = Response<Cursor<Vec<u8>>>;

const DEFAULT_SESSION_LIMIT: usize = 10;
const DEFAULT_METRIC_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

pub struct Simulator {
    server: Server,
    colony: Colony,
    verbose: bool,
}

impl Simulator {
    /// Bind the listener. Port `0` picks a free port; see [`Self::local_addr`].
    pub fn bind(addr: &str) -> Result<Self> {
        let server =
            Server::http(addr).map_err(|e| anyhow!("failed to start simulator on {addr}: {e}"))?;
        Ok(Self {
            server,
            colony: Colony::new(),
            verbose: false,
        })
    }

    /// Print a short access log line per request.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Handle requests sequentially until the listener closes.
    pub fn run(mut self) -> Result<()> {
        for request in self.server.incoming_requests() {
            let method = request.method().clone();
            let url = request.url().to_string();

            let response = match dispatch(&mut self.colony, &method, &url, Instant::now()) {
                Ok(resp) => resp,
                Err(e) => error_response(500, &e.to_string()),
            };
            let _ = request.respond(response);

            if self.verbose {
                println!(
                    "{} {} {}",
                    method,
                    url,
                    chrono::Local::now().format("%H:%M:%S")
                );
            }
        }
        Ok(())
    }
}

/// Bind on `addr` and serve until interrupted.
pub fn serve(addr: &str) -> Result<()> {
    let simulator = Simulator::bind(addr)?.verbose(true);
    let shown = simulator
        .local_addr()
        .map_or_else(|| addr.to_string(), |a| a.to_string());
    println!("hivewatch simulator running at http://{shown}");
    println!("Press Ctrl+C to stop.\n");
    simulator.run()
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn dispatch(colony: &mut Colony, method: &Method, url: &str, now: Instant) -> Result<HttpResponse> {
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        (&Method::Get, "/") => text_response(
            "hivewatch simulator: synthetic bee and varroa detection service\n",
        ),
        (&Method::Get, "/get_stats") => json_response(&colony.stats(now)),
        (&Method::Get, "/get_time_series") => json_response(&colony.time_series(now)),
        (&Method::Post, "/start_detection") => json_response(&colony.start(now)),
        (&Method::Post, "/stop_detection") => json_response(&colony.stop(now)),
        (&Method::Get, "/api/sessions") => {
            let limit = query_param(url, "limit").unwrap_or(DEFAULT_SESSION_LIMIT);
            json_response(&colony.sessions(limit))
        }
        (&Method::Get, "/api/metrics") => {
            let limit = query_param(url, "limit").unwrap_or(DEFAULT_METRIC_LIMIT);
            let session_id = query_param(url, "session_id");
            json_response(&colony.metrics(limit, session_id))
        }
        (&Method::Get, "/test-email") => json_response(&EmailTestResult {
            status: "error".to_string(),
            message: "Email delivery is not configured in the simulator.".to_string(),
            error_details: "no SMTP settings".to_string(),
        }),
        _ => Ok(error_response(404, "not found")),
    }
}

/// Parse a single query string parameter.
fn query_param<T: std::str::FromStr>(url: &str, key: &str) -> Option<T> {
    url.split('?').nth(1)?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k == key { v.parse().ok() } else { None }
    })
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn json_response<T: Serialize>(data: &T) -> Result<HttpResponse> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type("application/json; charset=utf-8")?)
        .with_status_code(StatusCode(200)))
}

fn text_response(body: &str) -> Result<HttpResponse> {
    Ok(Response::from_data(body.as_bytes().to_vec())
        .with_header(content_type("text/plain; charset=utf-8")?)
        .with_status_code(StatusCode(200)))
}

fn error_response(code: u16, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": message }).to_string();
    let response = Response::from_data(body.into_bytes()).with_status_code(StatusCode(code));
    match content_type("application/json; charset=utf-8") {
        Ok(header) => response.with_header(header),
        Err(_) => response,
    }
}

fn content_type(value: &str) -> Result<Header> {
    Header::from_bytes("Content-Type", value).map_err(|()| anyhow!("invalid header value {value}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_param_extracts_value() {
        assert_eq!(query_param::<usize>("/api/sessions?limit=7", "limit"), Some(7));
        assert_eq!(
            query_param::<i64>("/api/metrics?limit=5&session_id=3", "session_id"),
            Some(3)
        );
    }

    #[test]
    fn query_param_missing_or_invalid() {
        assert_eq!(query_param::<usize>("/api/sessions", "limit"), None);
        assert_eq!(query_param::<usize>("/api/sessions?limit=abc", "limit"), None);
        assert_eq!(query_param::<usize>("/api/sessions?limit=", "limit"), None);
    }

    #[test]
    fn unknown_route_is_404() {
        let mut colony = Colony::new();
        let resp = dispatch(&mut colony, &Method::Get, "/nope", Instant::now()).unwrap();
        assert_eq!(resp.status_code(), StatusCode(404));
    }

    #[test]
    fn wrong_method_is_404() {
        let mut colony = Colony::new();
        let resp = dispatch(&mut colony, &Method::Get, "/start_detection", Instant::now()).unwrap();
        assert_eq!(resp.status_code(), StatusCode(404));
        assert!(!colony.is_active());
    }
}
