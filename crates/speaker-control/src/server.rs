use crate::error::{ControlError, Result};
use crate::routes::{ControlState, Method, Reply};
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;
use tiny_http::{Header, Request, Response, Server, StatusCode};

const MAX_BODY_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ControlConfig {
    pub listen: String,
    /// Origin allowed by CORS (the controller UI dev server).
    pub cors_origin: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            cors_origin: "http://localhost:5173".to_string(),
        }
    }
}

/// HTTP control endpoint on its own thread. `stop()` (or drop) unblocks the
/// listener and joins the thread.
pub struct ControlServer {
    server: Arc<Server>,
    thread: Option<JoinHandle<()>>,
    addr: Option<SocketAddr>,
}

impl ControlServer {
    pub fn start(cfg: ControlConfig, state: ControlState) -> Result<Self> {
        let server = Server::http(cfg.listen.as_str()).map_err(|e| ControlError::Bind {
            addr: cfg.listen.clone(),
            reason: e.to_string(),
        })?;
        let server = Arc::new(server);

        let addr = match server.server_addr() {
            tiny_http::ListenAddr::IP(addr) => Some(addr),
            #[allow(unreachable_patterns)]
            _ => None,
        };
        log::info!("control server listening on {}", addr.map(|a| a.to_string()).unwrap_or(cfg.listen.clone()));

        let thread = {
            let server = server.clone();
            let cors = cors_headers(&cfg.cors_origin);
            std::thread::Builder::new()
                .name("control".into())
                .spawn(move || {
                    for request in server.incoming_requests() {
                        handle_request(request, &state, &cors);
                    }
                    log::debug!("control server thread exiting");
                })
                .map_err(|e| ControlError::Bind { addr: cfg.listen.clone(), reason: e.to_string() })?
        };

        Ok(Self { server, thread: Some(thread), addr })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    pub fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.server.unblock();
            if thread.join().is_err() {
                log::error!("control server thread panicked");
            }
            log::info!("control server stopped");
        }
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_request(mut request: Request, state: &ControlState, cors: &[Header]) {
    let method = match request.method() {
        tiny_http::Method::Get => Method::Get,
        tiny_http::Method::Post => Method::Post,
        tiny_http::Method::Patch => Method::Patch,
        tiny_http::Method::Options => Method::Options,
        _ => Method::Other,
    };
    let url = request.url().to_string();
    log::debug!("control: {method:?} {url}");

    let mut body = String::new();
    if let Err(e) = request.as_reader().take(MAX_BODY_BYTES).read_to_string(&mut body) {
        log::debug!("control: unreadable body: {e}");
        body.clear();
    }

    let reply = state.handle(method, &url, &body);
    if let Err(e) = request.respond(to_response(reply, cors)) {
        log::warn!("control: failed to send response: {e}");
    }
}

fn to_response(reply: Reply, cors: &[Header]) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut response = Response::from_data(reply.body.into_bytes()).with_status_code(StatusCode(reply.status));
    if let Some(h) = header("Content-Type", reply.content_type) {
        response.add_header(h);
    }
    for h in cors {
        response.add_header(h.clone());
    }
    response
}

fn cors_headers(origin: &str) -> Vec<Header> {
    [
        ("Access-Control-Allow-Origin", origin),
        ("Access-Control-Allow-Methods", "GET, POST, OPTIONS, PATCH"),
        ("Access-Control-Allow-Headers", "Content-Type"),
    ]
    .into_iter()
    .filter_map(|(k, v)| header(k, v))
    .collect()
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}
