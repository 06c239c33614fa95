use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::router::Router;

const READ_CHUNK: usize = 4096;

/// Time limits applied to every connection.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    /// Close a connection that sends nothing for this long between requests
    pub idle_timeout: Duration,
    /// Reject a request that has started but not completed within this long
    pub request_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(2),
        }
    }
}

pub struct Connection<S> {
    stream: S,
    peer: SocketAddr,
    router: Arc<Router>,
    settings: ConnectionSettings,
    buffer: BytesMut,
    state: ConnectionState,
}

pub enum ConnectionState {
    Accepted,
    Reading,
    Dispatching(Request),
    Responding(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

enum ReadOutcome {
    Request(Request),
    Malformed(ParseError),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        peer: SocketAddr,
        router: Arc<Router>,
        settings: ConnectionSettings,
    ) -> Self {
        Self {
            stream,
            peer,
            router,
            settings,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            state: ConnectionState::Accepted,
        }
    }

    /// Drives the connection until it closes. Requests are answered one at
    /// a time in arrival order.
    ///
    /// The disconnect is logged however the connection ends, I/O errors
    /// included; those are still returned to the caller.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let result = self.serve().await;

        // Best-effort FIN ahead of the drop
        let _ = self.stream.shutdown().await;
        info!(peer = %self.peer, "Client has DISCONNECTED");

        result
    }

    async fn serve(&mut self) -> anyhow::Result<()> {
        let peer = self.peer;

        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Accepted => {
                    info!(%peer, "Client has CONNECTED");
                    self.state = ConnectionState::Reading;
                }

                ConnectionState::Reading => {
                    self.state = match self.read_request().await? {
                        ReadOutcome::Request(req) => {
                            info!(%peer, "{}", req.request_line());
                            ConnectionState::Dispatching(req)
                        }

                        ReadOutcome::Malformed(reason) => {
                            warn!(%peer, %reason, "Client sent an INVALID REQUEST");
                            let response = Response::malformed_request();
                            info!(%peer, status = response.status.as_u16(), "{}", response.status_line());
                            ConnectionState::Responding(ResponseWriter::new(&response), false)
                        }

                        ReadOutcome::Closed => ConnectionState::Closed,
                    };
                }

                ConnectionState::Dispatching(req) => {
                    let (mut response, handler) = Self::handle_request(&self.router, &req).await;
                    let keep_alive = req.keep_alive();

                    if !keep_alive {
                        response.headers.set("Connection", "close");
                    }
                    if req.method == Method::HEAD {
                        response.body.clear();
                    }

                    info!(
                        %peer,
                        handler,
                        status = response.status.as_u16(),
                        "{}",
                        response.status_line()
                    );

                    let writer = ResponseWriter::new(&response);
                    self.state = ConnectionState::Responding(writer, keep_alive);
                }

                ConnectionState::Responding(mut writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    if keep_alive {
                        self.state = ConnectionState::Reading; // go back for next request
                    } else {
                        self.state = ConnectionState::Closed;
                    }
                }

                ConnectionState::Closed => break,
            }
        }

        Ok(())
    }

    /// Reads until one full request is buffered.
    ///
    /// While nothing of the next request has arrived the idle timeout
    /// applies and expiry closes quietly. Once its first byte is in, the
    /// whole message must arrive within the request timeout; expiry or EOF
    /// at that point makes the request malformed.
    async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        let mut request_deadline = None;

        loop {
            if !self.buffer.is_empty() {
                // Try parsing whatever we already have
                match parse_http_request(&self.buffer) {
                    Ok((request, consumed)) => {
                        self.buffer.advance(consumed);
                        return Ok(ReadOutcome::Request(request));
                    }

                    Err(ParseError::Incomplete) => {
                        // Need more data → fall through to read
                    }

                    Err(e) => return Ok(ReadOutcome::Malformed(e)),
                }
            }

            let started = !self.buffer.is_empty();
            let deadline = if started {
                *request_deadline
                    .get_or_insert_with(|| Instant::now() + self.settings.request_timeout)
            } else {
                Instant::now() + self.settings.idle_timeout
            };

            self.buffer.reserve(READ_CHUNK);
            let read = timeout_at(deadline, self.stream.read_buf(&mut self.buffer)).await;

            match read {
                Ok(Ok(0)) | Err(_) if started => {
                    return Ok(ReadOutcome::Malformed(ParseError::Incomplete));
                }
                Ok(Ok(0)) => return Ok(ReadOutcome::Closed),
                Err(_) => {
                    debug!(peer = %self.peer, "Idle timeout");
                    return Ok(ReadOutcome::Closed);
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::ConnectionReset => {
                    return Ok(ReadOutcome::Closed);
                }
                Ok(Err(e)) => return Err(e.into()),
            }
        }
    }

    async fn handle_request(router: &Router, req: &Request) -> (Response, &'static str) {
        match router.resolve(&req.path) {
            Some(matched) => {
                let handler = matched.route.handler();
                (handler.handle(req, matched.sub_path).await, handler.name())
            }
            None => (Response::not_found(), "not_found"),
        }
    }
}
