use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::http::parser::{ParseError, leading_blank_lines, parse_into, request_frame_len};
use crate::http::request::Request;
use crate::http::response::{HTTP_VERSION, Outcome, Response, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::router::table::not_found_message;
use crate::server::app::App;

/// Drives one client connection through read, dispatch and write cycles.
///
/// Works over any byte stream: plain TCP, TLS, or an in-memory duplex in
/// tests.
pub struct Connection<S> {
    stream: S,
    app: Arc<App>,
    /// Bytes received but not yet consumed by a request
    buffer: Vec<u8>,
    read_buf: Vec<u8>,
    state: ConnectionState,
    /// Completed keep-alive reuses
    reused: u32,
}

pub enum ConnectionState {
    Reading,
    Parsed(Request, Response),
    Dispatched(Request, Response),
    KeepAlive,
    Closed,
}

enum ReadOutcome {
    /// A complete request occupies this many bytes at the front of the buffer
    Frame(usize),
    Rejected(ParseError),
    Eof,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, app: Arc<App>) -> Self {
        let read_size = app.settings().read_buffer_size;
        Self {
            stream,
            app,
            buffer: Vec::with_capacity(read_size),
            read_buf: vec![0; read_size],
            state: ConnectionState::Reading,
            reused: 0,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await? {
                        ReadOutcome::Frame(len) => {
                            let mut req = self.app.requests().acquire();
                            let parsed = parse_into(&self.buffer[..len], &mut req);
                            self.buffer.drain(..len);

                            match parsed {
                                Ok(()) => {
                                    let mut res = self.app.responses().acquire();
                                    res.version.push_str(HTTP_VERSION);
                                    ConnectionState::Parsed(req, res)
                                }
                                Err(e) => {
                                    self.app.requests().release(req);
                                    self.reject(e).await?;
                                    ConnectionState::Closed
                                }
                            }
                        }
                        ReadOutcome::Rejected(e) => {
                            self.reject(e).await?;
                            ConnectionState::Closed
                        }
                        ReadOutcome::Eof => ConnectionState::Closed,
                    };
                }

                ConnectionState::Parsed(mut req, mut res) => {
                    self.app.router().dispatch(&mut req, &mut res);
                    self.state = ConnectionState::Dispatched(req, res);
                }

                ConnectionState::Dispatched(req, mut res) => {
                    self.complete(&req, &mut res).await;

                    let keep_alive = self.app.settings().reuse_connections
                        && self.reused < self.app.settings().max_reuse
                        && !req.wants_close();

                    res.header("Connection", if keep_alive { "keep-alive" } else { "close" });
                    let written = self.write_response(&mut res).await;

                    debug!(
                        method = %req.method,
                        path = %req.path,
                        status = res.status.as_u16(),
                        keep_alive,
                        "request served"
                    );

                    self.app.requests().release(req);
                    self.app.responses().release(res);
                    written?;

                    self.state = if keep_alive {
                        ConnectionState::KeepAlive
                    } else {
                        ConnectionState::Closed
                    };
                }

                ConnectionState::KeepAlive => {
                    self.reused += 1;
                    self.state = ConnectionState::Reading;
                }

                ConnectionState::Closed => {
                    if let Err(e) = self.stream.shutdown().await {
                        debug!(error = %e, "shutdown failed");
                    }
                    break;
                }
            }
        }

        Ok(())
    }

    /// Accumulates bytes until one full request is buffered.
    async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        let max_size = self.app.settings().max_request_size;
        loop {
            let blank = leading_blank_lines(&self.buffer);
            self.buffer.drain(..blank);

            match request_frame_len(&self.buffer, max_size) {
                Ok(Some(len)) => return Ok(ReadOutcome::Frame(len)),
                Ok(None) => {
                    // Need more data → fall through to read
                }
                Err(e) => return Ok(ReadOutcome::Rejected(e)),
            }

            let n = self.stream.read(&mut self.read_buf).await?;

            if n == 0 {
                // Client closed connection
                return Ok(ReadOutcome::Eof);
            }

            self.buffer.extend_from_slice(&self.read_buf[..n]);
        }
    }

    /// Turns whatever the handler left behind into bytes ready to send.
    async fn complete(&self, req: &Request, res: &mut Response) {
        match res.outcome().clone() {
            Outcome::File(path) => match self.app.cache().get(&path).await {
                Ok(contents) => res.fill_file(&contents),
                Err(e) => {
                    debug!(file = %path.display(), error = %e, "static file unavailable");
                    res.replace_with_error(StatusCode::NotFound, &not_found_message(req));
                }
            },
            Outcome::Pending => {
                warn!(method = %req.method, path = %req.path, "handler did not send a response");
                res.replace_with_error(
                    StatusCode::InternalServerError,
                    "Internal Server Error\nhandler sent no response",
                );
            }
            Outcome::Sent => {}
        }
    }

    /// Answers a request that could not be parsed and gives up on the
    /// connection.
    async fn reject(&mut self, err: ParseError) -> anyhow::Result<()> {
        warn!(error = %err, "rejecting request");

        let status = match err {
            ParseError::TooLarge => StatusCode::PayloadTooLarge,
            _ => StatusCode::BadRequest,
        };

        let mut res = self.app.responses().acquire();
        res.version.push_str(HTTP_VERSION);
        res.error(status, format!("Cannot Proceed\n{}: {err}", status.reason_phrase()));
        res.header("Connection", "close");
        let written = self.write_response(&mut res).await;
        self.app.responses().release(res);
        written
    }

    async fn write_response(&mut self, res: &mut Response) -> anyhow::Result<()> {
        res.finalize(&self.app.settings().name);
        ResponseWriter::new(res).write_to_stream(&mut self.stream).await
    }
}
