//! Native HTTP server implementation
//!
//! Accept loop on a tuned socket, one tokio task per connection, hyper's
//! HTTP/1.1 driver with keep-alive. Requests whose path is not the configured
//! route get a 404 before reaching the handler.

use crate::handler::{Handler, HandlerExt, Plaintext};
use crate::middleware::Compress;
use crate::request::from_hyper_request;
use crate::{Error, ListenConfig, Response, Result};
use bytes::Bytes;
use http::{HeaderName, HeaderValue};
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use socket2::{Domain, Protocol, Socket, Type};
use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

/// Build the handler stack described by the configuration
pub fn build_handler(config: &ListenConfig) -> Arc<dyn Handler> {
    if config.compression {
        Arc::new(Plaintext.wrap(Compress::new().level(config.compression_level)))
    } else {
        Arc::new(Plaintext)
    }
}

/// Create a TCP listen socket with optimizations
pub fn create_optimized_socket(addr: &SocketAddr, config: &ListenConfig) -> io::Result<Socket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // SO_REUSEADDR - allow binding to address in TIME_WAIT
    socket.set_reuse_address(true)?;

    // SO_REUSEPORT - let several processes share the port
    #[cfg(unix)]
    if config.reuse_port {
        socket.set_reuse_port(true)?;
    }

    socket.set_nonblocking(true)?;

    socket.bind(&(*addr).into())?;
    socket.listen(config.backlog.min(i32::MAX as u32) as i32)?;

    Ok(socket)
}

/// A bound listener plus the handler it dispatches to
pub struct Server {
    listener: TcpListener,
    config: Arc<ListenConfig>,
    handler: Arc<dyn Handler>,
}

impl Server {
    /// Bind the configured address with the handler stack from the config
    pub async fn bind(config: ListenConfig) -> Result<Self> {
        let handler = build_handler(&config);
        Self::bind_with_handler(config, handler).await
    }

    /// Bind the configured address and dispatch matching requests to `handler`
    pub async fn bind_with_handler(config: ListenConfig, handler: Arc<dyn Handler>) -> Result<Self> {
        config.validate()?;
        let addr = config.socket_addr()?;

        let socket = create_optimized_socket(&addr, &config)
            .map_err(|source| Error::Bind { addr, source })?;
        let listener = TcpListener::from_std(socket.into())?;

        tracing::info!(
            address = %listener.local_addr()?,
            route = %config.route,
            compression = config.compression,
            "Listening"
        );

        Ok(Self {
            listener,
            config: Arc::new(config),
            handler,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever
    pub async fn serve(self) -> Result<Infallible> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) if is_connection_error(&e) => {
                    tracing::debug!(error = %e, "accept failed");
                    continue;
                }
                Err(e) => {
                    // Usually EMFILE/ENFILE: the pending connection stays queued,
                    // so retrying immediately would spin.
                    tracing::warn!(error = %e, "accept failed, backing off");
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    continue;
                }
            };

            if self.config.nodelay {
                if let Err(e) = stream.set_nodelay(true) {
                    tracing::debug!(peer = %peer, error = %e, "set_nodelay failed");
                }
            }

            let config = self.config.clone();
            let handler = self.handler.clone();
            tokio::spawn(serve_connection(stream, peer, config, handler));
        }
    }
}

/// Bind the configured address and serve until the process is killed
pub async fn serve(config: ListenConfig) -> Result<Infallible> {
    Server::bind(config).await?.serve().await
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    config: Arc<ListenConfig>,
    handler: Arc<dyn Handler>,
) {
    let io = TokioIo::new(stream);
    let keep_alive = config.keep_alive;
    let service = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
        let res = dispatch(&config.route, handler.as_ref(), &req);
        async move { Ok::<_, Infallible>(res) }
    });

    if let Err(e) = http1::Builder::new()
        .timer(TokioTimer::new())
        .keep_alive(keep_alive)
        .title_case_headers(true)
        .serve_connection(io, service)
        .await
    {
        tracing::debug!(peer = %peer, error = %e, "connection closed with error");
    }
}

/// Route a request to the handler, or answer 404 for any other path
pub fn dispatch<B>(
    route: &str,
    handler: &dyn Handler,
    req: &hyper::Request<B>,
) -> hyper::Response<Full<Bytes>> {
    if req.uri().path() != route {
        return to_hyper_response(Response::not_found());
    }

    let request = from_hyper_request(req);
    to_hyper_response(handler.handle(&request))
}

/// Convert our Response to hyper Response
///
/// Headers that are not valid HTTP are dropped rather than failing the
/// response.
pub fn to_hyper_response(res: Response) -> hyper::Response<Full<Bytes>> {
    let mut response = hyper::Response::new(Full::new(res.body));
    *response.status_mut() = http::StatusCode::from_u16(res.status.as_u16())
        .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

    let headers = response.headers_mut();
    for (name, value) in res.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => tracing::debug!(header = %name, "dropping invalid response header"),
        }
    }

    response
}

/// Errors from `accept()` that only concern the connection being accepted
fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}
