//! How a candidate's TCP byte stream gets established: direct, TLS-wrapped,
//! through a SOCKS5 proxy, or both.
//!
//! Each strategy is a small, pre-configured value (resolved proxy address,
//! TLS client config, etc.) rather than something re-parsed per connection;
//! [`ConnectionStrategy::connect`] is the only thing called once per
//! candidate.

pub mod plaintext;
pub mod socks5;
pub mod socks5_tls;
pub mod tls;

use anyhow::{Context, Result};
use async_trait::async_trait;
use enum_dispatch::enum_dispatch;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use tokio::io::{self, AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

pub use plaintext::PlaintextConnection;
pub use socks5::Socks5Connection;
pub use socks5_tls::Socks5TlsConnection;
pub use tls::TlsConnection;

#[async_trait(?Send)]
#[enum_dispatch]
pub trait ConnectionStrategy {
    async fn connect(&self) -> Result<ConnStream>;
}

#[enum_dispatch(ConnectionStrategy)]
pub enum Connection {
    Plaintext(PlaintextConnection),
    Tls(TlsConnection),
    Socks5(Socks5Connection),
    Socks5Tls(Socks5TlsConnection),
}

/// A connected byte stream, plaintext or TLS, ready for an HTTP/1.1
/// handshake over it.
pub enum ConnStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for ConnStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ConnStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            ConnStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ConnStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            ConnStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            ConnStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ConnStream::Plain(s) => Pin::new(s).poll_flush(cx),
            ConnStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ConnStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            ConnStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Splits `proxy` ("host:port") into its parts.
pub(crate) fn split_proxy_address(proxy: &str) -> Result<(&str, u16)> {
    let (host, port) = proxy
        .split_once(':')
        .context("proxy address does not contain a colon (:)")?;
    let port: u16 = port.parse().context("proxy port is not a valid number")?;
    Ok((host, port))
}

/// Runs the no-auth SOCKS5 negotiation and a CONNECT request for
/// `target_host:target_port` over an already-connected `stream`, returning
/// the 2-byte auth reply and the 10-byte CONNECT reply verbatim so each
/// caller can validate them.
pub(crate) async fn socks5_connect(
    stream: &mut TcpStream,
    target_host: &str,
    target_port: u16,
) -> Result<([u8; 2], [u8; 10])> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    stream
        .write_all(&[0x05, 0x01, 0x00])
        .await
        .context("proxy write auth")?;

    let mut auth_response = [0u8; 2];
    stream
        .read_exact(&mut auth_response)
        .await
        .context("proxy read auth")?;

    if auth_response[0] != 5 {
        anyhow::bail!("SOCKS version {} not supported.", auth_response[0]);
    }
    if auth_response[1] != 0 {
        anyhow::bail!("SOCKS authentication {} not supported.", auth_response[1]);
    }

    let mut connect_request = vec![0x05, 0x01, 0x00, 0x03, target_host.len() as u8];
    connect_request.extend_from_slice(target_host.as_bytes());
    connect_request.push((target_port >> 8) as u8);
    connect_request.push((target_port & 0xff) as u8);
    stream
        .write_all(&connect_request)
        .await
        .context("proxy connection")?;

    let mut connect_response = [0u8; 10];
    stream
        .read_exact(&mut connect_response)
        .await
        .context("proxy read")?;

    Ok((auth_response, connect_response))
}
