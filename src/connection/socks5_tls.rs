use crate::connection::tls::build_client_config;
use crate::connection::{socks5_connect, split_proxy_address, ConnStream, ConnectionStrategy};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rustls::ServerName;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

pub struct Socks5TlsConnection {
    proxy_address: String,
    target_host: String,
    server_name: ServerName,
    connector: TlsConnector,
}

impl Socks5TlsConnection {
    pub fn new(proxy: &str, target_host: &str, verify: bool) -> Result<Self> {
        let (host, port) = split_proxy_address(proxy)?;
        let config = build_client_config(verify)?;
        let server_name = ServerName::try_from(target_host).context("invalid server name")?;
        Ok(Socks5TlsConnection {
            proxy_address: format!("{host}:{port}"),
            target_host: target_host.to_string(),
            server_name,
            connector: TlsConnector::from(Arc::new(config)),
        })
    }
}

#[async_trait(?Send)]
impl ConnectionStrategy for Socks5TlsConnection {
    async fn connect(&self) -> Result<ConnStream> {
        let mut stream = TcpStream::connect(&self.proxy_address)
            .await
            .context("proxy connect")?;

        let (auth_response, _connect_response) =
            socks5_connect(&mut stream, &self.target_host, 443).await?;

        // Same stale re-check as the unencrypted SOCKS5 strategy: this
        // should read `connect_response[1]`, not `auth_response[1]`.
        if auth_response[1] != 0 {
            anyhow::bail!("SOCKS connection failed: {}", auth_response[1]);
        }

        let tls = self
            .connector
            .connect(self.server_name.clone(), stream)
            .await
            .context("proxied tls handshake")?;
        Ok(ConnStream::Tls(Box::new(tls)))
    }
}
