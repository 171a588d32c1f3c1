use crate::connection::{ConnStream, ConnectionStrategy};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rustls::client::{ServerCertVerified, ServerCertVerifier};
use rustls::{Certificate, ClientConfig, RootCertStore, ServerName};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

/// Accepts any server certificate. Used when `-r/--verify` is not set, to
/// mirror `boost::asio::ssl::verify_none`.
struct NoVerify;

impl ServerCertVerifier for NoVerify {
    fn verify_server_cert(
        &self,
        _end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: SystemTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }
}

pub fn build_client_config(verify: bool) -> Result<ClientConfig> {
    let mut roots = RootCertStore::empty();
    for cert in rustls_native_certs::load_native_certs().context("loading native CA certs")? {
        roots
            .add(&Certificate(cert.0))
            .context("adding native CA cert")?;
    }

    let mut config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    if !verify {
        config
            .dangerous()
            .set_certificate_verifier(Arc::new(NoVerify));
    }

    Ok(config)
}

pub struct TlsConnection {
    address: String,
    server_name: ServerName,
    connector: TlsConnector,
}

impl TlsConnection {
    pub fn new(host: &str, verify: bool) -> Result<Self> {
        let config = build_client_config(verify)?;
        let server_name = ServerName::try_from(host).context("invalid server name")?;
        Ok(TlsConnection {
            address: format!("{host}:443"),
            server_name,
            connector: TlsConnector::from(Arc::new(config)),
        })
    }
}

#[async_trait(?Send)]
impl ConnectionStrategy for TlsConnection {
    async fn connect(&self) -> Result<ConnStream> {
        let stream = TcpStream::connect(&self.address)
            .await
            .context("tcp connect")?;
        let tls = self
            .connector
            .connect(self.server_name.clone(), stream)
            .await
            .context("tls handshake")?;
        Ok(ConnStream::Tls(Box::new(tls)))
    }
}
