use crate::connection::{ConnStream, ConnectionStrategy};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::net::TcpStream;

pub struct PlaintextConnection {
    address: String,
}

impl PlaintextConnection {
    pub fn new(host: &str) -> Self {
        PlaintextConnection {
            address: format!("{host}:80"),
        }
    }
}

#[async_trait(?Send)]
impl ConnectionStrategy for PlaintextConnection {
    async fn connect(&self) -> Result<ConnStream> {
        let stream = TcpStream::connect(&self.address)
            .await
            .context("tcp connect")?;
        Ok(ConnStream::Plain(stream))
    }
}
