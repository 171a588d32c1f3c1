//! Builds the one template request per run, then stamps out a fresh
//! [`Request`] per candidate from it.

use anyhow::Result;
use http_body_util::Empty;
use hyper::{header, Method, Request, Version};
use bytes::Bytes;

pub struct RequestWriter {
    host_header: String,
    user_agent: String,
    verbose: bool,
}

impl RequestWriter {
    pub fn new(host: &str, user_agent: &str, verbose: bool) -> Self {
        RequestWriter {
            host_header: host.to_string(),
            user_agent: user_agent.to_string(),
            verbose,
        }
    }

    pub fn build(&self, method: Method, target: &str) -> Result<Request<Empty<Bytes>>> {
        let request = Request::builder()
            .method(method)
            .uri(target)
            .version(Version::HTTP_11)
            .header(header::HOST, &self.host_header)
            .header(header::USER_AGENT, &self.user_agent)
            .body(Empty::<Bytes>::new())?;

        if self.verbose {
            println!("[ ] Payload for {target}: {request:?}");
        }
        Ok(request)
    }
}
