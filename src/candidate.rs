use bytes::Bytes;

/// A single expanded URI, ready to be requested.
///
/// Kept as a thin wrapper rather than a bare `String` so actions and queries
/// have a stable place to hang per-request metadata later without changing
/// every call site's signature. `headers`/`body` mirror the original's
/// `std::map<string, string> headers` / `std::vector<char> contents`
/// placeholders — reserved for a future per-candidate request body or extra
/// header set, unused by the current HEAD/GET engines.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl Candidate {
    pub fn new(uri: String) -> Self {
        Candidate {
            uri,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn description(&self) -> &str {
        &self.uri
    }
}
