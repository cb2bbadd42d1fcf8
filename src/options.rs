//! The library's sole configuration surface.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::fetch::{Fetch, ReqwestFetch};

/// Options controlling how [`crate::extract_subtitles`] fetches and parses a remote file.
pub struct Options {
    /// Allow falling back to an in-memory full download when the server does not honor
    /// Range requests. Default `false`.
    pub allow_full_download: bool,
    /// Case-insensitive language whitelist; `None` keeps every subtitle track.
    pub languages: Option<Vec<String>>,
    /// The injected HTTP capability. Defaults to a `reqwest`-backed client.
    pub fetch: Arc<dyn Fetch>,
    /// Extra headers merged into every request (the `Range` header is always
    /// reader-controlled).
    pub headers: HashMap<String, String>,
    /// Enable progress logging through the `log` facade. Default `false`.
    pub verbose: bool,
    /// Worker-pool size for the targeted block fetcher's batched reads. Default `1`
    /// (sequential).
    pub concurrency: NonZeroUsize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            allow_full_download: false,
            languages: None,
            fetch: Arc::new(ReqwestFetch::new()),
            headers: HashMap::new(),
            verbose: false,
            concurrency: NonZeroUsize::new(1).unwrap(),
        }
    }
}

impl Options {
    /// Start from the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Permit an in-memory full download when Range is unsupported.
    pub fn with_allow_full_download(mut self, allow: bool) -> Self {
        self.allow_full_download = allow;
        self
    }

    /// Restrict output to tracks whose language matches one of `languages`
    /// (case-insensitive).
    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = Some(languages);
        self
    }

    /// Use a caller-supplied HTTP capability instead of the default `reqwest` client.
    pub fn with_fetch(mut self, fetch: Arc<dyn Fetch>) -> Self {
        self.fetch = fetch;
        self
    }

    /// Merge extra headers into every request.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Enable progress logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the targeted fetcher's worker-pool size.
    pub fn with_concurrency(mut self, concurrency: NonZeroUsize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub(crate) fn language_allowed(&self, language: Option<&str>) -> bool {
        match &self.languages {
            None => true,
            Some(allowed) => match language {
                None => false,
                Some(lang) => allowed.iter().any(|l| l.eq_ignore_ascii_case(lang)),
            },
        }
    }
}
