//! A seekable view over a remote byte-addressable resource, fetched via HTTP Range
//! requests with a single-line read-ahead cache.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;

use crate::error::Error;
use crate::fetch::Fetch;

const INIT_PROBE_LEN: u64 = 256 * 1024;
const MIN_READ_AHEAD: u64 = 32 * 1024;

struct CacheLine {
    offset: u64,
    data: Bytes,
}

impl CacheLine {
    fn covers(&self, offset: u64, length: u64) -> bool {
        offset >= self.offset && offset + length <= self.offset + self.data.len() as u64
    }

    fn slice(&self, offset: u64, length: u64) -> Bytes {
        let start = (offset - self.offset) as usize;
        self.data.slice(start..start + length as usize)
    }
}

/// A seekable view over `url`, backed by HTTP Range requests.
pub struct RangeReader {
    url: String,
    fetch: std::sync::Arc<dyn Fetch>,
    extra_headers: HashMap<String, String>,
    file_size: u64,
    full_buffer: Option<Bytes>,
    cache: Mutex<Option<CacheLine>>,
    verbose: bool,
    bytes_downloaded: AtomicU64,
    request_count: AtomicU64,
}

impl RangeReader {
    /// Probe `url`, confirming Range support (or falling back to a full download when
    /// `allow_full_download` is set), and return an initialized reader.
    pub async fn open(
        url: &str,
        fetch: std::sync::Arc<dyn Fetch>,
        extra_headers: HashMap<String, String>,
        allow_full_download: bool,
        verbose: bool,
    ) -> crate::Result<Self> {
        let mut headers = extra_headers.clone();
        headers.insert(
            "Range".to_string(),
            format!("bytes=0-{}", INIT_PROBE_LEN - 1),
        );
        let resp = fetch
            .get(url, &headers)
            .await
            .map_err(Error::Fetch)?;

        match resp.status {
            206 => {
                let file_size = parse_content_range(resp.headers.get("content-range"))
                    .ok_or_else(|| Error::Transport {
                        offset: 0,
                        end: INIT_PROBE_LEN,
                        status: Some(206),
                        message: "missing or unparsable Content-Range header".to_string(),
                    })?;
                if verbose {
                    log::info!(
                        "mkv-subtitles: range requests supported, file size {file_size} bytes"
                    );
                }
                let reader = Self {
                    url: url.to_string(),
                    fetch,
                    extra_headers,
                    file_size,
                    full_buffer: None,
                    cache: Mutex::new(Some(CacheLine {
                        offset: 0,
                        data: resp.body.clone(),
                    })),
                    verbose,
                    bytes_downloaded: AtomicU64::new(resp.body.len() as u64),
                    request_count: AtomicU64::new(1),
                };
                Ok(reader)
            }
            200 => {
                if !allow_full_download {
                    return Err(Error::RangeNotSupported {
                        url: url.to_string(),
                    });
                }
                if verbose {
                    log::info!(
                        "mkv-subtitles: range requests unsupported, fell back to full download ({} bytes)",
                        resp.body.len()
                    );
                }
                let file_size = resp.body.len() as u64;
                Ok(Self {
                    url: url.to_string(),
                    fetch,
                    extra_headers,
                    file_size,
                    full_buffer: Some(resp.body.clone()),
                    cache: Mutex::new(None),
                    verbose,
                    bytes_downloaded: AtomicU64::new(resp.body.len() as u64),
                    request_count: AtomicU64::new(1),
                })
            }
            status => Err(Error::Transport {
                offset: 0,
                end: INIT_PROBE_LEN,
                status: Some(status),
                message: format!("unexpected status probing {url}"),
            }),
        }
    }

    /// Total size of the remote resource, in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Total bytes downloaded so far.
    pub fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded.load(Ordering::Relaxed)
    }

    /// Total HTTP requests issued so far.
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Read `length` bytes starting at `offset`, using (and possibly replacing) the
    /// cache line. Not safe to call concurrently with itself; use
    /// [`RangeReader::read_uncached`] from worker tasks instead.
    pub async fn read(&self, offset: u64, length: u64) -> crate::Result<Bytes> {
        if let Some(buf) = &self.full_buffer {
            let end = (offset + length).min(buf.len() as u64);
            let start = offset.min(buf.len() as u64);
            return Ok(buf.slice(start as usize..end as usize));
        }

        {
            let cache = self.cache.lock().unwrap();
            if let Some(line) = cache.as_ref() {
                if line.covers(offset, length) {
                    if self.verbose {
                        log::debug!("mkv-subtitles: cache hit at {offset}..{}", offset + length);
                    }
                    return Ok(line.slice(offset, length));
                }
            }
        }

        let fetch_len = length.max(MIN_READ_AHEAD);
        let body = self.fetch_range(offset, fetch_len).await?;
        let result = body.slice(..(length.min(body.len() as u64) as usize));
        *self.cache.lock().unwrap() = Some(CacheLine {
            offset,
            data: body,
        });
        Ok(result)
    }

    /// Read `length` bytes starting at `offset`, always issuing a fresh request and
    /// never touching the shared cache line. Used by concurrent fetch workers, since the
    /// cache line is not safe to mutate from multiple tasks at once.
    pub async fn read_uncached(&self, offset: u64, length: u64) -> crate::Result<Bytes> {
        if let Some(buf) = &self.full_buffer {
            let end = (offset + length).min(buf.len() as u64);
            let start = offset.min(buf.len() as u64);
            return Ok(buf.slice(start as usize..end as usize));
        }
        self.fetch_range(offset, length).await
    }

    async fn fetch_range(&self, offset: u64, length: u64) -> crate::Result<Bytes> {
        let end = (offset + length).min(self.file_size).max(offset);
        let mut headers = self.extra_headers.clone();
        headers.insert(
            "Range".to_string(),
            format!("bytes={offset}-{}", end.saturating_sub(1).max(offset)),
        );
        if self.verbose {
            log::debug!("mkv-subtitles: cache miss, fetching {offset}..{end}");
        }
        let resp = self
            .fetch
            .get(&self.url, &headers)
            .await
            .map_err(Error::Fetch)?;
        self.request_count.fetch_add(1, Ordering::Relaxed);
        if resp.status != 206 {
            return Err(Error::Transport {
                offset,
                end,
                status: Some(resp.status),
                message: "expected 206 Partial Content on a ranged read".to_string(),
            });
        }
        self.bytes_downloaded
            .fetch_add(resp.body.len() as u64, Ordering::Relaxed);
        Ok(resp.body)
    }
}

/// Parses `bytes a-b/N` into `N`, the total resource size.
fn parse_content_range(header: Option<&String>) -> Option<u64> {
    let header = header?;
    let (_, after_unit) = header.split_once(' ')?;
    let (_, total) = after_unit.split_once('/')?;
    total.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_content_range_total() {
        assert_eq!(
            parse_content_range(Some(&"bytes 0-262143/10485760".to_string())),
            Some(10_485_760)
        );
        assert_eq!(parse_content_range(None), None);
        assert_eq!(parse_content_range(Some(&"garbage".to_string())), None);
    }

    #[test]
    fn cache_line_covers_exact_and_partial_ranges() {
        let line = CacheLine {
            offset: 100,
            data: Bytes::from_static(b"0123456789"),
        };
        assert!(line.covers(100, 10));
        assert!(line.covers(105, 5));
        assert!(!line.covers(105, 10));
        assert!(!line.covers(50, 10));
        assert_eq!(line.slice(105, 3), Bytes::from_static(b"567"));
    }

    struct StubFetch {
        data: Bytes,
        second_call_status: u16,
        call_count: AtomicU64,
    }

    #[async_trait::async_trait]
    impl crate::fetch::Fetch for StubFetch {
        async fn get(
            &self,
            _url: &str,
            _headers: &HashMap<String, String>,
        ) -> std::result::Result<crate::fetch::FetchResponse, Box<dyn std::error::Error + Send + Sync>>
        {
            let count = self.call_count.fetch_add(1, Ordering::Relaxed);
            if count == 0 {
                let mut headers = HashMap::new();
                headers.insert(
                    "content-range".to_string(),
                    format!("bytes 0-{}/{}", self.data.len() - 1, self.data.len()),
                );
                Ok(crate::fetch::FetchResponse {
                    status: 206,
                    headers,
                    body: self.data.clone(),
                })
            } else {
                Ok(crate::fetch::FetchResponse {
                    status: self.second_call_status,
                    headers: HashMap::new(),
                    body: self.data.clone(),
                })
            }
        }
    }

    #[tokio::test]
    async fn stray_200_on_later_read_is_rejected() {
        let fetch = std::sync::Arc::new(StubFetch {
            data: Bytes::from_static(b"0123456789"),
            second_call_status: 200,
            call_count: AtomicU64::new(0),
        });
        let reader = RangeReader::open("http://example.test/x", fetch, HashMap::new(), false, false)
            .await
            .unwrap();
        let err = reader.read_uncached(0, 5).await.unwrap_err();
        assert!(matches!(err, Error::Transport { status: Some(200), .. }));
    }
}
