//! Proxy source reading one proxy URI per line

use crate::error::SourceError;
use crate::proxy::diagnostics::Diagnostics;
use crate::proxy::models::{ProxyDescriptor, ProxyScheme};
use futures::stream::{self, Stream};
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Split};
use url::Url;

/// Parse a single proxy line
///
/// Supports formats:
/// - http://HOST[:PORT] and https://HOST[:PORT] (forward proxy)
/// - socks://HOST[:PORT] and socks5://HOST[:PORT] (SOCKS5 tunnel)
///
/// Returns `Ok(None)` for blank lines and `#` comments.
pub fn parse_line(line: &str) -> Result<Option<ProxyDescriptor>, SourceError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let url = Url::parse(line).map_err(|source| SourceError::InvalidUri {
        line: line.to_string(),
        source,
    })?;

    let scheme = ProxyScheme::from_uri_scheme(url.scheme())
        .ok_or_else(|| SourceError::UnsupportedScheme(url.scheme().to_string()))?;

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host,
        _ => return Err(SourceError::MissingHost(line.to_string())),
    };

    Ok(Some(ProxyDescriptor::new(scheme, host, url.port())))
}

/// Lazy, non-restartable sequence of proxies read from a line-oriented input
///
/// Bad lines, including ones that are not UTF-8, are reported and skipped.
/// Only an I/O error ends the sequence early.
pub struct ProxySource<R> {
    lines: Split<R>,
    line_no: usize,
    finished: bool,
    diagnostics: Arc<dyn Diagnostics>,
}

impl ProxySource<BufReader<File>> {
    /// Open a proxy list file
    pub async fn open<P: AsRef<Path>>(
        path: P,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> std::io::Result<Self> {
        let file = File::open(path).await?;
        Ok(Self::new(BufReader::new(file), diagnostics))
    }
}

impl<R: AsyncBufRead + Unpin> ProxySource<R> {
    pub fn new(reader: R, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            lines: reader.split(b'\n'),
            line_no: 0,
            finished: false,
            diagnostics,
        }
    }

    /// Next valid proxy, or `None` once the input is exhausted
    pub async fn next(&mut self) -> Option<ProxyDescriptor> {
        while !self.finished {
            match self.lines.next_segment().await {
                Ok(Some(mut raw)) => {
                    self.line_no += 1;
                    if raw.last() == Some(&b'\r') {
                        raw.pop();
                    }
                    match String::from_utf8(raw) {
                        Ok(line) => match parse_line(&line) {
                            Ok(Some(proxy)) => return Some(proxy),
                            Ok(None) => {}
                            Err(e) => self.diagnostics.skipped_line(self.line_no, &line, &e),
                        },
                        Err(e) => {
                            let line = String::from_utf8_lossy(e.as_bytes()).into_owned();
                            let e = SourceError::NotUtf8(e);
                            self.diagnostics.skipped_line(self.line_no, &line, &e);
                        }
                    }
                }
                Ok(None) => self.finished = true,
                Err(e) => {
                    self.diagnostics.read_failed(&e);
                    self.finished = true;
                }
            }
        }
        None
    }

    /// Turn the source into a stream for the dispatcher
    pub fn into_stream(self) -> impl Stream<Item = ProxyDescriptor> {
        stream::unfold(self, |mut source| async move {
            source.next().await.map(|proxy| (proxy, source))
        })
    }
}
