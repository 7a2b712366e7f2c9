//! Blocking retrieval of remote rule files.
//!
//! `http`/`https` URLs go through `reqwest`; `file` URLs are copied from the
//! local filesystem.

use std::fs::File;
use std::path::Path;

use reqwest::blocking::Client;
use reqwest::{Proxy, Url};
use tracing::debug;

use crate::config::Settings;
use crate::error::DownloadError;

/// How a fetch should reach the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Connect directly, ignoring any proxy.
    Direct,
    /// Route through the configured proxy (or the system proxy when none is
    /// configured) and honour `proxy.accept_invalid_certs`.
    Relaxed,
}

pub struct Downloader<'a> {
    settings: &'a Settings,
}

impl<'a> Downloader<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Fetch `url` into `dest`, overwriting it.
    pub fn fetch_file(&self, url: &str, dest: &Path, mode: FetchMode) -> Result<(), DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::InvalidUrl(url.to_string()))?;
        debug!("Fetching {} ({:?})", url, mode);

        if parsed.scheme().eq_ignore_ascii_case("file") {
            let source = parsed
                .to_file_path()
                .map_err(|_| DownloadError::InvalidUrl(url.to_string()))?;
            std::fs::copy(&source, dest).map_err(|source_err| DownloadError::Io {
                path: source,
                source: source_err,
            })?;
            return Ok(());
        }

        let client = self.client(mode).map_err(|source| DownloadError::Http {
            url: url.to_string(),
            source,
        })?;

        let mut response = client
            .get(parsed)
            .header("User-Agent", concat!("evidence-engine/", env!("CARGO_PKG_VERSION")))
            .send()
            .map_err(|source| DownloadError::Http {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let mut out = File::create(dest).map_err(|source| DownloadError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
        response
            .copy_to(&mut out)
            .map_err(|source| DownloadError::Http {
                url: url.to_string(),
                source,
            })?;
        Ok(())
    }

    fn client(&self, mode: FetchMode) -> reqwest::Result<Client> {
        let builder = Client::builder().timeout(self.settings.download.timeout());
        let builder = match mode {
            FetchMode::Direct => builder.no_proxy(),
            FetchMode::Relaxed => {
                let proxy = &self.settings.proxy;
                let builder = builder.danger_accept_invalid_certs(proxy.accept_invalid_certs);
                match proxy.url.as_deref() {
                    Some(proxy_url) => {
                        let mut p = Proxy::all(proxy_url)?;
                        if let Some(user) = proxy.username.as_deref() {
                            p = p.basic_auth(user, proxy.password.as_deref().unwrap_or(""));
                        }
                        builder.proxy(p)
                    }
                    None => builder,
                }
            }
        };
        builder.build()
    }
}
