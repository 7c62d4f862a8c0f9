//! Byte Source: raw encoded bytes from a local file or a remote URL.

use std::path::PathBuf;

use log::{debug, trace};

use crate::error::{Error, Result};

/// Size of the chunks a remote body is read in.
pub const CHUNK_SIZE: usize = 16 * 1024;

/// Upper bound on the buffer reserved up front from a response's Content-Length.
/// The header is untrusted; bodies larger than this grow as they arrive.
#[cfg(feature = "remote")]
const MAX_RESERVE: u64 = 64 * CHUNK_SIZE as u64;

/// Where an image's bytes come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Locator {
    Local(PathBuf),
    Remote(String),
}

impl Locator {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Locator::Local(path.into())
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Locator::Remote(url.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Locator::Local(path) => path.as_os_str().is_empty(),
            Locator::Remote(url) => url.is_empty(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Locator::Remote(_))
    }
}

/// Reads the whole image named by `locator` into memory.
///
/// No retries and no resume: any failure is returned as is.
pub fn fetch(locator: &Locator) -> Result<Vec<u8>> {
    match locator {
        Locator::Local(path) => {
            debug!("reading {}", path.display());
            let bytes = std::fs::read(path).map_err(|source| Error::Read { path: path.clone(), source })?;
            trace!("read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes)
        }
        Locator::Remote(url) => fetch_remote(url),
    }
}

#[cfg(feature = "remote")]
fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    use std::io::Read;

    let fetch_err = |source| Error::Fetch { url: url.to_owned(), source };

    debug!("fetching {url}");
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(fetch_err)?;
    let mut response = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(fetch_err)?;

    let reserve = response.content_length().unwrap_or(0).min(MAX_RESERVE);
    let mut bytes = Vec::with_capacity(reserve as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let read = response
            .read(&mut chunk)
            .map_err(|source| Error::Download { url: url.to_owned(), source })?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
    }

    trace!("downloaded {} bytes from {url}", bytes.len());
    Ok(bytes)
}

#[cfg(not(feature = "remote"))]
fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    Err(Error::RemoteDisabled { url: url.to_owned() })
}
