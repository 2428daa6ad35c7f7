//! Discovery of downloadable files on an HTML directory-listing page.

use regex::Regex;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, warn};
use url::Url;

use crate::http;
use crate::utils::file_name_from_url;

/// A file link found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    /// Local file name.
    pub name: String,
    pub url: String,
}

/// Files of one listing page, resolved lazily as the iterator is consumed.
///
/// Each local name is yielded once; later links mapping to a name already
/// seen are skipped so they cannot overwrite an earlier download.
#[derive(Debug)]
pub struct Listing {
    base: Option<Url>,
    hrefs: std::vec::IntoIter<String>,
    seen: HashSet<String>,
}

impl Listing {
    pub fn empty() -> Self {
        Self {
            base: None,
            hrefs: Vec::new().into_iter(),
            seen: HashSet::new(),
        }
    }

    pub fn from_html(base_url: &str, html: &str) -> Self {
        Self {
            base: directory_url(base_url),
            hrefs: extract_hrefs(html).into_iter(),
            seen: HashSet::new(),
        }
    }
}

impl Iterator for Listing {
    type Item = ListedFile;

    fn next(&mut self) -> Option<ListedFile> {
        let base = self.base.as_ref()?;
        for href in self.hrefs.by_ref() {
            if !is_file_link(&href) {
                continue;
            }
            let Ok(url) = base.join(&href) else {
                debug!(href = %href, "skipping unresolvable link");
                continue;
            };
            let Some(name) = file_name_from_url(&url) else {
                continue;
            };
            if !self.seen.insert(name.clone()) {
                warn!(%url, name = %name, "skipping link with duplicate local name");
                continue;
            }
            return Some(ListedFile {
                name,
                url: url.to_string(),
            });
        }
        None
    }
}

pub struct DirectoryLister {
    client: Client,
}

impl DirectoryLister {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches `url` and lists the files it links to.
    ///
    /// An unreachable or failing page is logged and yields an empty listing.
    pub async fn list(&self, url: &str) -> Listing {
        let response = match http::get(&self.client, url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, "listing page unreachable: {}", e);
                return Listing::empty();
            }
        };

        if !response.status().is_success() {
            warn!(url, status = %response.status(), "listing page returned an error status");
            return Listing::empty();
        }

        match response.text().await {
            Ok(html) => Listing::from_html(url, &html),
            Err(e) => {
                warn!(url, "failed to read listing page: {}", e);
                Listing::empty()
            }
        }
    }
}

/// `href` values of every `<a>` element, in document order.
pub fn extract_hrefs(html: &str) -> Vec<String> {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    let anchor = ANCHOR.get_or_init(|| {
        Regex::new(r#"(?is)<a\s[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
            .expect("anchor pattern is valid")
    });

    anchor
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| m.as_str().trim().replace("&amp;", "&"))
        .collect()
}

/// Whether `href` points at a file rather than a sort link, anchor or directory.
pub fn is_file_link(href: &str) -> bool {
    !(href.is_empty() || href.starts_with('?') || href.starts_with('#') || href.ends_with('/'))
}

// Links are relative to the listing itself, so its URL must end in a slash.
fn directory_url(url: &str) -> Option<Url> {
    let mut url = Url::parse(url.trim()).ok()?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Some(url)
}
