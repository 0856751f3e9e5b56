use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Supplies the rendered text of one page. Stands in for the browser.
pub trait PageSource {
    fn fetch_text(&self, target: &str) -> Result<String>;
}

/// Captured page dumps on disk; `target` is a path relative to `root`.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    pub root: PathBuf,
}

impl PageSource for FileSource {
    fn fetch_text(&self, target: &str) -> Result<String> {
        let path = self.root.join(target);
        fs::read_to_string(&path).with_context(|| format!("read page dump {}", path.display()))
    }
}

/// Plain GET against a text-rendering endpoint.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build http client")?;
        Ok(Self { client })
    }
}

impl PageSource for HttpSource {
    fn fetch_text(&self, target: &str) -> Result<String> {
        let resp = self
            .client
            .get(target)
            .header(ACCEPT, "text/plain, text/html;q=0.9, */*;q=0.8")
            .send()
            .with_context(|| format!("page request failed: {target}"))?;
        let status = resp.status();
        let body = resp.text().context("failed reading page body")?;
        if !status.is_success() {
            let snippet = body
                .trim()
                .replace(['\n', '\r'], " ")
                .chars()
                .take(220)
                .collect::<String>();
            return Err(anyhow!("page http {}: {}", status, snippet));
        }
        Ok(body)
    }
}

/// URLs go over HTTP, anything else is read as a page dump.
pub fn source_for(target: &str, timeout: Duration) -> Result<Box<dyn PageSource>> {
    if target.starts_with("http://") || target.starts_with("https://") {
        Ok(Box::new(HttpSource::new(timeout)?))
    } else {
        Ok(Box::new(FileSource::default()))
    }
}
