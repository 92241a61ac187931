#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pdfshelf::config::Config;
use pdfshelf::extract::{ExtractError, Extracted, TextExtractor};
use tempfile::TempDir;

/// Minimal valid PDF with one text line per page and an optional `/Title`.
/// Builds the body then the xref with correct byte offsets so both lopdf and
/// pdf-extract can parse it.
pub fn pdf_with_pages(title: Option<&str>, pages: &[&str]) -> Vec<u8> {
    assert!(!pages.is_empty());
    let mut objects: Vec<String> = Vec::new();

    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", 5 + 2 * i))
        .collect();
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages.len()
    ));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());
    objects.push(match title {
        Some(t) => format!("<< /Title ({}) /Producer (pdfshelf tests) >>", escape(t)),
        None => "<< /Producer (pdfshelf tests) >>".to_string(),
    });
    for (i, text) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R /Resources << /Font << /F1 3 0 R >> >> >>",
            6 + 2 * i
        ));
        let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", escape(text));
        objects.push(format!(
            "<< /Length {} >> stream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj {} endobj\n", i + 1, body).as_bytes());
    }
    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer << /Size {} /Root 1 0 R /Info 4 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );
    out
}

pub fn pdf_with_text(text: &str) -> Vec<u8> {
    pdf_with_pages(None, &[text])
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Temporary store directory plus a config rooted at it.
pub fn setup_store(files: &[(&str, Vec<u8>)]) -> (TempDir, Config) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("library");
    fs::create_dir_all(&root).unwrap();
    for (name, bytes) in files {
        fs::write(root.join(name), bytes).unwrap();
    }
    let config = Config::for_store(root);
    (tmp, config)
}

pub fn store_root(config: &Config) -> PathBuf {
    config.store.root.clone()
}

pub fn write_config(dir: &Path, root: &Path, bind: &str) -> PathBuf {
    let config_dir = dir.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let path = config_dir.join("shelf.toml");
    fs::write(
        &path,
        format!(
            "[store]\nroot = \"{}\"\n\n[server]\nbind = \"{}\"\n",
            root.display(),
            bind
        ),
    )
    .unwrap();
    path
}

/// Plain-text extractor that sleeps before every document.
pub struct SlowText(pub Duration);

impl TextExtractor for SlowText {
    fn extract(&self, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        std::thread::sleep(self.0);
        Ok(Extracted {
            text: String::from_utf8_lossy(bytes).to_string(),
            ..Default::default()
        })
    }
}

pub fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}
