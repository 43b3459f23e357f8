// Ontology and annotation file retrieval

use crate::config::GobelConfig;
use flate2::read::GzDecoder;
use gobel_common::checksum::sha256_hex;
use reqwest::Client;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub type Result<T> = std::result::Result<T, DownloadError>;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("invalid download configuration: {0}")]
    Config(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decompression failed: {0}")]
    Decompression(String),
}

/// Fetches ontology and annotation files, caching them on disk
///
/// Resolution order for the ontology is local file, then cache, then one
/// network attempt. A download that fails is reported immediately rather
/// than retried; rerunning reuses whatever was already cached.
pub struct Downloader {
    client: Client,
    config: GobelConfig,
}

impl Downloader {
    pub fn new(config: GobelConfig) -> Result<Self> {
        config.validate().map_err(DownloadError::Config)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Downloader { client, config })
    }

    /// Fetch the OBO ontology file as text
    pub async fn fetch_ontology(&self, force: bool) -> Result<String> {
        if let Some(path) = &self.config.local_obo_path {
            info!("Loading ontology from local file: {}", path.display());
            let bytes = tokio::fs::read(path).await?;
            let text = text_from_bytes(&path.display().to_string(), bytes)?;
            info!("Loaded ontology: {} bytes ({} KB)", text.len(), text.len() / 1024);
            return Ok(text);
        }

        self.fetch_cached(&self.config.obo_url, force).await
    }

    /// Fetch a GAF annotation file as text
    ///
    /// `source` may be a URL or a path to a local file.
    pub async fn fetch_gaf(&self, source: &str, force: bool) -> Result<String> {
        let path = Path::new(source);
        if path.exists() {
            info!("Loading annotations from local file: {}", source);
            let bytes = tokio::fs::read(path).await?;
            return text_from_bytes(source, bytes);
        }

        self.fetch_cached(source, force).await
    }

    /// Path a URL would be cached at
    pub fn cache_path(&self, url: &str) -> PathBuf {
        self.config.cache_dir.join(cache_file_name(url))
    }

    async fn fetch_cached(&self, url: &str, force: bool) -> Result<String> {
        let cache_path = self.cache_path(url);

        if !force && cache_path.exists() {
            info!("Using cached file: {}", cache_path.display());
            return Ok(tokio::fs::read_to_string(&cache_path).await?);
        }

        let bytes = self.fetch_bytes(url).await?;
        info!(
            "Downloaded {}: {} bytes ({} KB), sha256 {}",
            url,
            bytes.len(),
            bytes.len() / 1024,
            sha256_hex(&bytes)
        );

        let text = text_from_bytes(url, bytes)?;

        if let Some(parent) = cache_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&cache_path, &text).await?;
        info!("Cached to {}", cache_path.display());

        Ok(text)
    }

    /// Single-attempt HTTP GET
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        info!("Downloading {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(DownloadError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Decode payload bytes into text, inflating gzip when present
///
/// Detection is by magic bytes rather than file extension so a compressed
/// payload served under a plain name still decodes.
fn text_from_bytes(source: &str, bytes: Vec<u8>) -> Result<String> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoder = GzDecoder::new(bytes.as_slice());
        let mut text = String::new();
        decoder
            .read_to_string(&mut text)
            .map_err(|e| DownloadError::Decompression(format!("{}: {}", source, e)))?;
        return Ok(text);
    }

    String::from_utf8(bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
}

/// Cache file name for a URL: final path segment, ".gz" stripped
fn cache_file_name(url: &str) -> String {
    let name = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .trim_end_matches(".gz");
    if name.is_empty() {
        "download.dat".to_string()
    } else {
        name.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const OBO_BODY: &str = "format-version: 1.2\n\n[Term]\nid: GO:0000001\nname: x\nnamespace: biological_process\n";

    fn gzip(data: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    fn test_downloader(server_uri: &str, cache_dir: &Path) -> Downloader {
        let config = GobelConfig::builder()
            .obo_url(format!("{}/obo/go-basic.obo", server_uri))
            .cache_dir(cache_dir)
            .timeout_secs(5)
            .build();
        Downloader::new(config).unwrap()
    }

    #[test]
    fn test_cache_file_name() {
        assert_eq!(
            cache_file_name("http://example.com/obo/go-basic.obo"),
            "go-basic.obo"
        );
        assert_eq!(
            cache_file_name("http://example.com/goa_human.gaf.gz"),
            "goa_human.gaf"
        );
        assert_eq!(cache_file_name("http://example.com/"), "example.com");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = GobelConfig::test_config();
        config.timeout_secs = 0;
        assert!(Downloader::new(config).is_err());
    }

    #[tokio::test]
    async fn test_download_and_cache_reuse() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/obo/go-basic.obo"))
            .respond_with(ResponseTemplate::new(200).set_body_string(OBO_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let downloader = test_downloader(&server.uri(), temp.path());

        let first = downloader.fetch_ontology(false).await.unwrap();
        assert_eq!(first, OBO_BODY);
        assert!(downloader
            .cache_path(&downloader.config.obo_url)
            .exists());

        // Second fetch is served from the cache; the mock allows one hit
        let second = downloader.fetch_ontology(false).await.unwrap();
        assert_eq!(second, OBO_BODY);
    }

    #[tokio::test]
    async fn test_force_bypasses_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/obo/go-basic.obo"))
            .respond_with(ResponseTemplate::new(200).set_body_string(OBO_BODY))
            .expect(2)
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let downloader = test_downloader(&server.uri(), temp.path());

        downloader.fetch_ontology(false).await.unwrap();
        downloader.fetch_ontology(true).await.unwrap();
    }

    #[tokio::test]
    async fn test_gzip_payload_is_inflated() {
        let server = MockServer::start().await;
        let body = "!gaf-version: 2.2\nUniProtKB\tP12345\tABC1\t\tGO:0000001\tPMID:1\tIDA\t\tP\tx\t\tprotein\ttaxon:9606\t20260101\tUniProt\t\t\n";
        Mock::given(method("GET"))
            .and(path("/goa_human.gaf.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(body)))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let downloader = test_downloader(&server.uri(), temp.path());

        let url = format!("{}/goa_human.gaf.gz", server.uri());
        let text = downloader.fetch_gaf(&url, false).await.unwrap();
        assert_eq!(text, body);

        // Cached copy is the inflated text
        let cached = std::fs::read_to_string(downloader.cache_path(&url)).unwrap();
        assert_eq!(cached, body);
    }

    #[tokio::test]
    async fn test_local_ontology_bypasses_network() {
        let temp = TempDir::new().unwrap();
        let obo_path = temp.path().join("local.obo");
        std::fs::write(&obo_path, OBO_BODY).unwrap();

        let config = GobelConfig::builder()
            .obo_url("http://127.0.0.1:1/unreachable.obo")
            .cache_dir(temp.path())
            .local_obo_path(&obo_path)
            .build();
        let downloader = Downloader::new(config).unwrap();

        let text = downloader.fetch_ontology(false).await.unwrap();
        assert_eq!(text, OBO_BODY);
    }

    #[tokio::test]
    async fn test_gaf_from_local_path() {
        let temp = TempDir::new().unwrap();
        let gaf_path = temp.path().join("local.gaf.gz");
        std::fs::write(&gaf_path, gzip("!gaf-version: 2.2\n")).unwrap();

        let config = GobelConfig::builder().cache_dir(temp.path()).build();
        let downloader = Downloader::new(config).unwrap();

        let text = downloader
            .fetch_gaf(gaf_path.to_str().unwrap(), false)
            .await
            .unwrap();
        assert_eq!(text, "!gaf-version: 2.2\n");
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/obo/go-basic.obo"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let downloader = test_downloader(&server.uri(), temp.path());

        let err = downloader.fetch_ontology(false).await.unwrap_err();
        match err {
            DownloadError::Status { status, .. } => assert_eq!(status, 404),
            other => panic!("expected Status error, got {:?}", other),
        }

        // Nothing was cached for the failed download
        assert!(!downloader
            .cache_path(&downloader.config.obo_url)
            .exists());
    }
}
