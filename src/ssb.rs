// 📥 SSB Classification Source - KLASS CSV snapshots → ClassificationRecord
//
// SSB publishes NUTS (version 2482) and STYRK (version 33) through the KLASS
// API as semicolon-separated CSV. Snapshots can also be read from a local
// file, which is how the CLI and offline deployments work.

use crate::classification::ClassificationRecord;
#[cfg(feature = "server")]
use crate::classification::{HierarchyQueryService, PublishOutcome, Scheme, SchemeRegistry};
#[cfg(feature = "server")]
use crate::error::ClassificationError;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
#[cfg(feature = "server")]
use tracing::{info, warn};

pub const SSB_BASE_URL: &str = "https://data.ssb.no/api/klass/v1/versions/";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open classification file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed classification CSV: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "server")]
    #[error("SSB request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("classification source {source_name} returned no records")]
    Empty { source_name: String },
}

impl SourceError {
    pub fn is_timeout(&self) -> bool {
        match self {
            #[cfg(feature = "server")]
            SourceError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

// ============================================================================
// CSV
// ============================================================================

/// Parse a KLASS CSV export. Columns are matched by header name; anything
/// beyond code/parentCode/level/name is ignored.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<ClassificationRecord>, SourceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in rdr.deserialize() {
        let record: ClassificationRecord = row?;
        records.push(record);
    }

    debug!(records = records.len(), "parsed classification CSV");
    Ok(records)
}

pub fn load_file(path: &Path) -> Result<Vec<ClassificationRecord>, SourceError> {
    let file = File::open(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let records = read_records(BufReader::new(file))?;
    if records.is_empty() {
        return Err(SourceError::Empty {
            source_name: path.display().to_string(),
        });
    }
    Ok(records)
}

// ============================================================================
// HTTP CLIENT
// ============================================================================

/// Raw HTTP access to the KLASS versions endpoint
#[cfg(feature = "server")]
#[derive(Debug, Clone)]
pub struct SsbClient {
    http: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "server")]
impl SsbClient {
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(SsbClient {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn version_url(&self, version: u32) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), version)
    }

    /// Fetch and parse one classification version
    pub async fn fetch_version(&self, version: u32) -> Result<Vec<ClassificationRecord>, SourceError> {
        let url = self.version_url(version);
        debug!(url = %url, "fetching classification version");

        let body = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/csv")
            .query(&[("csvSeparator", ";")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let records = read_records(body.as_bytes())?;
        if records.is_empty() {
            return Err(SourceError::Empty { source_name: url });
        }
        Ok(records)
    }
}

// ============================================================================
// SOURCES & REFRESH
// ============================================================================

/// Where a scheme's snapshot comes from
#[cfg(feature = "server")]
#[derive(Debug, Clone)]
pub enum ClassificationSource {
    File(PathBuf),
    Remote { client: SsbClient, version: u32 },
}

#[cfg(feature = "server")]
impl ClassificationSource {
    pub fn describe(&self) -> String {
        match self {
            ClassificationSource::File(path) => format!("file:{}", path.display()),
            ClassificationSource::Remote { version, .. } => format!("klass:{version}"),
        }
    }

    pub async fn load(&self) -> Result<Vec<ClassificationRecord>, SourceError> {
        match self {
            ClassificationSource::File(path) => load_file(path),
            ClassificationSource::Remote { client, version } => client.fetch_version(*version).await,
        }
    }
}

#[cfg(feature = "server")]
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("inconsistent classification data: {0}")]
    Build(#[from] ClassificationError),
}

/// Load `source`, build a new service off to the side, then publish it.
/// On any failure the registry keeps whatever it was serving before.
#[cfg(feature = "server")]
pub async fn refresh_scheme(
    registry: &SchemeRegistry,
    scheme: Scheme,
    source: &ClassificationSource,
) -> Result<PublishOutcome, RefreshError> {
    let origin = source.describe();
    info!(scheme = %scheme, source = %origin, "loading classification");

    let records = source.load().await?;
    let service = HierarchyQueryService::from_records(scheme, records, Some(origin))
        .inspect_err(|e| {
            if e.is_build_error() {
                warn!(scheme = %scheme, kind = e.kind(), error = %e, "rejected classification snapshot");
            }
        })?;

    Ok(registry.publish(service))
}
