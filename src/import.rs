// =============================================================================
// CN DASHBOARD — import.rs
// Statistics ingestion: download → unzip → pipe-delimited rows → records
// =============================================================================
//
// The game publishes nation and war statistics as pipe-delimited text with a
// header row, zipped. Columns are looked up by header name so the order of
// columns in the published files does not matter.
//
//   Nations: Nation ID | Ruler | Nation | Alliance | Alliance ID | Strength |
//            Technology | Infrastructure | Land | Nuclear Weapons | Activity |
//            Government | War Mode | Rank
//   Wars:    War ID | Declaring ID | Declaring Alliance ID | Receiving ID |
//            Receiving Alliance ID | War Status
// =============================================================================

use crate::config::SourceConfig;
use crate::nation::{parse_game_number, Nation, War};
use crate::snapshot::Snapshot;
use bytes::Bytes;
use rand::Rng;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use thiserror::Error;
use tokio::time::{sleep, Duration};

pub const DOWNLOAD_TIMEOUT_SECS: u64 = 60;
pub const RETRY_BASE_DELAY_MS: u64 = 500;
pub const RETRY_JITTER_MS: u64 = 250;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column '{0}'")]
    MissingColumn(&'static str),
    #[error("archive has no .txt entry")]
    EmptyArchive,
    #[error("no {0} source configured")]
    NoSource(&'static str),
    #[error("download of {url} failed after {attempts} attempts: {message}")]
    Download {
        url: String,
        attempts: u32,
        message: String,
    },
}

// -----------------------------------------------------------------------------
// Column lookup
// -----------------------------------------------------------------------------

struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_ascii_lowercase(), i))
            .collect();
        Columns { index }
    }

    /// First of `names` present in the header row.
    fn find(&self, names: &[&str]) -> Option<usize> {
        names
            .iter()
            .find_map(|n| self.index.get(&n.to_ascii_lowercase()).copied())
    }

    fn require(&self, names: &[&'static str]) -> Result<usize, ImportError> {
        self.find(names).ok_or(ImportError::MissingColumn(names[0]))
    }
}

fn field<'a>(record: &'a csv::StringRecord, col: Option<usize>) -> &'a str {
    col.and_then(|i| record.get(i)).map(str::trim).unwrap_or("")
}

fn parse_id(raw: &str) -> Option<u64> {
    raw.replace(',', "").trim().parse::<u64>().ok()
}

fn parse_count(raw: &str) -> u32 {
    parse_game_number(raw).max(0.0) as u32
}

fn parse_war_mode(raw: &str) -> bool {
    let raw = raw.to_ascii_lowercase();
    if raw.contains("peace") {
        return false;
    }
    raw.contains("war") || matches!(raw.as_str(), "1" | "true" | "yes")
}

fn pipe_reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes())
}

// -----------------------------------------------------------------------------
// Row parsing
// -----------------------------------------------------------------------------

pub fn parse_nations(text: &str) -> Result<Vec<Nation>, ImportError> {
    let mut reader = pipe_reader(text);
    let cols = Columns::from_headers(reader.headers()?);

    let id_col = cols.require(&["Nation ID", "NationID"])?;
    let ruler = cols.find(&["Ruler", "Ruler Name"]);
    let name = cols.find(&["Nation", "Nation Name"]);
    let alliance = cols.find(&["Alliance", "Alliance Name"]);
    let alliance_id = cols.find(&["Alliance ID", "AllianceID"]);
    let strength = cols.find(&["Strength", "Nation Strength"]);
    let technology = cols.find(&["Technology"]);
    let infrastructure = cols.find(&["Infrastructure"]);
    let land = cols.find(&["Land", "Area"]);
    let nukes = cols.find(&["Nuclear Weapons", "Nukes"]);
    let activity = cols.find(&["Activity"]);
    let government = cols.find(&["Government", "Government Type"]);
    let war_mode = cols.find(&["War Mode", "War/Peace"]);
    let rank = cols.find(&["Rank"]);

    let mut nations = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        let Some(id) = parse_id(field(&record, Some(id_col))) else {
            skipped += 1;
            continue;
        };
        nations.push(Nation {
            id,
            name: field(&record, name).to_string(),
            ruler: field(&record, ruler).to_string(),
            alliance: field(&record, alliance).to_string(),
            alliance_id: parse_id(field(&record, alliance_id)).unwrap_or(0),
            strength: parse_game_number(field(&record, strength)),
            technology: field(&record, technology).to_string(),
            infrastructure: field(&record, infrastructure).to_string(),
            land: field(&record, land).to_string(),
            nuclear_weapons: parse_count(field(&record, nukes)),
            activity: field(&record, activity).to_string(),
            government_type: field(&record, government).to_string(),
            in_war_mode: parse_war_mode(field(&record, war_mode)),
            rank: parse_id(field(&record, rank))
                .filter(|r| *r > 0)
                .and_then(|r| u32::try_from(r).ok()),
        });
    }

    if skipped > 0 {
        log::warn!("nation import: skipped {} rows without a valid id", skipped);
    }
    log::info!("nation import: {} nations parsed", nations.len());
    Ok(nations)
}

pub fn parse_wars(text: &str) -> Result<Vec<War>, ImportError> {
    let mut reader = pipe_reader(text);
    let cols = Columns::from_headers(reader.headers()?);

    let war_id = cols.find(&["War ID", "WarID"]);
    let declaring = cols.require(&["Declaring ID", "Declaring Nation ID"])?;
    let receiving = cols.require(&["Receiving ID", "Receiving Nation ID"])?;
    let declaring_alliance = cols.find(&["Declaring Alliance ID"]);
    let receiving_alliance = cols.find(&["Receiving Alliance ID"]);
    let status = cols.find(&["War Status", "Status"]);

    let mut wars = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        let ids = parse_id(field(&record, Some(declaring)))
            .zip(parse_id(field(&record, Some(receiving))));
        let Some((declaring_id, receiving_id)) = ids else {
            skipped += 1;
            continue;
        };
        wars.push(War {
            war_id: parse_id(field(&record, war_id)).unwrap_or(0),
            declaring_id,
            receiving_id,
            declaring_alliance_id: parse_id(field(&record, declaring_alliance)).unwrap_or(0),
            receiving_alliance_id: parse_id(field(&record, receiving_alliance)).unwrap_or(0),
            status: field(&record, status).to_string(),
        });
    }

    if skipped > 0 {
        log::warn!("war import: skipped {} rows without valid nation ids", skipped);
    }
    log::info!(
        "war import: {} wars parsed ({} active)",
        wars.len(),
        wars.iter().filter(|w| w.is_active()).count()
    );
    Ok(wars)
}

// -----------------------------------------------------------------------------
// Archives
// -----------------------------------------------------------------------------

/// Text of the first `.txt` entry of a ZIP archive.
pub fn read_archive(data: Bytes) -> Result<String, ImportError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    log::debug!("archive contains {} files", archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if !file.is_file() || !file.name().to_ascii_lowercase().ends_with(".txt") {
            continue;
        }
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        log::debug!("read {} ({} bytes)", file.name(), content.len());
        return Ok(String::from_utf8_lossy(&content).into_owned());
    }
    Err(ImportError::EmptyArchive)
}

/// ZIP payloads are unpacked; anything else is taken as the text itself.
pub fn decode_source(data: Bytes) -> Result<String, ImportError> {
    if data.starts_with(b"PK") {
        read_archive(data)
    } else {
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

pub async fn fetch_archive(url: &str, attempts: u32) -> Result<Bytes, ImportError> {
    let attempts = attempts.max(1);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .build()
        .map_err(|e| ImportError::Download {
            url: url.to_string(),
            attempts: 0,
            message: e.to_string(),
        })?;

    let mut last_error = String::new();
    for attempt in 1..=attempts {
        log::info!("download {} (attempt {}/{})", url, attempt, attempts);
        let result = match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => resp.bytes().await.map_err(|e| e.to_string()),
            Ok(resp) => Err(format!("HTTP {}", resp.status())),
            Err(e) => Err(e.to_string()),
        };
        match result {
            Ok(data) => {
                log::info!("downloaded {} bytes from {}", data.len(), url);
                return Ok(data);
            }
            Err(e) => {
                log::warn!("download {} failed: {}", url, e);
                last_error = e;
            }
        }
        if attempt < attempts {
            let jitter = rand::thread_rng().gen_range(0..RETRY_JITTER_MS);
            let delay = RETRY_BASE_DELAY_MS * 2u64.pow(attempt - 1) + jitter;
            sleep(Duration::from_millis(delay)).await;
        }
    }

    Err(ImportError::Download {
        url: url.to_string(),
        attempts,
        message: last_error,
    })
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Text of a source that is either a local path or an http(s) URL.
pub async fn load_source(source: &str, attempts: u32) -> Result<String, ImportError> {
    let data = if is_url(source) {
        fetch_archive(source, attempts).await?
    } else {
        Bytes::from(tokio::fs::read(source).await?)
    };
    decode_source(data)
}

pub async fn load_snapshot(sources: &SourceConfig) -> Result<Snapshot, ImportError> {
    let nations_src = sources.nations.as_deref().ok_or(ImportError::NoSource("nations"))?;
    let wars_src = sources.wars.as_deref().ok_or(ImportError::NoSource("wars"))?;

    let nations = parse_nations(&load_source(nations_src, sources.download_attempts).await?)?;
    let wars = parse_wars(&load_source(wars_src, sources.download_attempts).await?)?;
    Ok(Snapshot::new(nations, wars))
}
