//! CSV file persistence for the location list

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::book::{BookError, LocationBook};
use super::location::{LocationError, StoreLocation, DEFAULT_RADIUS_KM};

/// Column order of the data file
pub const CSV_HEADER: [&str; 8] = [
    "name",
    "address",
    "latitude",
    "longitude",
    "radius",
    "circleCenterLng",
    "circleCenterLat",
    "timestamp",
];

/// One raw row; every cell is text so older files with blanks still load
#[derive(Debug, Default, Serialize, Deserialize)]
struct CsvRow {
    #[serde(default)]
    name: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    latitude: String,
    #[serde(default)]
    longitude: String,
    #[serde(default)]
    radius: String,
    #[serde(rename = "circleCenterLng", default)]
    circle_center_lng: String,
    #[serde(rename = "circleCenterLat", default)]
    circle_center_lat: String,
    #[serde(default)]
    timestamp: String,
}

impl From<&StoreLocation> for CsvRow {
    fn from(location: &StoreLocation) -> Self {
        Self {
            name: location.name.clone(),
            address: location.address.clone(),
            latitude: location.latitude.to_string(),
            longitude: location.longitude.to_string(),
            radius: location.radius.to_string(),
            circle_center_lng: location
                .circle_center_lng
                .map(|v| v.to_string())
                .unwrap_or_default(),
            circle_center_lat: location
                .circle_center_lat
                .map(|v| v.to_string())
                .unwrap_or_default(),
            timestamp: location.timestamp.clone(),
        }
    }
}

impl CsvRow {
    /// Convert to a location, or explain why the row is unusable
    fn into_location(self) -> Result<StoreLocation, String> {
        let latitude = parse_cell(&self.latitude).ok_or("missing or invalid latitude")?;
        let longitude = parse_cell(&self.longitude).ok_or("missing or invalid longitude")?;
        let radius = if self.radius.trim().is_empty() {
            DEFAULT_RADIUS_KM
        } else {
            parse_cell(&self.radius).ok_or("invalid radius")?
        };

        let location = StoreLocation {
            name: self.name,
            address: self.address,
            latitude,
            longitude,
            radius,
            circle_center_lat: parse_cell(&self.circle_center_lat),
            circle_center_lng: parse_cell(&self.circle_center_lng),
            timestamp: self.timestamp,
        };

        location.validate().map_err(|e| e.to_string())?;
        Ok(location)
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Location store backed by a single CSV file
///
/// Every operation holds the same lock, so appends, rewrites and
/// read-modify-write cycles never interleave.
#[derive(Clone)]
pub struct CsvLocationStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl CsvLocationStore {
    /// Open the store, creating the directory and a header-only file if needed
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        if !path.exists() {
            write_rows(&path, &[])?;
            info!("Created data file {}", path.display());
        }

        Ok(Self {
            path,
            lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one location to the end of the file
    pub fn append(&self, location: &StoreLocation) -> Result<(), StoreError> {
        location.validate()?;
        let _guard = self.lock.lock();

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(CsvRow::from(location))?;
        writer.flush()?;

        debug!(name = %location.name, "Appended location");
        Ok(())
    }

    /// Read every usable row in file order
    pub fn load_all(&self) -> Result<Vec<StoreLocation>, StoreError> {
        let _guard = self.lock.lock();
        self.read_rows()
    }

    /// Replace the whole file with `locations`
    pub fn replace_all(&self, locations: &[StoreLocation]) -> Result<(), StoreError> {
        for location in locations {
            location.validate()?;
        }
        let _guard = self.lock.lock();
        write_rows(&self.path, locations)
    }

    /// Load the list, apply `f`, and write the result back if `f` succeeds
    pub fn modify<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut LocationBook) -> Result<T, StoreError>,
    {
        let _guard = self.lock.lock();

        let mut book = LocationBook::new(self.read_rows()?);
        let result = f(&mut book)?;

        let locations = book.into_inner();
        for location in &locations {
            location.validate()?;
        }
        write_rows(&self.path, &locations)?;

        Ok(result)
    }

    fn read_rows(&self) -> Result<Vec<StoreLocation>, StoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let mut locations = Vec::new();
        for (row_no, record) in reader.deserialize::<CsvRow>().enumerate() {
            let row = match record {
                Ok(row) => row,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    warn!(row = row_no + 1, error = %e, "Skipping undecodable row");
                    continue;
                }
            };
            let name = row.name.clone();
            match row.into_location() {
                Ok(location) => locations.push(location),
                Err(reason) => warn!(row = row_no + 1, %name, %reason, "Skipping unusable row"),
            }
        }

        Ok(locations)
    }
}

/// Write header plus rows to a temp file, then move it into place
///
/// The temp file lives next to the target so the final rename stays on one
/// filesystem; it is removed if anything fails before the rename.
fn write_rows(path: &Path, locations: &[StoreLocation]) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;

    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut tmp);
        writer.write_record(CSV_HEADER)?;
        for location in locations {
            writer.serialize(CsvRow::from(location))?;
        }
        writer.flush()?;
    }

    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Invalid(#[from] LocationError),

    #[error(transparent)]
    Book(#[from] BookError),
}
