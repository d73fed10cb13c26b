//! Backing stores the sample tools read and write
//!
//! Each store is a trait so the samples can run against the in-memory
//! implementations here or against a real service. Writes are not transactional.

pub mod calendar;
pub mod drive;
pub mod restaurants;
pub mod spreadsheet;

use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use calendar::{Calendar, InMemoryCalendar};
use drive::{Drive, DriveFile, InMemoryDrive};
use restaurants::{InMemoryRestaurants, Restaurant, RestaurantDirectory};
use spreadsheet::{InMemorySpreadsheet, Row, Spreadsheet};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Folder '{0}' not found")]
    FolderNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("Sheet '{0}' already exists")]
    SheetExists(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Initial content for the in-memory stores
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
    /// Folder name to the files it contains
    pub folders: BTreeMap<String, Vec<DriveFile>>,
    /// Sheet name to its rows, header first
    pub sheets: BTreeMap<String, Vec<Row>>,
    pub restaurants: Vec<Restaurant>,
}

/// The stores shared by every sample
#[derive(Clone)]
pub struct Stores {
    pub drive: Arc<dyn Drive>,
    pub sheets: Arc<dyn Spreadsheet>,
    pub calendar: Arc<dyn Calendar>,
    pub restaurants: Arc<dyn RestaurantDirectory>,
}

impl Stores {
    /// Empty in-memory stores
    pub fn in_memory() -> Self {
        Self::from_seed(SeedData::default())
    }

    pub fn from_seed(seed: SeedData) -> Self {
        let drive = InMemoryDrive::new();
        for (folder, files) in seed.folders {
            drive.add_folder(&folder);
            for file in files {
                drive.add_file(&folder, file);
            }
        }

        let sheets = seed
            .sheets
            .into_iter()
            .fold(InMemorySpreadsheet::new(), |sheets, (name, rows)| {
                sheets.with_sheet(name, rows)
            });

        Self {
            drive: Arc::new(drive),
            sheets: Arc::new(sheets),
            calendar: Arc::new(InMemoryCalendar::new()),
            restaurants: Arc::new(InMemoryRestaurants::new(seed.restaurants)),
        }
    }

    /// Load seed data from a JSON file
    pub fn load_seed<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let seed: SeedData = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid seed file {}", path.display()))?;
        Ok(Self::from_seed(seed))
    }
}
