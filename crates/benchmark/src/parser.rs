//! Catalog and configuration loading.

use crate::dataset::Catalog;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use u_cutstock_core::{validate_catalogs, Config, Piece, StockBlock};

/// Errors that can occur when loading catalogs.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid catalog: {0}")]
    InvalidFormat(String),
}

/// Parser for JSON catalogs.
///
/// ```json
/// {
///   "name": "foam-shop",
///   "pieces": [{ "id": "A", "length": 40, "width": 30, "height": 20, "quantity": 4 }],
///   "stocks": [{ "id": "S", "length": 200, "width": 100, "height": 100, "price": 80 }]
/// }
/// ```
#[derive(Debug, Default)]
pub struct CatalogParser;

impl CatalogParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses a catalog from a JSON file.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Catalog, ParseError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut catalog = self.parse_json(&content)?;
        if catalog.name.is_empty() {
            catalog.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(catalog)
    }

    /// Parses a catalog from a JSON string.
    pub fn parse_json(&self, json: &str) -> Result<Catalog, ParseError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        self.convert_raw_catalog(raw)
    }

    /// Loads a solver configuration; missing fields keep their defaults.
    pub fn parse_config_file(&self, path: impl AsRef<Path>) -> Result<Config, ParseError> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| ParseError::InvalidFormat(e.to_string()))?;
        Ok(config)
    }

    fn convert_raw_catalog(&self, raw: RawCatalog) -> Result<Catalog, ParseError> {
        let pieces: Vec<Piece> = raw.pieces.into_iter().map(RawPiece::into_piece).collect();
        let stocks: Vec<StockBlock> = raw.stocks.into_iter().map(RawStock::into_stock).collect();

        if stocks.is_empty() {
            return Err(ParseError::InvalidFormat(
                "catalog has no stock blocks".into(),
            ));
        }
        validate_catalogs(&pieces, &stocks)
            .map_err(|e| ParseError::InvalidFormat(e.to_string()))?;

        Ok(Catalog {
            name: raw.name,
            pieces,
            stocks,
        })
    }
}

fn default_quantity() -> usize {
    1
}

fn default_true() -> bool {
    true
}

/// Raw catalog as parsed from JSON.
#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    name: String,
    #[serde(default)]
    pieces: Vec<RawPiece>,
    stocks: Vec<RawStock>,
}

#[derive(Debug, Deserialize)]
struct RawPiece {
    id: String,
    length: f64,
    width: f64,
    height: f64,
    #[serde(default = "default_quantity")]
    quantity: usize,
    #[serde(default = "default_true")]
    rotatable: bool,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    color: Option<String>,
}

impl RawPiece {
    fn into_piece(self) -> Piece {
        let mut piece = Piece::new(self.id, self.length, self.width, self.height)
            .with_quantity(self.quantity)
            .with_rotatable(self.rotatable);
        piece.label = self.label;
        piece.color = self.color;
        piece
    }
}

#[derive(Debug, Deserialize)]
struct RawStock {
    id: String,
    length: f64,
    width: f64,
    height: f64,
    #[serde(default = "default_quantity")]
    quantity: usize,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    label: Option<String>,
}

impl RawStock {
    fn into_stock(self) -> StockBlock {
        let mut stock = StockBlock::new(self.id, self.length, self.width, self.height)
            .with_quantity(self.quantity);
        stock.price = self.price;
        stock.label = self.label;
        stock
    }
}
