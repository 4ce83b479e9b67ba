//! Instrument universe grouped by sector.
//!
//! A universe is either the built-in list of Tokyo-listed names or a CSV file
//! with header `ticker,name,sector`.

use crate::domain::error::ScreenerError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub ticker: String,
    pub name: String,
    pub sector: String,
}

impl Instrument {
    pub fn new(ticker: &str, name: &str, sector: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            name: name.to_string(),
            sector: sector.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Universe {
    pub instruments: Vec<Instrument>,
}

const BUILTIN: &[(&str, &str, &str)] = &[
    ("7203.T", "Toyota Motor", "Automotive"),
    ("7267.T", "Honda Motor", "Automotive"),
    ("7201.T", "Nissan Motor", "Automotive"),
    ("7269.T", "Suzuki Motor", "Automotive"),
    ("7270.T", "Subaru", "Automotive"),
    ("6758.T", "Sony Group", "Electronics"),
    ("6501.T", "Hitachi", "Electronics"),
    ("6752.T", "Panasonic", "Electronics"),
    ("6702.T", "Fujitsu", "Electronics"),
    ("6503.T", "Mitsubishi Electric", "Electronics"),
    ("8306.T", "Mitsubishi UFJ Financial", "Banks"),
    ("8316.T", "Sumitomo Mitsui Financial", "Banks"),
    ("8411.T", "Mizuho Financial", "Banks"),
    ("8308.T", "Resona Holdings", "Banks"),
    ("8309.T", "Sumitomo Mitsui Trust", "Banks"),
    ("9432.T", "NTT", "Telecom"),
    ("9433.T", "KDDI", "Telecom"),
    ("9434.T", "SoftBank", "Telecom"),
    ("9984.T", "SoftBank Group", "Telecom"),
    ("9613.T", "NTT Data", "Telecom"),
    ("9983.T", "Fast Retailing", "Retail"),
    ("3382.T", "Seven & i Holdings", "Retail"),
    ("8267.T", "Aeon", "Retail"),
    ("3099.T", "Isetan Mitsukoshi", "Retail"),
    ("8233.T", "Takashimaya", "Retail"),
];

impl Universe {
    pub fn builtin() -> Self {
        Self {
            instruments: BUILTIN
                .iter()
                .map(|(t, n, s)| Instrument::new(t, n, s))
                .collect(),
        }
    }

    pub fn count(&self) -> usize {
        self.instruments.len()
    }

    /// Sector names in order of first appearance.
    pub fn sectors(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.instruments
            .iter()
            .filter(|i| seen.insert(i.sector.as_str()))
            .map(|i| i.sector.clone())
            .collect()
    }

    pub fn in_sector<'a>(&'a self, sector: &'a str) -> impl Iterator<Item = &'a Instrument> + 'a {
        self.instruments.iter().filter(move |i| i.sector == sector)
    }

    /// Instruments of the requested sectors, grouped in request order.
    pub fn select(&self, sectors: &[String]) -> Result<Vec<Instrument>, ScreenerError> {
        let mut selected = Vec::new();
        for sector in sectors {
            let before = selected.len();
            selected.extend(self.in_sector(sector).cloned());
            if selected.len() == before {
                return Err(ScreenerError::UnknownSector(sector.clone()));
            }
        }
        Ok(selected)
    }

    pub fn find(&self, ticker: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.ticker == ticker)
    }
}

pub fn load_universe_csv(path: &Path) -> Result<Universe, ScreenerError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let instruments = reader
        .deserialize::<Instrument>()
        .collect::<Result<Vec<_>, _>>()?;

    if instruments.is_empty() {
        return Err(ScreenerError::ConfigInvalid {
            section: "universe".to_string(),
            key: "file".to_string(),
            reason: format!("{} lists no instruments", path.display()),
        });
    }

    let mut seen = HashSet::new();
    if let Some(dup) = instruments.iter().find(|i| !seen.insert(i.ticker.as_str())) {
        return Err(ScreenerError::ConfigInvalid {
            section: "universe".to_string(),
            key: "file".to_string(),
            reason: format!("duplicate ticker {}", dup.ticker),
        });
    }

    Ok(Universe { instruments })
}

/// Splits a comma separated sector list.
pub fn parse_sectors(input: &str) -> Result<Vec<String>, ScreenerError> {
    let mut sectors = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(ScreenerError::invalid_parameter(
                "sectors",
                "empty token in sector list",
            ));
        }
        if !seen.insert(trimmed.to_string()) {
            return Err(ScreenerError::invalid_parameter(
                "sectors",
                format!("duplicate sector: {trimmed}"),
            ));
        }
        sectors.push(trimmed.to_string());
    }

    Ok(sectors)
}
