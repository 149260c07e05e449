//! Level definitions
//!
//! Levels are comma-separated text: `title,background,power_up_count,row,row,...`
//! where `@` in the title stands for a space and each row is a string of digit
//! codes (`0` empty, `1`–`5` brick tiers). Whitespace is ignored everywhere.

use std::fs;
use std::path::Path;

use log::warn;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level source is missing fields (need title,background,count,rows...)")]
    MissingFields,
    #[error("bad power-up count {0:?}")]
    BadPowerUpCount(String),
    #[error("bad cell {cell:?} in row {row}")]
    BadCell { row: usize, cell: char },
    #[error("level has no brick rows")]
    NoRows,
    #[error("level set is empty")]
    EmptySet,
    #[error("reading level file: {0}")]
    Io(#[from] std::io::Error),
}

/// One parsed level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDef {
    pub title: String,
    pub background_asset: String,
    pub power_up_count: u32,
    /// Brick grid, one Vec per row, cells are digit codes 0–5
    pub rows: Vec<Vec<u8>>,
}

impl LevelDef {
    pub fn parse(source: &str) -> Result<Self, LevelError> {
        let cleaned: String = source
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let mut fields = cleaned.split(',');

        let title = fields
            .next()
            .ok_or(LevelError::MissingFields)?
            .replace('@', " ");
        let background_asset = fields
            .next()
            .ok_or(LevelError::MissingFields)?
            .to_string();
        let count_field = fields.next().ok_or(LevelError::MissingFields)?;
        let power_up_count = count_field
            .parse()
            .map_err(|_| LevelError::BadPowerUpCount(count_field.to_string()))?;

        let mut rows = Vec::new();
        for (row, field) in fields.enumerate() {
            let mut cells = Vec::with_capacity(field.len());
            for cell in field.chars() {
                let code = cell
                    .to_digit(10)
                    .filter(|&d| d <= 5)
                    .ok_or(LevelError::BadCell { row, cell })?;
                cells.push(code as u8);
            }
            rows.push(cells);
        }
        if rows.is_empty() {
            return Err(LevelError::NoRows);
        }

        Ok(Self {
            title,
            background_asset,
            power_up_count,
            rows,
        })
    }
}

/// An ordered set of levels, numbered from 1.
#[derive(Debug, Clone)]
pub struct LevelSet {
    levels: Vec<LevelDef>,
}

impl LevelSet {
    /// Parse level sources in order. Level numbers follow source order.
    pub fn parse_all(sources: &[String]) -> Result<Self, LevelError> {
        if sources.is_empty() {
            return Err(LevelError::EmptySet);
        }
        let levels = sources
            .iter()
            .map(|s| LevelDef::parse(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { levels })
    }

    /// Load `1.txt`, `2.txt`, ... from a directory until a number is missing.
    pub fn load_dir(dir: &Path) -> Result<Self, LevelError> {
        let mut sources = Vec::new();
        for number in 1.. {
            let path = dir.join(format!("{number}.txt"));
            if !path.exists() {
                break;
            }
            sources.push(fs::read_to_string(path)?);
        }
        Self::parse_all(&sources)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, number: u32) -> Option<&LevelDef> {
        (number >= 1)
            .then(|| self.levels.get(number as usize - 1))
            .flatten()
    }

    /// Fetch a level, falling back to level 1 when the number is out of range.
    /// Returns the number actually used.
    pub fn get_or_first(&self, number: u32) -> (u32, &LevelDef) {
        match self.get(number) {
            Some(def) => (number, def),
            None => {
                warn!("level {number} not found, falling back to level 1");
                (1, &self.levels[0])
            }
        }
    }
}
