// 🏗️ Parser Framework
// One parser per hand-authored source file: taxonomy, prices, inventory

use crate::error::{ZooError, ZooResult};
use crate::model::{AnimalRecord, AnimalTypeRule, PriceEntry};
use csv::{ReaderBuilder, StringRecord};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

// ============================================================================
// CORE TYPES
// ============================================================================

/// SourceKind - which of the three input files a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Taxonomy,
    Prices,
    Inventory,
}

impl SourceKind {
    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            SourceKind::Taxonomy => "animal taxonomy",
            SourceKind::Prices => "food prices",
            SourceKind::Inventory => "zoo inventory",
        }
    }

    /// Short code for logs
    pub fn code(&self) -> &str {
        match self {
            SourceKind::Taxonomy => "taxonomy",
            SourceKind::Prices => "prices",
            SourceKind::Inventory => "inventory",
        }
    }

    /// File name used when none is configured
    pub fn default_file_name(&self) -> &'static str {
        match self {
            SourceKind::Taxonomy => "animals.csv",
            SourceKind::Prices => "prices.txt",
            SourceKind::Inventory => "zoo.xml",
        }
    }
}

/// RecordParser - turns one source file into a list of raw records
///
/// Parsers tolerate *missing* optional data by skipping it, but a value that
/// is present and malformed is always an error.
pub trait RecordParser: Send + Sync {
    type Record;

    /// Parse a whole file.
    ///
    /// # Returns
    /// * `Ok(Vec<Record>)` - records in file order
    /// * `Err(ZooError::NotFound)` - if the file does not exist
    /// * `Err(ZooError::Parse | ZooError::Xml)` - if a present value is malformed
    fn parse(&self, file_path: &Path) -> ZooResult<Vec<Self::Record>>;

    fn source_kind(&self) -> SourceKind;
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// Parse culture-invariant decimal text (`.` as separator).
fn parse_decimal(kind: SourceKind, line: usize, field: &str, raw: &str) -> ZooResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| ZooError::Parse {
        source_kind: kind,
        line,
        field: field.to_string(),
        raw: raw.to_string(),
        message: e.to_string(),
    })
}

/// Open a delimited text file with the csv reader configured for raw splitting:
/// no header row, no quote handling, any number of fields per line.
fn open_delimited(path: &Path, delimiter: u8) -> ZooResult<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| ZooError::from_io(path, e))?;

    Ok(ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .quoting(false)
        .from_reader(file))
}

fn csv_error(path: &Path, kind: SourceKind, err: csv::Error) -> ZooError {
    let line = err.position().map(|p| p.line() as usize).unwrap_or(0);
    match err.into_kind() {
        csv::ErrorKind::Io(io) => ZooError::from_io(path, io),
        other => ZooError::Parse {
            source_kind: kind,
            line,
            field: "record".to_string(),
            raw: String::new(),
            message: format!("{:?}", other),
        },
    }
}

fn line_of(record: &StringRecord) -> usize {
    record.position().map(|p| p.line() as usize).unwrap_or(0)
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

// ============================================================================
// TAXONOMY PARSER
// ============================================================================

/// Taxonomy Parser - `name;ratio;foodType[;meatPct%]`
pub struct TaxonomyParser;

impl TaxonomyParser {
    pub fn new() -> Self {
        TaxonomyParser
    }

    /// `"60%"` → `0.6`. All trailing percent signs are stripped.
    fn parse_meat_ratio(line: usize, raw: &str) -> ZooResult<Decimal> {
        let digits = raw.trim_end_matches('%').trim();
        let percent = parse_decimal(SourceKind::Taxonomy, line, "meat_ratio", digits)?;
        Ok(percent / Decimal::ONE_HUNDRED)
    }

    fn parse_record(record: &StringRecord) -> ZooResult<AnimalTypeRule> {
        let line = line_of(record);

        let name = record[0].trim().to_string();
        let ratio = parse_decimal(
            SourceKind::Taxonomy,
            line,
            "food_to_weight_ratio",
            record[1].trim(),
        )?;
        let food_type = record[2].trim().to_string();

        // Absent and blank both mean "not an omnivore"
        let meat_ratio = match record.get(3).map(str::trim) {
            Some(raw) if !raw.is_empty() => Self::parse_meat_ratio(line, raw)?,
            _ => Decimal::ZERO,
        };

        Ok(AnimalTypeRule::new(name, ratio, food_type, meat_ratio))
    }
}

impl Default for TaxonomyParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordParser for TaxonomyParser {
    type Record = AnimalTypeRule;

    fn parse(&self, file_path: &Path) -> ZooResult<Vec<AnimalTypeRule>> {
        let mut reader = open_delimited(file_path, b';')?;
        let mut rules = Vec::new();
        let mut skipped = 0;

        for result in reader.records() {
            let record = result.map_err(|e| csv_error(file_path, self.source_kind(), e))?;

            if is_blank(&record) {
                continue;
            }

            if record.len() < 3 {
                debug!(
                    line = line_of(&record),
                    fields = record.len(),
                    "skipping taxonomy line with fewer than 3 fields"
                );
                skipped += 1;
                continue;
            }

            rules.push(Self::parse_record(&record)?);
        }

        info!(
            source = self.source_kind().code(),
            path = %file_path.display(),
            records = rules.len(),
            skipped,
            "parsed source file"
        );

        Ok(rules)
    }

    fn source_kind(&self) -> SourceKind {
        SourceKind::Taxonomy
    }
}

// ============================================================================
// PRICE PARSER
// ============================================================================

/// Price Parser - `foodType=price`
pub struct PriceParser;

impl PriceParser {
    pub fn new() -> Self {
        PriceParser
    }
}

impl Default for PriceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordParser for PriceParser {
    type Record = PriceEntry;

    fn parse(&self, file_path: &Path) -> ZooResult<Vec<PriceEntry>> {
        let mut reader = open_delimited(file_path, b'=')?;
        let mut prices = Vec::new();
        let mut skipped = 0;

        for result in reader.records() {
            let record = result.map_err(|e| csv_error(file_path, self.source_kind(), e))?;

            if is_blank(&record) {
                continue;
            }

            if record.len() != 2 {
                debug!(
                    line = line_of(&record),
                    fields = record.len(),
                    "skipping price line that is not key=price"
                );
                skipped += 1;
                continue;
            }

            let food_type = record[0].trim().to_string();
            let price = parse_decimal(
                self.source_kind(),
                line_of(&record),
                "price",
                record[1].trim(),
            )?;

            prices.push(PriceEntry::new(food_type, price));
        }

        info!(
            source = self.source_kind().code(),
            path = %file_path.display(),
            records = prices.len(),
            skipped,
            "parsed source file"
        );

        Ok(prices)
    }

    fn source_kind(&self) -> SourceKind {
        SourceKind::Prices
    }
}

// ============================================================================
// INVENTORY PARSER
// ============================================================================

/// Inventory Parser - nested markup
///
/// ```text
/// <Zoo>                                   root, ignored
///   <Lions>                               species group
///     <Lion name="Simba" kg="160"/>       animal; tag name is the species
///   </Lions>
/// </Zoo>
/// ```
pub struct InventoryParser;

const GROUP_DEPTH: usize = 2;
const ANIMAL_DEPTH: usize = 3;

impl InventoryParser {
    pub fn new() -> Self {
        InventoryParser
    }

    fn xml_error(path: &Path, message: impl ToString) -> ZooError {
        ZooError::Xml {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    fn attribute(path: &Path, element: &BytesStart, key: &str) -> ZooResult<Option<String>> {
        let attr = element
            .try_get_attribute(key)
            .map_err(|e| Self::xml_error(path, e))?;

        match attr {
            Some(attr) => {
                let value = attr
                    .unescape_value()
                    .map_err(|e| Self::xml_error(path, e))?;
                Ok(Some(value.into_owned()))
            }
            None => Ok(None),
        }
    }

    /// Build a record from an animal element, or `None` if `name` or `kg` is missing.
    fn parse_animal(
        path: &Path,
        element: &BytesStart,
        line: usize,
    ) -> ZooResult<Option<AnimalRecord>> {
        let species = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();

        let name = Self::attribute(path, element, "name")?;
        let kg = Self::attribute(path, element, "kg")?;

        let (name, kg) = match (name, kg) {
            (Some(name), Some(kg)) => (name, kg),
            _ => {
                debug!(line, species = %species, "skipping animal without name or kg");
                return Ok(None);
            }
        };

        let weight = parse_decimal(SourceKind::Inventory, line, "kg", kg.trim())?;

        Ok(Some(AnimalRecord::new(name, weight, species)))
    }
}

impl Default for InventoryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordParser for InventoryParser {
    type Record = AnimalRecord;

    fn parse(&self, file_path: &Path) -> ZooResult<Vec<AnimalRecord>> {
        let content = fs::read_to_string(file_path).map_err(|e| ZooError::from_io(file_path, e))?;

        let mut reader = Reader::from_str(&content);
        reader.config_mut().trim_text(true);

        let line_at = |pos: usize| {
            let end = pos.min(content.len());
            content.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
        };

        let mut animals = Vec::new();
        let mut depth = 0usize;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| Self::xml_error(file_path, format!("{} at byte {}", e, reader.buffer_position())))?;

            match event {
                Event::Start(element) => {
                    depth += 1;
                    if depth == GROUP_DEPTH {
                        debug!(group = %String::from_utf8_lossy(element.local_name().as_ref()), "entering species group");
                    } else if depth == ANIMAL_DEPTH {
                        let line = line_at(reader.buffer_position() as usize);
                        if let Some(animal) = Self::parse_animal(file_path, &element, line)? {
                            animals.push(animal);
                        }
                    }
                }
                Event::Empty(element) => {
                    // Self-closing elements do not change depth
                    if depth + 1 == ANIMAL_DEPTH {
                        let line = line_at(reader.buffer_position() as usize);
                        if let Some(animal) = Self::parse_animal(file_path, &element, line)? {
                            animals.push(animal);
                        }
                    }
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        info!(
            source = self.source_kind().code(),
            path = %file_path.display(),
            records = animals.len(),
            "parsed source file"
        );

        Ok(animals)
    }

    fn source_kind(&self) -> SourceKind {
        SourceKind::Inventory
    }
}

// ============================================================================
// TESTS
// ============================================================================
