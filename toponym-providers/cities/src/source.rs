//! City files parsed into in-memory records.
//!
//! Rows are read as bytes. Only the name and coordinate columns are decoded,
//! as UTF-8 where valid and as ISO-8859-1 otherwise, so stray bytes in the
//! world file's accented-name column never stop an import.
use std::{
    borrow::Cow,
    fmt,
    fs::File,
    io::{Read, Write},
    path::Path,
};

use csv::{ByteRecord, ReaderBuilder, WriterBuilder};
use toponym_core::{CityRecord, RecordSource, RecordSourceError};
use tracing::{debug, instrument};

use crate::errors::CitySourceError;

/// Column layout of a city file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CityLayout {
    /// `country,city,accent_city,region,population,latitude,longitude`
    #[default]
    World,
    /// `id,city,latitude,longitude`, as written by the extraction step.
    Extracted,
}

impl CityLayout {
    const fn field_count(self) -> usize {
        match self {
            Self::World => 7,
            Self::Extracted => 4,
        }
    }

    /// Returns `(name, latitude, longitude)` column indices.
    const fn columns(self) -> (usize, usize, usize) {
        match self {
            Self::World => (1, 5, 6),
            Self::Extracted => (1, 2, 3),
        }
    }

    /// The world file is split on every comma; extracted files follow the
    /// usual CSV quoting rules.
    const fn quoted(self) -> bool {
        matches!(self, Self::Extracted)
    }

    const fn header_key(self) -> &'static str {
        match self {
            Self::World => "country",
            Self::Extracted => "id",
        }
    }

    /// Returns the layout's stable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::World => "world",
            Self::Extracted => "extracted",
        }
    }
}

impl fmt::Display for CityLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header row of the extracted layout.
pub const EXTRACTED_HEADER: [&str; 4] = ["id", "city", "latitude", "longitude"];

/// City records read from a comma-separated file.
#[derive(Debug, Clone)]
pub struct CitySource {
    name: String,
    records: Vec<CityRecord>,
    skipped: usize,
}

impl CitySource {
    /// Creates a source from records that are already in memory.
    ///
    /// # Errors
    /// Returns [`CitySourceError::EmptyInput`] when `records` is empty.
    ///
    /// # Examples
    /// ```
    /// use toponym_core::{CityRecord, RecordSource};
    /// use toponym_providers_cities::CitySource;
    ///
    /// let source = CitySource::new("demo", vec![CityRecord::new("hof", 50.3, 11.9)])?;
    /// assert_eq!(source.len(), 1);
    /// # Ok::<(), toponym_providers_cities::CitySourceError>(())
    /// ```
    pub fn new(name: impl Into<String>, records: Vec<CityRecord>) -> Result<Self, CitySourceError> {
        if records.is_empty() {
            return Err(CitySourceError::EmptyInput);
        }
        Ok(Self {
            name: name.into(),
            records,
            skipped: 0,
        })
    }

    /// Reads the seven-column world layout, keeping rows whose country code
    /// equals `country` (all rows when `None`).
    ///
    /// # Errors
    /// See [`Self::try_from_reader_with_layout`].
    ///
    /// # Examples
    /// ```
    /// use std::io::Cursor;
    ///
    /// use toponym_core::RecordSource;
    /// use toponym_providers_cities::CitySource;
    ///
    /// let rows = "de,hof,Hof,02,,50.31,11.91\nat,hof,Hof,05,,47.1,15.2\n";
    /// let source = CitySource::try_from_reader("demo", Cursor::new(rows), Some("de"))?;
    /// assert_eq!(source.len(), 1);
    /// assert_eq!(source.skipped(), 1);
    /// # Ok::<(), toponym_providers_cities::CitySourceError>(())
    /// ```
    pub fn try_from_reader<R: Read>(
        name: impl Into<String>,
        reader: R,
        country: Option<&str>,
    ) -> Result<Self, CitySourceError> {
        Self::try_from_reader_with_layout(name, reader, CityLayout::World, country)
    }

    /// Reads `reader` in the given layout.
    ///
    /// A first line whose leading field is the layout's header key is
    /// skipped, as are blank lines. The country filter applies to the world
    /// layout only. Quoted fields are honoured in the extracted layout.
    ///
    /// # Errors
    /// Returns [`CitySourceError::FieldCount`] for a row with the wrong
    /// number of fields, [`CitySourceError::InvalidCoordinate`] or
    /// [`CitySourceError::EmptyName`] for a malformed kept row,
    /// [`CitySourceError::EmptyInput`] when no row is kept and
    /// [`CitySourceError::Io`] when reading fails.
    #[instrument(
        name = "cities.read",
        err,
        skip(name, reader),
        fields(records = tracing::field::Empty, skipped = tracing::field::Empty),
    )]
    pub fn try_from_reader_with_layout<R: Read>(
        name: impl Into<String>,
        reader: R,
        layout: CityLayout,
        country: Option<&str>,
    ) -> Result<Self, CitySourceError> {
        let mut rows = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(layout.quoted())
            .from_reader(reader);
        let mut row = ByteRecord::new();
        let mut records = Vec::new();
        let mut skipped = 0_usize;
        while rows.read_byte_record(&mut row)? {
            let number = line_of(&row);
            if is_blank(&row) {
                continue;
            }
            if number == 1 && is_header(&row, layout) {
                continue;
            }
            if row.len() != layout.field_count() {
                return Err(CitySourceError::FieldCount {
                    line: number,
                    found: row.len(),
                    expected: layout.field_count(),
                });
            }
            if !keeps_country(&row, layout, country) {
                skipped += 1;
                continue;
            }
            records.push(parse_row(&row, layout, number)?);
        }

        let span = tracing::Span::current();
        span.record("records", records.len());
        span.record("skipped", skipped);
        debug!(records = records.len(), skipped, "city rows read");

        let mut source = Self::new(name, records)?;
        source.skipped = skipped;
        Ok(source)
    }

    /// Opens and reads the file at `path`; the source is named after it.
    ///
    /// # Errors
    /// Returns [`CitySourceError::Io`] when the file cannot be opened and
    /// otherwise the errors of [`Self::try_from_reader_with_layout`].
    pub fn try_from_path(
        path: impl AsRef<Path>,
        layout: CityLayout,
        country: Option<&str>,
    ) -> Result<Self, CitySourceError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::try_from_reader_with_layout(path.display().to_string(), file, layout, country)
    }

    /// Returns the parsed records.
    #[must_use]
    pub fn records(&self) -> &[CityRecord] {
        &self.records
    }

    /// Returns how many rows the country filter dropped.
    #[rustfmt::skip]
    #[must_use]
    pub fn skipped(&self) -> usize { self.skipped }

    /// Writes the records in the extracted layout: a header row, then one
    /// `id,city,latitude,longitude` row per record with ids counting from 1.
    /// Fields holding a comma or a quote are quoted.
    ///
    /// Returns the number of rows written, excluding the header.
    ///
    /// # Errors
    /// Returns [`CitySourceError::Io`] when writing fails.
    ///
    /// # Examples
    /// ```
    /// use std::io::Cursor;
    ///
    /// use toponym_providers_cities::CitySource;
    ///
    /// let rows = "de,hof,Hof,02,,50.31,11.91\n";
    /// let source = CitySource::try_from_reader("demo", Cursor::new(rows), Some("de"))?;
    /// let mut buffer = Vec::new();
    /// assert_eq!(source.write_extracted(&mut buffer)?, 1);
    /// assert_eq!(
    ///     String::from_utf8_lossy(&buffer),
    ///     "id,city,latitude,longitude\n1,hof,50.31,11.91\n"
    /// );
    /// # Ok::<(), toponym_providers_cities::CitySourceError>(())
    /// ```
    #[instrument(name = "cities.write_extracted", err, skip_all, fields(records = self.records.len()))]
    pub fn write_extracted<W: Write>(&self, writer: W) -> Result<usize, CitySourceError> {
        let mut rows = WriterBuilder::new().from_writer(writer);
        rows.write_record(EXTRACTED_HEADER)?;
        for (index, record) in self.records.iter().enumerate() {
            let id = (index + 1).to_string();
            let latitude = record.latitude().to_string();
            let longitude = record.longitude().to_string();
            rows.write_record([id.as_str(), record.name(), latitude.as_str(), longitude.as_str()])?;
        }
        rows.flush()?;
        Ok(self.records.len())
    }
}

fn line_of(row: &ByteRecord) -> usize {
    row.position()
        .and_then(|position| usize::try_from(position.line()).ok())
        .unwrap_or_default()
}

fn is_blank(row: &ByteRecord) -> bool {
    row.len() == 1 && row.get(0).is_some_and(|field| field.trim_ascii().is_empty())
}

fn is_header(row: &ByteRecord, layout: CityLayout) -> bool {
    row.get(0).is_some_and(|first| {
        first
            .trim_ascii()
            .eq_ignore_ascii_case(layout.header_key().as_bytes())
    })
}

fn keeps_country(row: &ByteRecord, layout: CityLayout, country: Option<&str>) -> bool {
    match (layout, country) {
        (CityLayout::World, Some(wanted)) => row
            .get(0)
            .is_some_and(|code| code.trim_ascii().eq_ignore_ascii_case(wanted.as_bytes())),
        _ => true,
    }
}

/// Decodes a field as UTF-8, falling back to ISO-8859-1.
fn decode(field: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(field) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(field.iter().copied().map(char::from).collect()),
    }
}

fn parse_row(row: &ByteRecord, layout: CityLayout, line: usize) -> Result<CityRecord, CitySourceError> {
    let (name_at, latitude_at, longitude_at) = layout.columns();
    let name = decode(row.get(name_at).unwrap_or_default());
    let name = name.trim();
    if name.is_empty() {
        return Err(CitySourceError::EmptyName { line });
    }
    let latitude = parse_coordinate(row.get(latitude_at), "latitude", line)?;
    let longitude = parse_coordinate(row.get(longitude_at), "longitude", line)?;
    Ok(CityRecord::new(name, latitude, longitude))
}

fn parse_coordinate(
    field: Option<&[u8]>,
    axis: &'static str,
    line: usize,
) -> Result<f64, CitySourceError> {
    let raw = decode(field.unwrap_or_default());
    let raw = raw.trim();
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CitySourceError::InvalidCoordinate {
            line,
            axis,
            value: raw.to_owned(),
        })
}

impl RecordSource for CitySource {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn record(&self, index: usize) -> Result<&CityRecord, RecordSourceError> {
        self.records
            .get(index)
            .ok_or(RecordSourceError::OutOfBounds { index })
    }
}
