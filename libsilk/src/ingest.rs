//! Turning user-supplied CSV text into candidate records
//!
//! The parser is lenient: a malformed data row is skipped and reported, but it
//! never prevents the well-formed rows around it from being imported. Only
//! problems with the file as a whole (no data rows, unresolvable header, no
//! usable rows at all) are fatal.
use crate::{
    error::{Error, Result},
    record::{Field, GeoRecord, TYPE_UPLOADED},
    validate::{FieldErrors, validate_record},
};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::{fmt::Display, path::Path};
use tracing::{debug, warn};

/// The reason that a single data row was left out of the import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SkipReason {
    /// The row did not contain all of the required columns
    TooFewColumns { expected: usize, found: usize },
    /// The latitude or longitude was not a finite number
    InvalidCoordinates { latitude: String, longitude: String },
    /// The row parsed but failed field validation
    Invalid(FieldErrors),
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::TooFewColumns { expected, found } => {
                write!(f, "expected at least {expected} columns, found {found}")
            }
            SkipReason::InvalidCoordinates {
                latitude,
                longitude,
            } => write!(f, "invalid coordinates ({latitude}, {longitude})"),
            SkipReason::Invalid(errors) => {
                write!(f, "{}", errors.first_message().unwrap_or("invalid row"))
            }
        }
    }
}

/// A data row that was skipped. Rows are numbered from 1, not counting the
/// header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: SkipReason,
}

/// The result of a successful ingestion
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Ingested {
    /// Candidate records in file order
    pub records: Vec<GeoRecord>,
    /// Data rows that were left out, in file order
    pub skipped: Vec<SkippedRow>,
}

impl Ingested {
    /// The number of data rows that were examined
    pub fn rows(&self) -> usize {
        self.records.len() + self.skipped.len()
    }
}

/// The column index of each role in the header row
#[derive(Debug, Clone, Copy, PartialEq)]
struct Columns {
    name: usize,
    latitude: usize,
    longitude: usize,
    description: Option<usize>,
}

impl Columns {
    /// Resolve column roles by looking for a substring in each header name.
    /// The first matching column wins.
    fn resolve(header: &[String]) -> Result<Self> {
        let find = |keys: &[&str]| {
            header
                .iter()
                .position(|h| keys.iter().any(|k| h.contains(k)))
        };
        let name = find(&["name"]);
        let latitude = find(&["lat"]);
        let longitude = find(&["lng", "lon"]);
        let description = find(&["desc"]);
        debug!(?name, ?latitude, ?longitude, ?description, "resolved csv columns");

        match (name, latitude, longitude) {
            (Some(name), Some(latitude), Some(longitude)) => Ok(Self {
                name,
                latitude,
                longitude,
                description,
            }),
            _ => {
                let missing = [
                    (Field::Name, name),
                    (Field::Latitude, latitude),
                    (Field::Longitude, longitude),
                ]
                .into_iter()
                .filter_map(|(field, idx)| idx.is_none().then_some(field))
                .collect();
                Err(Error::MissingColumns(missing))
            }
        }
    }

    /// The shortest row that still contains every required column
    fn min_len(&self) -> usize {
        self.name.max(self.latitude).max(self.longitude) + 1
    }
}

fn clean(value: &str) -> &str {
    value.trim().trim_matches('"').trim()
}

fn parse_coordinate(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_blank(record: &StringRecord) -> bool {
    record.len() == 1 && record.get(0).is_some_and(|f| f.is_empty())
}

fn parse_row(row: usize, values: &[&str], columns: &Columns) -> Result<GeoRecord, SkipReason> {
    if values.len() < columns.min_len() {
        return Err(SkipReason::TooFewColumns {
            expected: columns.min_len(),
            found: values.len(),
        });
    }

    let (lat, lng) = (values[columns.latitude], values[columns.longitude]);
    let (Some(latitude), Some(longitude)) = (parse_coordinate(lat), parse_coordinate(lng)) else {
        warn!(row, latitude = lat, longitude = lng, "Skipping row: invalid coordinates");
        return Err(SkipReason::InvalidCoordinates {
            latitude: lat.to_string(),
            longitude: lng.to_string(),
        });
    };

    let name = match values[columns.name] {
        "" => format!("Location {row}"),
        name => name.to_string(),
    };
    let description = columns
        .description
        .and_then(|i| values.get(i))
        .filter(|d| !d.is_empty())
        .map(|d| d.to_string());
    let candidate = GeoRecord::candidate(
        name,
        latitude,
        longitude,
        description,
        Some(TYPE_UPLOADED.to_string()),
    );

    validate_record(&candidate).map_err(|errors| {
        warn!(row, %errors, "Skipping row: validation failed");
        SkipReason::Invalid(errors)
    })
}

/// Parse CSV text into candidate records.
///
/// The first non-blank line is the header. Values are split on commas with
/// surrounding whitespace and double quotes removed; quoted values cannot
/// contain commas.
pub fn parse_csv(text: &str) -> Result<Ingested> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let lines = reader
        .records()
        .filter(|r| !r.as_ref().is_ok_and(is_blank))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| Error::InputFormat(format!("Unable to read CSV data: {e}")))?;

    let Some((header, rows)) = lines.split_first().filter(|(_, rows)| !rows.is_empty()) else {
        return Err(Error::InputFormat(
            "CSV must contain a header and at least one data row".to_string(),
        ));
    };

    let header = header
        .iter()
        .map(|h| clean(h).to_lowercase())
        .collect::<Vec<_>>();
    let columns = Columns::resolve(&header)?;

    let mut ingested = Ingested::default();
    for (i, record) in rows.iter().enumerate() {
        let row = i + 1;
        let values = record.iter().map(clean).collect::<Vec<_>>();
        match parse_row(row, &values, &columns) {
            Ok(rec) => ingested.records.push(rec),
            Err(reason) => ingested.skipped.push(SkippedRow { row, reason }),
        }
    }

    debug!(
        accepted = ingested.records.len(),
        skipped = ingested.skipped.len(),
        "parsed csv"
    );
    if ingested.records.is_empty() {
        return Err(Error::InputFormat(
            "No valid locations found in CSV".to_string(),
        ));
    }
    Ok(ingested)
}

/// Read and parse a CSV file. The file name must end with `.csv`.
pub async fn ingest_file<P: AsRef<Path>>(path: P) -> Result<Ingested> {
    let path = path.as_ref();
    let is_csv = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase().ends_with(".csv"))
        .unwrap_or(false);
    if !is_csv {
        return Err(Error::InputFormat("Please upload a CSV file".to_string()));
    }
    debug!(?path, "reading csv file");
    let text = tokio::fs::read_to_string(path).await?;
    parse_csv(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn single_row() {
        let out = parse_csv("name,latitude,longitude\nIstanbul,41.0082,28.9784\n")
            .expect("valid csv");
        assert_eq!(out.records.len(), 1);
        assert!(out.skipped.is_empty());
        let rec = &out.records[0];
        assert_eq!(rec.name, "Istanbul");
        assert_eq!(rec.latitude, 41.0082);
        assert_eq!(rec.longitude, 28.9784);
        assert_eq!(rec.description, None);
        assert_eq!(rec.kind.as_deref(), Some("uploaded"));
        assert_eq!(rec.id, None);
        assert_eq!(rec.user_id, None);
    }

    #[test]
    fn bad_coordinates_are_skipped() {
        let out = parse_csv("name,lat,lng\nBad,notanumber,28\nGood,41.0,29.0\n").unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].name, "Good");
        assert_eq!(
            out.skipped,
            vec![SkippedRow {
                row: 1,
                reason: SkipReason::InvalidCoordinates {
                    latitude: "notanumber".to_string(),
                    longitude: "28".to_string(),
                }
            }]
        );
    }

    #[test]
    fn each_bad_row_costs_exactly_one() {
        let good = "A,1,1\nB,2,2\nC,3,3\n";
        let base = parse_csv(&format!("name,lat,lon\n{good}")).unwrap();
        assert_eq!(base.records.len(), 3);

        let mixed = format!("name,lat,lon\nX,abc,1\n{good}Y,1,\nZ,inf,2\n");
        let out = parse_csv(&mixed).unwrap();
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.skipped.len(), 3);
        assert_eq!(out.records, base.records);
        assert_eq!(
            out.skipped.iter().map(|s| s.row).collect::<Vec<_>>(),
            vec![1, 5, 6]
        );
    }

    #[test]
    fn column_order_and_case() {
        let text = "Description,LONGITUDE,Place Name,Latitude\n\
                    \"Hemp value chain\",27.142826,Earthist,38.423733\n\
                    ,76.4946414,Just Change,11.505573\n";
        let out = parse_csv(text).unwrap();
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].name, "Earthist");
        assert_eq!(out.records[0].latitude, 38.423733);
        assert_eq!(out.records[0].longitude, 27.142826);
        assert_eq!(out.records[0].description.as_deref(), Some("Hemp value chain"));
        assert_eq!(out.records[1].name, "Just Change");
        assert_eq!(out.records[1].description, None);
    }

    #[test]
    fn quotes_and_whitespace_are_stripped() {
        let text = "\"name\" , \"lat\" , \"lng\"\r\n  \"Bread Houses Network\" , \"42.702179\" ,\"23.333359\"  \r\n";
        let out = parse_csv(text).unwrap();
        assert_eq!(out.records[0].name, "Bread Houses Network");
        assert_eq!(out.records[0].latitude, 42.702179);
        assert_eq!(out.records[0].longitude, 23.333359);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let text = "\n\nname,lat,lng\n\n   \nA,1,2\n\n";
        let out = parse_csv(text).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.rows(), 1);
    }

    #[test]
    fn empty_name_gets_synthetic_label() {
        let out = parse_csv("name,lat,lng\nA,1,1\n\"\",2,2\n  ,3,3\n").unwrap();
        let names = out.records.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["A", "Location 2", "Location 3"]);
    }

    #[test]
    fn short_rows_are_skipped() {
        let out = parse_csv("lat,lng,name,description\n1,2\n3,4,Kept\n").unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].name, "Kept");
        assert_eq!(out.records[0].description, None);
        assert_eq!(
            out.skipped[0].reason,
            SkipReason::TooFewColumns {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn out_of_range_rows_are_skipped() {
        let out = parse_csv("name,lat,lng\nNorth,95,10\nOk,45,10\nEast,45,200\n").unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.skipped.len(), 2);
        match &out.skipped[0].reason {
            SkipReason::Invalid(errs) => assert!(errs.get(Field::Latitude).is_some()),
            other => panic!("unexpected reason {other:?}"),
        }
        match &out.skipped[1].reason {
            SkipReason::Invalid(errs) => assert!(errs.get(Field::Longitude).is_some()),
            other => panic!("unexpected reason {other:?}"),
        }
    }

    #[test]
    fn invalid_row_reports_first_violation() {
        let long_name = "x".repeat(201);
        let out = parse_csv(&format!("name,lat,lng\n{long_name},95,10\nOk,45,10\n")).unwrap();
        assert_eq!(out.skipped.len(), 1);
        let SkipReason::Invalid(errs) = &out.skipped[0].reason else {
            panic!("unexpected reason {:?}", out.skipped[0].reason);
        };
        assert_eq!(errs.len(), 2);
        assert_eq!(
            out.skipped[0].reason.to_string(),
            "Name must be less than 200 characters"
        );
    }

    #[test]
    fn header_only_is_an_input_error() {
        let err = parse_csv("name,latitude,longitude\n").unwrap_err();
        assert!(matches!(err, Error::InputFormat(_)));
        assert_eq!(
            err.to_string(),
            "CSV must contain a header and at least one data row"
        );
        assert!(matches!(parse_csv(""), Err(Error::InputFormat(_))));
    }

    #[test]
    fn missing_latitude_column() {
        let err = parse_csv("name,longitude\nA,1\n").unwrap_err();
        match err {
            Error::MissingColumns(ref fields) => assert_eq!(fields, &vec![Field::Latitude]),
            ref e => panic!("unexpected error {e:?}"),
        }
        assert!(err.to_string().contains("latitude"));
    }

    #[test]
    fn all_missing_columns_are_reported() {
        match parse_csv("foo,bar\n1,2\n").unwrap_err() {
            Error::MissingColumns(fields) => assert_eq!(
                fields,
                vec![Field::Name, Field::Latitude, Field::Longitude]
            ),
            e => panic!("unexpected error {e:?}"),
        }
    }

    #[test]
    fn no_valid_rows_is_an_input_error() {
        let err = parse_csv("name,lat,lng\nA,x,y\nB,,\n").unwrap_err();
        assert!(matches!(err, Error::InputFormat(_)));
        assert_eq!(err.to_string(), "No valid locations found in CSV");
    }

    #[test(tokio::test)]
    async fn file_extension_is_checked() {
        let err = ingest_file("/tmp/locations.txt").await.unwrap_err();
        assert_eq!(err.to_string(), "Please upload a CSV file");
    }

    #[test(tokio::test)]
    async fn reads_csv_file() {
        let path = std::env::temp_dir().join(format!("libsilk-ingest-{}.CSV", std::process::id()));
        tokio::fs::write(&path, "name,lat,lng\nTehran,35.6892,51.3890\n")
            .await
            .unwrap();
        let out = ingest_file(&path).await.expect("should ingest");
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(out.records[0].name, "Tehran");
    }
}
