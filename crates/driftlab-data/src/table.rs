//! Comma-separated tables with a header row.
//!
//! Fields may be quoted with `"`; a quoted field can contain commas and
//! doubled quotes (`""`). Records end at the line break, so quoted fields
//! cannot span lines. Blank lines are ignored.

use std::{
    fs,
    io::{self, Write as _},
    path::Path,
};

use driftlab_stats::sample::SampleSequence;

use crate::DataError;

#[derive(Debug, Clone, PartialEq)]
struct Row {
    /// 1-indexed source line.
    line: usize,
    cells: Vec<String>,
}

/// A parsed table: named columns of text cells.
///
/// # Examples
///
/// ```
/// use driftlab_data::table::Table;
///
/// let table = Table::parse("id,fare\na,12.5\nb,NaN\nc,9\n").unwrap();
/// let fares = table.numeric_column("fare").unwrap();
/// assert_eq!(fares.as_slice(), &[12.5, 9.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Creates an empty table with the given column names.
    #[must_use]
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: vec![],
        }
    }

    /// Appends a row.
    ///
    /// # Panics
    ///
    /// Panics if the row does not have one cell per column.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cells = cells.into_iter().map(Into::into).collect::<Vec<String>>();
        assert_eq!(
            cells.len(),
            self.headers.len(),
            "row must have one cell per column"
        );
        let line = self.rows.len() + 2;
        self.rows.push(Row { line, cells });
    }

    /// Parses comma-separated text whose first non-blank line is the header.
    pub fn parse(text: &str) -> Result<Self, DataError> {
        let mut records = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line))
            .filter(|(_, line)| !line.trim().is_empty());

        let Some((header_line, header)) = records.next() else {
            return Err(DataError::Parse {
                line: 1,
                message: "missing header row".to_owned(),
            });
        };
        let headers = split_record(header, header_line)?
            .into_iter()
            .map(|h| h.trim().to_owned())
            .collect::<Vec<_>>();

        let rows = records
            .map(|(line, record)| {
                let cells = split_record(record, line)?;
                if cells.len() != headers.len() {
                    return Err(DataError::Parse {
                        line,
                        message: format!("expected {} fields, got {}", headers.len(), cells.len()),
                    });
                }
                Ok(Row { line, cells })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { headers, rows })
    }

    /// Reads and parses a file.
    pub fn read<P>(path: P) -> Result<Self, DataError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_owned(),
            source,
        })?;
        let table = Self::parse(&text)?;
        tracing::debug!(
            path = %path.display(),
            columns = table.headers.len(),
            rows = table.rows.len(),
            "loaded table"
        );
        Ok(table)
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the column headed `name`; header matching is exact.
    pub fn column_index(&self, name: &str) -> Result<usize, DataError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataError::MissingColumn {
                name: name.to_owned(),
                found: self.headers.clone(),
            })
    }

    /// `(line, cell)` pairs of one column, in row order.
    pub fn cells(&self, name: &str) -> Result<impl Iterator<Item = (usize, &str)>, DataError> {
        let index = self.column_index(name)?;
        Ok(self
            .rows
            .iter()
            .map(move |row| (row.line, row.cells[index].as_str())))
    }

    /// Extracts a column as finite numbers.
    ///
    /// Cells that are not numbers, or that parse to `NaN` or an infinity, are
    /// skipped. A column left with no values at all is an error.
    pub fn numeric_column(&self, name: &str) -> Result<SampleSequence, DataError> {
        let mut unparsed = 0_usize;
        let parsed = self
            .cells(name)?
            .filter_map(|(line, cell)| match cell.trim().parse::<f64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::debug!(column = name, line, cell, "skipping non-numeric cell");
                    unparsed += 1;
                    None
                }
            })
            .collect::<Vec<_>>();
        let values = SampleSequence::new(parsed);

        let skipped = unparsed + values.dropped();
        if skipped > 0 {
            tracing::debug!(column = name, skipped, kept = values.len(), "filtered column");
        }
        if values.is_empty() {
            return Err(DataError::EmptyColumn {
                name: name.to_owned(),
            });
        }
        Ok(values)
    }

    /// Extracts two columns as paired finite numbers.
    ///
    /// A row is kept only if both of its cells are finite numbers, so the
    /// returned vectors stay aligned row by row.
    pub fn numeric_pairs(&self, x: &str, y: &str) -> Result<(Vec<f64>, Vec<f64>), DataError> {
        let parse = |cell: &str| cell.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        let (xs, ys): (Vec<f64>, Vec<f64>) = self
            .cells(x)?
            .zip(self.cells(y)?)
            .filter_map(|((line, a), (_, b))| match (parse(a), parse(b)) {
                (Some(a), Some(b)) => Some((a, b)),
                _ => {
                    tracing::debug!(line, x = a, y = b, "skipping incomplete pair");
                    None
                }
            })
            .unzip();
        if xs.is_empty() {
            return Err(DataError::EmptyColumn {
                name: format!("{x}, {y}"),
            });
        }
        Ok((xs, ys))
    }

    /// Columns whose every non-empty cell is a number and that hold at least
    /// one finite value.
    #[must_use]
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.headers
            .iter()
            .enumerate()
            .filter(|&(index, _)| {
                let mut cells = self
                    .rows
                    .iter()
                    .map(|row| row.cells[index].trim())
                    .filter(|cell| !cell.is_empty())
                    .peekable();
                let mut any_finite = false;
                let all_numeric = cells.peek().is_some()
                    && cells.all(|cell| match cell.parse::<f64>() {
                        Ok(value) => {
                            any_finite |= value.is_finite();
                            true
                        }
                        Err(_) => false,
                    });
                all_numeric && any_finite
            })
            .map(|(_, name)| name.as_str())
            .collect()
    }

    /// Writes the table as comma-separated text, quoting where needed.
    pub fn write_csv<W>(&self, mut writer: W) -> io::Result<()>
    where
        W: io::Write,
    {
        write_record(&mut writer, &self.headers)?;
        for row in &self.rows {
            write_record(&mut writer, &row.cells)?;
        }
        writer.flush()
    }

    /// Writes the table to a file, replacing it.
    pub fn save<P>(&self, path: P) -> Result<(), DataError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let io_error = |source| DataError::Io {
            path: path.to_owned(),
            source,
        };
        let file = fs::File::create(path).map_err(io_error)?;
        self.write_csv(io::BufWriter::new(file)).map_err(io_error)?;
        tracing::debug!(path = %path.display(), rows = self.rows.len(), "saved table");
        Ok(())
    }
}

fn split_record(record: &str, line: usize) -> Result<Vec<String>, DataError> {
    let mut fields = vec![];
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = record.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }
    if in_quotes {
        return Err(DataError::Parse {
            line,
            message: "unterminated quoted field".to_owned(),
        });
    }
    fields.push(field);
    Ok(fields)
}

fn write_record<W>(writer: &mut W, cells: &[String]) -> io::Result<()>
where
    W: io::Write,
{
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            writer.write_all(b",")?;
        }
        if cell.contains([',', '"', '\n', '\r']) {
            write!(writer, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            writer.write_all(cell.as_bytes())?;
        }
    }
    writer.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RIDES: &str = "\
ride_id,pickup_zone,trip_distance_km,fare_amount
b_0,Z001,6.5,55.1
b_1,Z002,,40.0

b_2,Z003,abc,38.2
b_3,Z004,inf,31.0
";

    #[test]
    fn test_parse_headers_and_rows() {
        let table = Table::parse(RIDES).unwrap();
        assert_eq!(
            table.headers(),
            &["ride_id", "pickup_zone", "trip_distance_km", "fare_amount"]
        );
        assert_eq!(table.len(), 4);
        let lines = table
            .cells("ride_id")
            .unwrap()
            .map(|(line, _)| line)
            .collect::<Vec<_>>();
        assert_eq!(lines, vec![2, 3, 5, 6]);
    }

    #[test]
    fn test_numeric_column_skips_bad_cells() {
        let table = Table::parse(RIDES).unwrap();
        let trips = table.numeric_column("trip_distance_km").unwrap();
        assert_eq!(trips.as_slice(), &[6.5]);
        assert_eq!(trips.dropped(), 1);
        let fares = table.numeric_column("fare_amount").unwrap();
        assert_eq!(fares.as_slice(), &[55.1, 40.0, 38.2, 31.0]);
    }

    #[test]
    fn test_numeric_pairs_stay_aligned() {
        let table = Table::parse("pre,post\n1,10\n,20\n3,NaN\n4,40\n").unwrap();
        let (pre, post) = table.numeric_pairs("pre", "post").unwrap();
        assert_eq!(pre, vec![1.0, 4.0]);
        assert_eq!(post, vec![10.0, 40.0]);

        let table = Table::parse("pre,post\n1,\n,2\n").unwrap();
        assert!(matches!(
            table.numeric_pairs("pre", "post"),
            Err(DataError::EmptyColumn { .. })
        ));
    }

    #[test]
    fn test_numeric_columns() {
        let table = Table::parse(RIDES).unwrap();
        assert_eq!(table.numeric_columns(), vec!["fare_amount"]);

        let table = Table::parse("a,b,c\n1,x,\n2,3,\n").unwrap();
        assert_eq!(table.numeric_columns(), vec!["a"]);
    }

    #[test]
    fn test_missing_and_empty_columns() {
        let table = Table::parse(RIDES).unwrap();
        let err = table.numeric_column("surge").unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { ref name, .. } if name == "surge"));
        let err = table.numeric_column("pickup_zone").unwrap_err();
        assert!(matches!(err, DataError::EmptyColumn { .. }));
    }

    #[test]
    fn test_quoted_fields() {
        let text = "name,note,value\n\"Smith, J\",\"said \"\"hi\"\"\",1.5\n";
        let table = Table::parse(text).unwrap();
        let cells = table
            .cells("name")
            .unwrap()
            .map(|(_, c)| c.to_owned())
            .collect::<Vec<_>>();
        assert_eq!(cells, vec!["Smith, J"]);
        let (_, note) = table.cells("note").unwrap().next().unwrap();
        assert_eq!(note, "said \"hi\"");
        assert_eq!(table.numeric_column("value").unwrap().as_slice(), &[1.5]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Table::parse("\n\n"),
            Err(DataError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            Table::parse("a,b\n1,2\n3\n"),
            Err(DataError::Parse { line: 3, .. })
        ));
        assert!(matches!(
            Table::parse("a,b\n\"1,2\n"),
            Err(DataError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_write_quotes_where_needed() {
        let mut table = Table::new(["name", "value"]);
        table.push_row(["plain", "1"]);
        table.push_row(["with, comma", "say \"x\""]);
        let mut out = vec![];
        table.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "name,value\nplain,1\n\"with, comma\",\"say \"\"x\"\"\"\n"
        );
        assert_eq!(Table::parse(&text).unwrap(), table);
    }

    #[test]
    fn test_read_reports_path() {
        let err = Table::read("/nonexistent/driftlab/rides.csv").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/driftlab/rides.csv"));
    }
}
