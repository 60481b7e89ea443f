//! This module defines how the columns of a status dump map to record fields
//!
//! Each section of a status dump starts with a header line listing the labels
//! of its columns, and the set and order of these columns varies from one
//! daemon version to another. So instead of hardcoding column positions, each
//! record type declares a static schema saying which label goes into which
//! field, and with which field parser. When a header is read, the schema is
//! turned into a column plan, which then decodes the section's rows.

use crate::parsers::ValueError;
use tracing::{debug, trace};


/// Function parsing a raw field and storing the result into a record
pub(crate) type Setter<R> = fn(&mut R, &str) -> Result<(), ValueError>;


/// Declare a schema column, optionally with a field parser
///
/// `column!(Client, "Common Name" => common_name)` stores the raw text as-is
/// (through Into, so that Option<String> fields work too), whereas
/// `column!(Client, "Bytes Sent" => bytes_sent via parse_filesize)` runs the
/// text through the given parser first.
///
macro_rules! column {
    ($record:ty, $label:expr => $attribute:ident) => {
        $crate::schema::Column::<$record> {
            label: $label,
            attribute: stringify!($attribute),
            assign: |record: &mut $record, raw: &str|
                        -> Result<(), $crate::parsers::ValueError>
            {
                record.$attribute = raw.to_owned().into();
                Ok(())
            },
        }
    };
    ($record:ty, $label:expr => $attribute:ident via $convert:path) => {
        $crate::schema::Column::<$record> {
            label: $label,
            attribute: stringify!($attribute),
            assign: |record: &mut $record, raw: &str|
                        -> Result<(), $crate::parsers::ValueError>
            {
                record.$attribute = $convert(raw)?.into();
                Ok(())
            },
        }
    };
}


/// Records which can be parsed out of a section of the status dump
pub(crate) trait Record: Default + Sized + 'static {
    /// Static description of the section and its columns
    fn schema() -> &'static Schema<Self>;

    /// Key under which the record is stored in the parsed status
    fn key(&self) -> &str;
}


/// Static description of how a section maps to a record type
pub(crate) struct Schema<R: 'static> {
    /// Label of the section, as found right after HEADER in its header line
    pub section: &'static str,

    /// Known columns, in their usual order of appearance
    pub columns: Vec<Column<R>>,
}
//
impl<R: Record> Schema<R> {
    /// Resolve the labels of a header into a column plan
    ///
    /// The labels are expected to start with the section label, which takes
    /// the place of the tag that starts every row. Labels which the schema does
    /// not know about are skipped, and schema columns which are not in the
    /// header will never be assigned.
    ///
    pub fn plan(&'static self, labels: &[&str]) -> ColumnPlan<R> {
        let mut targets = Vec::new();
        for (index, label) in labels.iter().enumerate().skip(1) {
            match self.columns.iter().find(|column| column.label == *label) {
                Some(column) => {
                    trace!(section = self.section, index,
                           attribute = column.attribute, "mapping column");
                    targets.push((index, column));
                },
                None => debug!(section = self.section, label = *label,
                               "ignoring unknown column"),
            }
        }
        ColumnPlan {
            width: labels.len(),
            targets,
        }
    }
}
///
/// Column of a schema: header label, name of the target field, and setter
pub(crate) struct Column<R> {
    /// Label of the column in the header line
    pub label: &'static str,

    /// Name of the record field which the column fills
    pub attribute: &'static str,

    /// Parser and setter of the record field
    pub assign: Setter<R>,
}


/// Mapping from the fields of a row to the record fields that they fill
pub(crate) struct ColumnPlan<R: 'static> {
    /// Number of fields in a row, leading tag included
    width: usize,

    /// Position of each known column within a row
    targets: Vec<(usize, &'static Column<R>)>,
}
//
impl<R: Record> ColumnPlan<R> {
    /// Number of fields that a row of this section must have
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of row fields which end up in the record
    pub fn mapped_columns(&self) -> usize {
        self.targets.len()
    }

    /// Build a record out of the fields of a row
    ///
    /// The row must have exactly width() fields. If a field parser fails, the
    /// label of the offending column is reported along with the error.
    ///
    pub fn decode(&self, fields: &[&str])
        -> Result<R, (&'static str, ValueError)>
    {
        debug_assert_eq!(fields.len(), self.width);
        let mut record = R::default();
        for &(index, column) in &self.targets {
            (column.assign)(&mut record, fields[index])
                .map_err(|error| (column.label, error))?;
        }
        Ok(record)
    }
}
