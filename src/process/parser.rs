//! Label-keyed parsing for line-oriented per-process files such as `/proc/<pid>/status`.
//!
//! Implementors map a closed set of labels onto a typed field enum. Lines whose label is
//! not recognised are skipped; a recognised label with a missing or non-numeric payload is
//! an error.

use std::collections::HashSet;
use std::hash::Hash;
use std::io::BufRead;

use super::StatParseError;

pub trait LabeledStat: Default {
    /// The recognised fields.
    type Field: Copy + Eq + Hash;

    /// Number of distinct fields; parsing stops once all of them were seen.
    const FIELD_COUNT: usize;

    /// Maps a label as it appears in the file (including any trailing `:`) to its field.
    fn field_for(label: &str) -> Option<Self::Field>;

    /// Name used in error messages.
    fn field_name(field: Self::Field) -> &'static str;

    fn set(&mut self, field: Self::Field, value: u64);

    /// Parses a buffer line by line into `Self`.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::Io`] if reading fails, [`StatParseError::MissingValue`] or
    /// [`StatParseError::InvalidKeyValue`] if a recognised label carries no parsable number,
    /// and [`StatParseError::DuplicateField`] if a label repeats.
    fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut stat = Self::default();
        let mut seen_fields = HashSet::with_capacity(Self::FIELD_COUNT);

        let mut line = String::new();
        let mut lineno = 0;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            Self::parse_line(&mut stat, &line, lineno, &mut seen_fields)?;
            if seen_fields.len() == Self::FIELD_COUNT {
                break;
            }

            line.clear();
        }

        Ok(stat)
    }

    fn parse_line(
        stat: &mut Self,
        line: &str,
        lineno: usize,
        seen_fields: &mut HashSet<Self::Field>,
    ) -> Result<(), StatParseError> {
        let mut parts = line.split_whitespace();
        let Some(field) = parts.next().and_then(Self::field_for) else {
            return Ok(());
        };
        let name = Self::field_name(field);

        let value = parts.next().ok_or(StatParseError::MissingValue {
            field: name,
            line: lineno,
        })?;
        let parsed = value
            .parse::<u64>()
            .map_err(|source| StatParseError::InvalidKeyValue {
                field: name,
                value: value.to_owned(),
                line: lineno,
                source,
            })?;
        if !seen_fields.insert(field) {
            return Err(StatParseError::DuplicateField {
                field: name,
                line: lineno,
            });
        }

        stat.set(field, parsed);
        Ok(())
    }
}
