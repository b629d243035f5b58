//! Memory figures from `/proc/<pid>/status`.
//!
//! Only two labels are of interest:
//!
//! ```text
//! VmSize:	  316964 kB
//! VmRSS:	    1024 kB
//! ```
//!
//! Both values are reported in kibibytes and converted to bytes by the caller.

use super::StatParseError;
use super::parser::LabeledStat;

/// Recognised memory labels of the status document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryField {
    /// `VmRSS`, resident set size.
    Resident,
    /// `VmSize`, virtual size.
    Virtual,
}

impl MemoryField {
    pub fn label(self) -> &'static str {
        match self {
            MemoryField::Resident => "VmRSS:",
            MemoryField::Virtual => "VmSize:",
        }
    }

    /// Name of the metric the field is stored under.
    pub fn metric(self) -> &'static str {
        match self {
            MemoryField::Resident => super::RSS,
            MemoryField::Virtual => super::VSZ,
        }
    }
}

/// Parsed memory section of a status document, values in kibibytes.
///
/// Kernel threads have no memory map and therefore no `Vm*` lines, in which case both
/// fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStatus {
    pub rss_kib: Option<u64>,
    pub vsz_kib: Option<u64>,
}

impl MemoryStatus {
    /// Present fields converted to bytes, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::OutOfRange`] if a value does not fit an `i64` in bytes.
    pub fn bytes(&self) -> Result<Vec<(MemoryField, i64)>, StatParseError> {
        [
            (MemoryField::Resident, self.rss_kib),
            (MemoryField::Virtual, self.vsz_kib),
        ]
        .into_iter()
        .filter_map(|(field, kib)| kib.map(|kib| (field, kib)))
        .map(|(field, kib)| {
            kib_to_bytes(kib)
                .map(|bytes| (field, bytes))
                .ok_or(StatParseError::OutOfRange {
                    field: field.label(),
                    value: kib,
                })
        })
        .collect()
    }
}

impl LabeledStat for MemoryStatus {
    type Field = MemoryField;
    const FIELD_COUNT: usize = 2;

    fn field_for(label: &str) -> Option<MemoryField> {
        match label {
            "VmRSS:" => Some(MemoryField::Resident),
            "VmSize:" => Some(MemoryField::Virtual),
            _ => None,
        }
    }

    fn field_name(field: MemoryField) -> &'static str {
        field.label()
    }

    fn set(&mut self, field: MemoryField, value: u64) {
        match field {
            MemoryField::Resident => self.rss_kib = Some(value),
            MemoryField::Virtual => self.vsz_kib = Some(value),
        }
    }
}

/// Converts a kibibyte reading to bytes, `None` on overflow.
pub fn kib_to_bytes(kib: u64) -> Option<i64> {
    i64::try_from(kib).ok()?.checked_mul(1024)
}
