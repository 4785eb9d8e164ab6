use crate::error::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Whole-table operation applied to every record of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOperation {
    /// Write every record into the target table.
    Copy,
    /// Delete every record from the table.
    Clear,
    /// Count records, optionally collecting size statistics.
    Count,
    /// Write every record through the geo client to build its spatial index.
    DeriveGeoIndex,
}

impl ScanOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanOperation::Copy => "copy",
            ScanOperation::Clear => "clear",
            ScanOperation::Count => "count",
            ScanOperation::DeriveGeoIndex => "gen_geo",
        }
    }
}

impl fmt::Display for ScanOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanOperation {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "copy" => Ok(ScanOperation::Copy),
            "clear" => Ok(ScanOperation::Clear),
            "count" => Ok(ScanOperation::Count),
            "gen_geo" => Ok(ScanOperation::DeriveGeoIndex),
            other => Err(ParseEnumError::new("scan operation", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_geo_alias() {
        let op: ScanOperation = "gen_geo".parse().unwrap();
        assert_eq!(op, ScanOperation::DeriveGeoIndex);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "truncate".parse::<ScanOperation>().unwrap_err();
        assert_eq!(err.to_string(), "unknown scan operation 'truncate'");
    }
}
