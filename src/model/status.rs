//! Status vocabulary: the closed set of values a project's status fields take.
//!
//! Raw values arrive as free text from the store ("Sudah CT", " sudah  ct ",
//! "SUDAH CT" are all the same thing). They are parsed once at the boundary
//! into these enums; nothing past the boundary compares strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A raw status value could not be mapped onto the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    #[error("unknown {field} value: {value:?}")]
    Unknown { field: &'static str, value: String },
}

/// Canonicalize a free-text status value for comparison.
///
/// Trims, lowercases, and collapses internal whitespace runs to one space.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Done / not-yet state of a single checkpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Progress {
    /// "Sudah": the checkpoint is done.
    Sudah,

    /// "Belum": not yet.
    #[default]
    Belum,
}

impl Progress {
    pub const ALL: [Self; 2] = [Self::Sudah, Self::Belum];

    pub fn is_done(self) -> bool {
        self == Self::Sudah
    }
}

/// The five prerequisite checkpoints tracked per project.
///
/// Each shares the Sudah/Belum vocabulary but carries its own noun,
/// so "Sudah CT" is valid for `status_ct` and invalid everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Checkpoint {
    /// `status_ct`.
    Ct,

    /// `status_ut`.
    Ut,

    /// `rekap_boq`: bill-of-quantities recap.
    RekapBoq,

    /// `rekon_material`: material reconciliation.
    RekonMaterial,

    /// `pelurusan_material`: material alignment.
    PelurusanMaterial,
}

impl Checkpoint {
    pub const ALL: [Self; 5] = [
        Self::Ct,
        Self::Ut,
        Self::RekapBoq,
        Self::RekonMaterial,
        Self::PelurusanMaterial,
    ];

    /// Column / field name as stored.
    pub fn field(self) -> &'static str {
        match self {
            Self::Ct => "status_ct",
            Self::Ut => "status_ut",
            Self::RekapBoq => "rekap_boq",
            Self::RekonMaterial => "rekon_material",
            Self::PelurusanMaterial => "pelurusan_material",
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Self::Ct => "CT",
            Self::Ut => "UT",
            Self::RekapBoq => "Rekap",
            Self::RekonMaterial => "Rekon",
            Self::PelurusanMaterial => "Lurus",
        }
    }

    /// Canonical display label, e.g. `"Sudah Rekap"`.
    pub fn label(self, progress: Progress) -> String {
        let prefix = match progress {
            Progress::Sudah => "Sudah",
            Progress::Belum => "Belum",
        };
        format!("{prefix} {}", self.noun())
    }

    /// Parse a raw value for this checkpoint.
    pub fn parse(self, raw: &str) -> Result<Progress, StatusError> {
        let value = normalize(raw);
        Progress::ALL
            .into_iter()
            .find(|p| normalize(&self.label(*p)) == value)
            .ok_or_else(|| StatusError::Unknown {
                field: self.field(),
                value: raw.to_string(),
            })
    }
}

/// Stage of the billing/procurement pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProcurementStatus {
    #[default]
    AntriPeriv,
    ProsesPeriv,
    RevisiMitra,
    SekulerTtd,
    ScanDokumenMitra,
    OtwReg,
}

impl ProcurementStatus {
    pub const FIELD: &'static str = "status_procurement";

    pub const ALL: [Self; 6] = [
        Self::AntriPeriv,
        Self::ProsesPeriv,
        Self::RevisiMitra,
        Self::SekulerTtd,
        Self::ScanDokumenMitra,
        Self::OtwReg,
    ];

    /// Canonical display label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AntriPeriv => "Antri Periv",
            Self::ProsesPeriv => "Proses Periv",
            Self::RevisiMitra => "Revisi Mitra",
            Self::SekulerTtd => "Sekuler TTD",
            Self::ScanDokumenMitra => "Scan Dokumen Mitra",
            Self::OtwReg => "OTW Reg",
        }
    }

    /// Late-stage values that require every checkpoint to be done.
    pub fn is_gated(self) -> bool {
        matches!(self, Self::SekulerTtd | Self::ScanDokumenMitra | Self::OtwReg)
    }

    pub fn parse(raw: &str) -> Result<Self, StatusError> {
        let value = normalize(raw);
        Self::ALL
            .into_iter()
            .find(|s| normalize(s.as_str()) == value)
            .ok_or_else(|| StatusError::Unknown {
                field: Self::FIELD,
                value: raw.to_string(),
            })
    }
}

impl fmt::Display for ProcurementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_lowercases_and_collapses() {
        assert_eq!(normalize("  Sudah   CT "), "sudah ct");
        assert_eq!(normalize("OTW\tReg"), "otw reg");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn checkpoint_parses_case_and_whitespace_variants() {
        assert_eq!(Checkpoint::Ct.parse("Sudah CT"), Ok(Progress::Sudah));
        assert_eq!(Checkpoint::Ct.parse(" sudah ct"), Ok(Progress::Sudah));
        assert_eq!(Checkpoint::Ut.parse("BELUM UT"), Ok(Progress::Belum));
        assert_eq!(
            Checkpoint::PelurusanMaterial.parse("Sudah  Lurus"),
            Ok(Progress::Sudah)
        );
    }

    #[test]
    fn checkpoint_rejects_another_checkpoints_noun() {
        let err = Checkpoint::Ct.parse("Sudah UT").unwrap_err();
        assert_eq!(
            err,
            StatusError::Unknown {
                field: "status_ct",
                value: "Sudah UT".into(),
            }
        );
    }

    #[test]
    fn checkpoint_rejects_empty() {
        assert!(Checkpoint::RekapBoq.parse("  ").is_err());
    }

    #[test]
    fn labels_round_through_parse() {
        for checkpoint in Checkpoint::ALL {
            for progress in Progress::ALL {
                let label = checkpoint.label(progress);
                assert_eq!(checkpoint.parse(&label), Ok(progress), "{label}");
            }
        }
    }

    #[test]
    fn procurement_parses_variants() {
        assert_eq!(
            ProcurementStatus::parse("scan dokumen mitra"),
            Ok(ProcurementStatus::ScanDokumenMitra)
        );
        assert_eq!(
            ProcurementStatus::parse(" otw REG "),
            Ok(ProcurementStatus::OtwReg)
        );
        assert!(ProcurementStatus::parse("Selesai").is_err());
    }

    #[test]
    fn exactly_three_procurement_values_are_gated() {
        let gated: Vec<_> = ProcurementStatus::ALL
            .into_iter()
            .filter(|s| s.is_gated())
            .collect();
        assert_eq!(
            gated,
            vec![
                ProcurementStatus::SekulerTtd,
                ProcurementStatus::ScanDokumenMitra,
                ProcurementStatus::OtwReg,
            ]
        );
    }
}
