//! Project types: the unit the engine operates on.

use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};

use super::status::{Checkpoint, ProcurementStatus, Progress, StatusError};
use crate::error::EngineError;

/// A billing project, parsed and canonical.
///
/// Built from a [`ProjectRecord`] at the store boundary. Every status field
/// is a closed enum here; raw strings never travel past [`Project::try_from`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Business identifier. Stable and unique; the selection key.
    pub pid: String,

    pub nama_proyek: String,

    pub status_ct: Progress,
    pub status_ut: Progress,
    pub rekap_boq: Progress,
    pub rekon_material: Progress,
    pub pelurusan_material: Progress,
    pub status_procurement: ProcurementStatus,

    /// Duration as stored. Zero means "not configured" and reads as overdue.
    /// Writes go through [`DurationDays`].
    pub estimasi_durasi_hari: u32,

    /// Start date. Time of day never contributes to countdowns.
    pub tanggal_mulai: Option<Date>,

    /// Manual completion marker, independent of the countdown.
    pub timer_selesai_pada: Option<Timestamp>,

    pub prioritas: Option<Priority>,

    /// Stable ordering key.
    pub created_at: Timestamp,
}

impl Project {
    /// A fresh project: every checkpoint "Belum", queued for procurement, no priority.
    pub fn new(
        pid: impl Into<String>,
        nama_proyek: impl Into<String>,
        duration: DurationDays,
        created_at: Timestamp,
    ) -> Self {
        Self {
            pid: pid.into(),
            nama_proyek: nama_proyek.into(),
            status_ct: Progress::Belum,
            status_ut: Progress::Belum,
            rekap_boq: Progress::Belum,
            rekon_material: Progress::Belum,
            pelurusan_material: Progress::Belum,
            status_procurement: ProcurementStatus::AntriPeriv,
            estimasi_durasi_hari: duration.get(),
            tanggal_mulai: None,
            timer_selesai_pada: None,
            prioritas: None,
            created_at,
        }
    }

    pub fn checkpoint(&self, checkpoint: Checkpoint) -> Progress {
        match checkpoint {
            Checkpoint::Ct => self.status_ct,
            Checkpoint::Ut => self.status_ut,
            Checkpoint::RekapBoq => self.rekap_boq,
            Checkpoint::RekonMaterial => self.rekon_material,
            Checkpoint::PelurusanMaterial => self.pelurusan_material,
        }
    }

    pub fn set_checkpoint(&mut self, checkpoint: Checkpoint, progress: Progress) {
        let slot = match checkpoint {
            Checkpoint::Ct => &mut self.status_ct,
            Checkpoint::Ut => &mut self.status_ut,
            Checkpoint::RekapBoq => &mut self.rekap_boq,
            Checkpoint::RekonMaterial => &mut self.rekon_material,
            Checkpoint::PelurusanMaterial => &mut self.pelurusan_material,
        };
        *slot = progress;
    }
}

/// Manual urgency tier. `P1` is the most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    P1,
    P2,
    P3,
}

impl Priority {
    pub fn level(self) -> u8 {
        match self {
            Self::P1 => 1,
            Self::P2 => 2,
            Self::P3 => 3,
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::P1),
            2 => Some(Self::P2),
            3 => Some(Self::P3),
            _ => None,
        }
    }

    /// Display label, e.g. `"Prioritas 1"`.
    pub fn label(self) -> String {
        format!("Prioritas {}", self.level())
    }
}

/// A validated duration in days, within `1..=365`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DurationDays(u32);

impl DurationDays {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 365;

    pub fn new(days: i64) -> Result<Self, EngineError> {
        u32::try_from(days)
            .ok()
            .filter(|d| (Self::MIN..=Self::MAX).contains(d))
            .map(Self)
            .ok_or_else(|| {
                EngineError::InvalidDuration(format!(
                    "{days} is outside {}..={}",
                    Self::MIN,
                    Self::MAX
                ))
            })
    }

    /// Parse user input. Non-numeric input is rejected like an out-of-range value.
    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        let days = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| EngineError::InvalidDuration(format!("{raw:?} is not a number")))?;
        Self::new(days)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for DurationDays {
    fn default() -> Self {
        Self(7)
    }
}

/// A partial update, keyed externally by PID.
///
/// `None` leaves a field untouched. The nested options on the date and
/// marker fields distinguish "leave alone" from "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub checkpoints: Vec<(Checkpoint, Progress)>,
    pub status_procurement: Option<ProcurementStatus>,
    pub estimasi_durasi_hari: Option<DurationDays>,
    pub tanggal_mulai: Option<Option<Date>>,
    pub timer_selesai_pada: Option<Option<Timestamp>>,
}

impl ProjectPatch {
    pub fn checkpoint(checkpoint: Checkpoint, progress: Progress) -> Self {
        Self {
            checkpoints: vec![(checkpoint, progress)],
            ..Self::default()
        }
    }

    pub fn procurement(status: ProcurementStatus) -> Self {
        Self {
            status_procurement: Some(status),
            ..Self::default()
        }
    }

    /// Apply the patch in place. Gate checks happen before this is called.
    pub fn apply(&self, project: &mut Project) {
        for (checkpoint, progress) in &self.checkpoints {
            project.set_checkpoint(*checkpoint, *progress);
        }
        if let Some(status) = self.status_procurement {
            project.status_procurement = status;
        }
        if let Some(duration) = self.estimasi_durasi_hari {
            project.estimasi_durasi_hari = duration.get();
        }
        if let Some(start) = self.tanggal_mulai {
            project.tanggal_mulai = start;
        }
        if let Some(marker) = self.timer_selesai_pada {
            project.timer_selesai_pada = marker;
        }
    }
}

/// The storage/wire shape of a project: statuses as raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub pid: String,
    #[serde(default)]
    pub nama_proyek: String,
    pub status_ct: String,
    pub status_ut: String,
    pub rekap_boq: String,
    pub rekon_material: String,
    pub pelurusan_material: String,
    pub status_procurement: String,
    pub estimasi_durasi_hari: i64,
    pub tanggal_mulai: Option<Date>,
    pub timer_selesai_pada: Option<Timestamp>,
    pub prioritas: Option<u8>,
    pub created_at: Timestamp,
}

impl TryFrom<ProjectRecord> for Project {
    type Error = StatusError;

    fn try_from(record: ProjectRecord) -> Result<Self, Self::Error> {
        let prioritas = match record.prioritas {
            None => None,
            Some(level) => Some(Priority::from_level(level).ok_or_else(|| {
                StatusError::Unknown {
                    field: "prioritas",
                    value: level.to_string(),
                }
            })?),
        };

        Ok(Self {
            status_ct: Checkpoint::Ct.parse(&record.status_ct)?,
            status_ut: Checkpoint::Ut.parse(&record.status_ut)?,
            rekap_boq: Checkpoint::RekapBoq.parse(&record.rekap_boq)?,
            rekon_material: Checkpoint::RekonMaterial.parse(&record.rekon_material)?,
            pelurusan_material: Checkpoint::PelurusanMaterial
                .parse(&record.pelurusan_material)?,
            status_procurement: ProcurementStatus::parse(&record.status_procurement)?,
            // Out-of-range durations are legacy garbage; treat them as unconfigured.
            estimasi_durasi_hari: u32::try_from(record.estimasi_durasi_hari)
                .ok()
                .filter(|d| *d <= DurationDays::MAX)
                .unwrap_or(0),
            tanggal_mulai: record.tanggal_mulai,
            timer_selesai_pada: record.timer_selesai_pada,
            prioritas,
            created_at: record.created_at,
            pid: record.pid,
            nama_proyek: record.nama_proyek,
        })
    }
}

impl From<&Project> for ProjectRecord {
    fn from(project: &Project) -> Self {
        Self {
            pid: project.pid.clone(),
            nama_proyek: project.nama_proyek.clone(),
            status_ct: Checkpoint::Ct.label(project.status_ct),
            status_ut: Checkpoint::Ut.label(project.status_ut),
            rekap_boq: Checkpoint::RekapBoq.label(project.rekap_boq),
            rekon_material: Checkpoint::RekonMaterial.label(project.rekon_material),
            pelurusan_material: Checkpoint::PelurusanMaterial.label(project.pelurusan_material),
            status_procurement: project.status_procurement.as_str().to_string(),
            estimasi_durasi_hari: i64::from(project.estimasi_durasi_hari),
            tanggal_mulai: project.tanggal_mulai,
            timer_selesai_pada: project.timer_selesai_pada,
            prioritas: project.prioritas.map(Priority::level),
            created_at: project.created_at,
        }
    }
}
