//! Local `SQLite` store: one table, one row per project.

use std::{fs, path::Path};

use jiff::{Timestamp, civil::Date};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{ProjectStore, Result, StoreError};
use crate::classify::CardStats;
use crate::model::{DurationDays, Priority, Project, ProjectPatch, ProjectRecord};
use crate::workflow;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS project (
        pid                  TEXT PRIMARY KEY,
        nama_proyek          TEXT NOT NULL DEFAULT '',
        status_ct            TEXT NOT NULL,
        status_ut            TEXT NOT NULL,
        rekap_boq            TEXT NOT NULL,
        rekon_material       TEXT NOT NULL,
        pelurusan_material   TEXT NOT NULL,
        status_procurement   TEXT NOT NULL,
        estimasi_durasi_hari INTEGER NOT NULL DEFAULT 7
                             CHECK (estimasi_durasi_hari BETWEEN 1 AND 365),
        tanggal_mulai        TEXT,
        timer_selesai_pada   TEXT,
        prioritas            INTEGER CHECK (prioritas IN (1, 2, 3)),
        created_at           TEXT NOT NULL
    );";

const COLUMNS: &str = "pid, nama_proyek, status_ct, status_ut, rekap_boq, rekon_material,
     pelurusan_material, status_procurement, estimasi_durasi_hari, tanggal_mulai,
     timer_selesai_pada, prioritas, created_at";

/// Card counts computed in SQL, independently of the engine's classifier.
///
/// Relies on rows holding canonical labels, which `create` and `update` guarantee.
const CARD_STATS: &str = "
    WITH p AS (
        SELECT
            LOWER(TRIM(status_procurement)) = 'revisi mitra' AS delayed,
            LOWER(TRIM(status_ct)) = 'sudah ct'
                AND LOWER(TRIM(status_ut)) = 'sudah ut'
                AND LOWER(TRIM(rekap_boq)) = 'sudah rekap'
                AND LOWER(TRIM(rekon_material)) = 'sudah rekon'
                AND LOWER(TRIM(pelurusan_material)) = 'sudah lurus'
                AND LOWER(TRIM(status_procurement)) = 'otw reg' AS completed,
            LOWER(TRIM(rekap_boq)) = 'belum rekap' AS not_recon
        FROM project
    )
    SELECT
        COUNT(*),
        COALESCE(SUM(completed AND NOT delayed), 0),
        COALESCE(SUM(NOT completed AND NOT delayed), 0),
        COALESCE(SUM(delayed), 0),
        COALESCE(SUM(not_recon), 0)
    FROM p";

/// A [`ProjectStore`] backed by a single `SQLite` file.
///
/// Enforces the procurement gate on writes, like a remote service would.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    fn load(conn: &Connection, pid: &str) -> Result<ProjectRecord> {
        let sql = format!("SELECT {COLUMNS} FROM project WHERE pid = ?1");
        let row = conn
            .query_row(&sql, [pid], read_row)
            .optional()?
            .ok_or_else(|| StoreError::NotFound(pid.to_string()))?;
        into_record(row)
    }

    fn write(conn: &Connection, record: &ProjectRecord) -> Result<()> {
        conn.execute(
            "UPDATE project
             SET nama_proyek = ?2, status_ct = ?3, status_ut = ?4, rekap_boq = ?5,
                 rekon_material = ?6, pelurusan_material = ?7, status_procurement = ?8,
                 estimasi_durasi_hari = ?9, tanggal_mulai = ?10, timer_selesai_pada = ?11,
                 prioritas = ?12
             WHERE pid = ?1",
            params![
                record.pid,
                record.nama_proyek,
                record.status_ct,
                record.status_ut,
                record.rekap_boq,
                record.rekon_material,
                record.pelurusan_material,
                record.status_procurement,
                record.estimasi_durasi_hari,
                record.tanggal_mulai.map(|d| d.to_string()),
                record.timer_selesai_pada.map(|t| t.to_string()),
                record.prioritas,
            ],
        )?;
        Ok(())
    }
}

impl ProjectStore for SqliteStore {
    fn list(&self) -> Result<Vec<ProjectRecord>> {
        let sql = format!("SELECT {COLUMNS} FROM project ORDER BY created_at DESC, pid");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(into_record(row?)?);
        }
        Ok(records)
    }

    fn get(&self, pid: &str) -> Result<ProjectRecord> {
        Self::load(&self.conn, pid)
    }

    /// Inserts a new row. Statuses are stored as canonical labels.
    fn create(&self, record: &ProjectRecord) -> Result<()> {
        DurationDays::new(record.estimasi_durasi_hari)
            .map_err(|e| StoreError::Rejected(e.to_string()))?;
        let project =
            Project::try_from(record.clone()).map_err(|e| StoreError::Rejected(e.to_string()))?;
        let record = &ProjectRecord::from(&project);

        let exists = self
            .conn
            .query_row("SELECT 1 FROM project WHERE pid = ?1", [&record.pid], |_| {
                Ok(())
            })
            .optional()?
            .is_some();
        if exists {
            return Err(StoreError::AlreadyExists(record.pid.clone()));
        }
        let sql = format!(
            "INSERT INTO project ({COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
        );
        self.conn.execute(
            &sql,
            params![
                record.pid,
                record.nama_proyek,
                record.status_ct,
                record.status_ut,
                record.rekap_boq,
                record.rekon_material,
                record.pelurusan_material,
                record.status_procurement,
                record.estimasi_durasi_hari,
                record.tanggal_mulai.map(|d| d.to_string()),
                record.timer_selesai_pada.map(|t| t.to_string()),
                record.prioritas,
                record.created_at.to_string(),
            ],
        )?;
        Ok(())
    }

    fn update(&self, pid: &str, patch: &ProjectPatch) -> Result<ProjectRecord> {
        let tx = self.conn.unchecked_transaction()?;
        let current = Self::load(&tx, pid)?;
        let mut project =
            Project::try_from(current).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        workflow::check_patch(&project, patch).map_err(|e| StoreError::Rejected(e.to_string()))?;
        patch.apply(&mut project);

        let record = ProjectRecord::from(&project);
        Self::write(&tx, &record)?;
        tx.commit()?;
        Ok(record)
    }

    fn set_priority(&self, pid: &str, priority: Option<Priority>) -> Result<ProjectRecord> {
        let rows = self.conn.execute(
            "UPDATE project SET prioritas = ?1 WHERE pid = ?2",
            params![priority.map(Priority::level), pid],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound(pid.to_string()));
        }
        Self::load(&self.conn, pid)
    }

    fn set_priority_bulk(&self, pids: &[String], priority: Option<Priority>) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut updated = 0;
        {
            let mut stmt = tx.prepare("UPDATE project SET prioritas = ?1 WHERE pid = ?2")?;
            for pid in pids {
                if stmt.execute(params![priority.map(Priority::level), pid])? == 0 {
                    // Dropping `tx` without commit rolls back the rows already touched.
                    return Err(StoreError::NotFound(pid.clone()));
                }
                updated += 1;
            }
        }
        tx.commit()?;
        Ok(updated)
    }

    fn card_stats(&self) -> Result<CardStats> {
        let counts = self.conn.query_row(CARD_STATS, [], |row| {
            Ok([
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
            ])
        })?;
        let [total, completed, ongoing, delayed, not_recon] = counts.map(|n| {
            usize::try_from(n).map_err(|_| StoreError::Corrupt(format!("negative count {n}")))
        });
        Ok(CardStats {
            total: total?,
            completed: completed?,
            ongoing: ongoing?,
            delayed: delayed?,
            not_recon: not_recon?,
        })
    }
}

/// Raw column values, before date parsing.
struct RawRow {
    record: ProjectRecord,
    tanggal_mulai: Option<String>,
    timer_selesai_pada: Option<String>,
    created_at: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        record: ProjectRecord {
            pid: row.get(0)?,
            nama_proyek: row.get(1)?,
            status_ct: row.get(2)?,
            status_ut: row.get(3)?,
            rekap_boq: row.get(4)?,
            rekon_material: row.get(5)?,
            pelurusan_material: row.get(6)?,
            status_procurement: row.get(7)?,
            estimasi_durasi_hari: row.get(8)?,
            tanggal_mulai: None,
            timer_selesai_pada: None,
            prioritas: row.get(11)?,
            created_at: Timestamp::UNIX_EPOCH,
        },
        tanggal_mulai: row.get(9)?,
        timer_selesai_pada: row.get(10)?,
        created_at: row.get(12)?,
    })
}

fn into_record(raw: RawRow) -> Result<ProjectRecord> {
    let RawRow {
        mut record,
        tanggal_mulai,
        timer_selesai_pada,
        created_at,
    } = raw;

    record.tanggal_mulai = tanggal_mulai
        .map(|s| s.parse::<Date>())
        .transpose()
        .map_err(|e| StoreError::Corrupt(format!("invalid tanggal_mulai: {e}")))?;
    record.timer_selesai_pada = timer_selesai_pada
        .map(|s| s.parse::<Timestamp>())
        .transpose()
        .map_err(|e| StoreError::Corrupt(format!("invalid timer_selesai_pada: {e}")))?;
    record.created_at = created_at
        .parse::<Timestamp>()
        .map_err(|e| StoreError::Corrupt(format!("invalid created_at: {e}")))?;
    Ok(record)
}
