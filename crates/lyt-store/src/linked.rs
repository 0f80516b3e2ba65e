//! The shared containment store.
//!
//! While a layout is loaded its containments live here as well as in its
//! own file. A clean shutdown empties the store; rows that survive to the
//! next start mean the previous run never released its layouts.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};

use crate::error::Result;
use crate::layout_file::{ContainmentEntry, LayoutFile};
use crate::schema;

pub struct LinkedStore {
    conn: Connection,
}

impl LinkedStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Record a loaded layout and its containments, replacing any previous
    /// record for the same layout.
    pub fn link(&self, layout: &str, path: &Path, containments: &[ContainmentEntry]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM linked_layouts WHERE layout = ?1", [layout])?;
        tx.execute(
            "INSERT INTO linked_layouts (layout, path) VALUES (?1, ?2)",
            params![layout, path.to_string_lossy()],
        )?;
        {
            let mut insert = tx.prepare(
                "INSERT OR REPLACE INTO containments (id, layout, plugin) VALUES (?1, ?2, ?3)",
            )?;
            for c in containments {
                insert.execute(params![c.id, layout, c.plugin])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn is_linked(&self, layout: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM linked_layouts WHERE layout = ?1",
            [layout],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn containments_of(&self, layout: &str) -> Result<Vec<ContainmentEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, plugin FROM containments WHERE layout = ?1 ORDER BY rowid")?;
        let rows: Vec<ContainmentEntry> = stmt
            .query_map([layout], |row| {
                Ok(ContainmentEntry {
                    id: row.get(0)?,
                    plugin: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(rows)
    }

    /// Linked layouts with their file paths, in link order.
    pub fn linked_layouts(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT layout, path FROM linked_layouts ORDER BY rowid")?;
        let rows: Vec<(String, PathBuf)> = stmt
            .query_map([], |row| {
                let layout: String = row.get(0)?;
                let path: String = row.get(1)?;
                Ok((layout, PathBuf::from(path)))
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(rows)
    }

    /// Delete containment rows. A layout left without containments is
    /// unlinked. Returns the number of rows removed.
    pub fn delete_containments(&self, ids: &[String]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut removed = 0;
        {
            let mut delete = tx.prepare("DELETE FROM containments WHERE id = ?1")?;
            for id in ids {
                removed += delete.execute([id])?;
            }
        }
        tx.execute(
            "DELETE FROM linked_layouts
             WHERE layout NOT IN (SELECT DISTINCT layout FROM containments)",
            [],
        )?;
        tx.commit()?;
        Ok(removed)
    }

    /// Forget everything. Called on clean shutdown.
    pub fn clear(&self) -> Result<()> {
        self.conn
            .execute_batch("DELETE FROM containments; DELETE FROM linked_layouts;")?;
        Ok(())
    }

    /// Write every surviving linked layout back to its own file and clear
    /// the store. Returns the names of the layouts written back.
    pub fn check_repair(&self) -> Result<Vec<String>> {
        let linked = self.linked_layouts()?;
        let mut repaired = Vec::new();

        for (layout, path) in linked {
            let containments = self.containments_of(&layout)?;
            match LayoutFile::read(&path) {
                Ok(mut file) => {
                    file.containments = containments;
                    file.write(&path)?;
                    tracing::warn!("restored containments of '{layout}' from the linked store");
                }
                Err(e) => tracing::warn!("cannot repair '{layout}' at {}: {e}", path.display()),
            }
            repaired.push(layout);
        }

        self.clear()?;
        Ok(repaired)
    }
}
