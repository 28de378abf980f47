use std::cmp::Ordering;
use std::path::Path;

use anyhow::Result;
use itertools::Itertools;
use rusqlite::{Connection, OptionalExtension, Transaction};

use crate::journey::SavedJourney;

/* The journey store. One user curates a short list of saved journeys, so the
list lives as a single serialized value in a key-value slot rather than as
relational rows. The `metadata` table records the schema version so the slot
format can migrate later. */

const JOURNEYS_KEY: &str = "roampilot_routes";

fn init_metadata_and_get_version(tx: &Transaction) -> Result<i32> {
    tx.execute(
        "CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY NOT NULL UNIQUE,
            value TEXT
        );",
        (),
    )?;
    let version: Option<String> = tx
        .query_row(
            "SELECT value FROM metadata WHERE key = 'version';",
            [],
            |row| row.get(0),
        )
        .optional()?;
    match version {
        None => Ok(0),
        Some(value) => Ok(value.parse()?),
    }
}

fn set_version_in_metadata(tx: &Transaction, version: i32) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('version', ?1);",
        (version.to_string(),),
    )?;
    Ok(())
}

#[allow(clippy::type_complexity)]
fn open_db_and_run_migration(
    support_dir: &str,
    file_name: &str,
    migrations: &[&dyn Fn(&Transaction) -> Result<()>],
) -> Result<Connection> {
    debug!("open and run migration for {}", file_name);
    let mut conn = rusqlite::Connection::open(Path::new(support_dir).join(file_name))?;
    let tx = conn.transaction()?;

    let version = init_metadata_and_get_version(&tx)? as usize;
    let target_version = migrations.len();
    debug!(
        "current version = {}, target_version = {}",
        version, target_version
    );
    match version.cmp(&target_version) {
        Ordering::Equal => (),
        Ordering::Less => {
            for i in version..target_version {
                info!("running migration for version: {}", i + 1);
                let f = migrations.get(i).unwrap();
                f(&tx)?;
            }
            set_version_in_metadata(&tx, target_version as i32)?;
        }
        Ordering::Greater => {
            bail!(
                "version too high: current version = {}, target_version = {}",
                version,
                target_version
            );
        }
    }
    tx.commit()?;
    Ok(conn)
}

pub struct RouteStore {
    conn: Connection,
}

impl RouteStore {
    pub fn open(support_dir: &str) -> Result<RouteStore> {
        let conn = open_db_and_run_migration(
            support_dir,
            "routes.db",
            &[&|tx| {
                let sql = "
                CREATE TABLE store (
                    key               TEXT    PRIMARY KEY
                                              NOT NULL
                                              UNIQUE,
                    value             TEXT
                );
                ";
                for s in sql_split::split(sql) {
                    tx.execute(&s, ())?;
                }
                Ok(())
            }],
        )?;
        Ok(RouteStore { conn })
    }

    /// Every saved journey, in insertion order. A missing, unreadable or
    /// corrupt slot reads as an empty list; it never fails the caller.
    pub fn list_journeys(&mut self) -> Vec<SavedJourney> {
        match self.read_slot() {
            Ok(journeys) => journeys,
            Err(error) => {
                warn!(
                    "[route_store.list_journeys] degrading to empty list, error:{}",
                    error
                );
                Vec::new()
            }
        }
    }

    /// Append one finalized journey to the slot.
    pub fn append(&mut self, journey: &SavedJourney) -> Result<()> {
        let mut journeys = self.list_journeys();
        journeys.push(journey.clone());
        self.write_slot(&journeys)?;
        info!(
            "journey appended: created_at={}, total={}",
            journey.created_at_ms,
            journeys.len()
        );
        Ok(())
    }

    /// Drop every journey stamped with `created_at_ms`. A timestamp with no
    /// match is a no-op.
    pub fn remove(&mut self, created_at_ms: i64) -> Result<()> {
        let journeys = self.list_journeys();
        let remaining = journeys
            .into_iter()
            .filter(|journey| journey.created_at_ms != created_at_ms)
            .collect_vec();
        self.write_slot(&remaining)?;
        Ok(())
    }

    fn read_slot(&mut self) -> Result<Vec<SavedJourney>> {
        let tx = self.conn.transaction()?;
        let mut query = tx.prepare("SELECT value FROM store WHERE key = ?1;")?;
        let result: Option<String> = query
            .query_row([JOURNEYS_KEY], |row| row.get(0))
            .optional()?;
        match result {
            None => Ok(Vec::new()),
            Some(raw) => Ok(serde_json::from_str(&raw)?),
        }
    }

    fn write_slot(&mut self, journeys: &[SavedJourney]) -> Result<()> {
        let serialized = serde_json::to_string(journeys)?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO store (key, value) VALUES (?1, ?2);",
            (JOURNEYS_KEY, serialized),
        )?;
        tx.commit()?;
        Ok(())
    }
}
