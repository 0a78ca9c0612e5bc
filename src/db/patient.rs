//! Patient record repository
//!
//! One row per patient, keyed by name. Only the store worker writes
//! through this repo at runtime; the guarantee is structural (single
//! consumer of the request queue), not enforced here.

use super::DbPool;
use crate::{Error, Result};

/// A stored patient record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientRecord {
    pub name: String,
    pub age: i64,
    pub disease: String,
    pub allergic_foods: Vec<String>,
    pub schedule: Vec<String>,
    pub food_intake: i64,
    pub water_intake: i64,
}

impl PatientRecord {
    /// Spoken summary for a "show my details" request
    #[must_use]
    pub fn spoken_summary(&self) -> String {
        format!(
            "Name: {}, Age: {}, Disease: {}, Allergic Foods: {}, Schedule: {}",
            self.name,
            self.age,
            self.disease,
            join_csv(&self.allergic_foods),
            join_csv(&self.schedule),
        )
    }
}

/// Split a comma-delimited column into trimmed, non-empty entries
#[must_use]
pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join entries back into the delimited column form
#[must_use]
pub fn join_csv(entries: &[String]) -> String {
    entries.join(", ")
}

/// Patient record repository
#[derive(Clone)]
pub struct PatientRepo {
    pool: DbPool,
}

impl PatientRepo {
    /// Create a new patient repository
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a record, replacing any existing row for the same name
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn insert(&self, record: &PatientRecord) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO patients
             (name, age, disease, allergic_food, schedule, food_intake, water_intake)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                record.name,
                record.age,
                record.disease,
                join_csv(&record.allergic_foods),
                join_csv(&record.schedule),
                record.food_intake,
                record.water_intake,
            ],
        )?;

        Ok(())
    }

    /// Set the stored food intake count
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn update_food(&self, count: i64, name: &str) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        conn.execute(
            "UPDATE patients SET food_intake = ?1 WHERE name = ?2",
            rusqlite::params![count, name],
        )?;

        Ok(())
    }

    /// Set the stored water intake count
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn update_water(&self, count: i64, name: &str) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        conn.execute(
            "UPDATE patients SET water_intake = ?1 WHERE name = ?2",
            rusqlite::params![count, name],
        )?;

        Ok(())
    }

    /// Find a record by name (returns None if not found)
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find(&self, name: &str) -> Result<Option<PatientRecord>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let record = conn
            .query_row(
                "SELECT name, age, disease, allergic_food, schedule, food_intake, water_intake
                 FROM patients WHERE name = ?1",
                [name],
                |row| {
                    Ok(PatientRecord {
                        name: row.get(0)?,
                        age: row.get(1)?,
                        disease: row.get(2)?,
                        allergic_foods: split_csv(&row.get::<_, String>(3)?),
                        schedule: split_csv(&row.get::<_, String>(4)?),
                        food_intake: row.get(5)?,
                        water_intake: row.get(6)?,
                    })
                },
            )
            .ok();

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory;

    fn setup() -> PatientRepo {
        let pool = init_memory().unwrap();
        PatientRepo::new(pool)
    }

    fn sample_record() -> PatientRecord {
        PatientRecord {
            name: "ada".to_string(),
            age: 72,
            disease: "hypertension".to_string(),
            allergic_foods: vec!["peanut".to_string(), "shellfish".to_string()],
            schedule: vec!["09:00".to_string(), "14:30".to_string()],
            food_intake: 0,
            water_intake: 0,
        }
    }

    #[test]
    fn test_insert_then_find_roundtrip() {
        let repo = setup();
        let record = sample_record();

        repo.insert(&record).unwrap();
        let found = repo.find("ada").unwrap().unwrap();
        assert_eq!(found, record);
    }

    #[test]
    fn test_find_unknown_returns_none() {
        let repo = setup();
        assert!(repo.find("nobody").unwrap().is_none());
    }

    #[test]
    fn test_insert_same_name_replaces() {
        let repo = setup();
        let mut record = sample_record();

        repo.insert(&record).unwrap();
        record.age = 73;
        repo.insert(&record).unwrap();

        let found = repo.find("ada").unwrap().unwrap();
        assert_eq!(found.age, 73);
    }

    #[test]
    fn test_update_counts() {
        let repo = setup();
        repo.insert(&sample_record()).unwrap();

        repo.update_food(3, "ada").unwrap();
        repo.update_water(5, "ada").unwrap();

        let found = repo.find("ada").unwrap().unwrap();
        assert_eq!(found.food_intake, 3);
        assert_eq!(found.water_intake, 5);
    }

    #[test]
    fn test_update_unknown_name_is_noop() {
        let repo = setup();
        repo.insert(&sample_record()).unwrap();

        repo.update_food(9, "nobody").unwrap();
        let found = repo.find("ada").unwrap().unwrap();
        assert_eq!(found.food_intake, 0);
    }

    #[test]
    fn test_split_csv_trims_and_drops_empty() {
        assert_eq!(
            split_csv("09:00, 14:30,,  18:00 "),
            vec!["09:00", "14:30", "18:00"]
        );
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn test_spoken_summary_contains_fields() {
        let summary = sample_record().spoken_summary();
        assert!(summary.contains("Name: ada"));
        assert!(summary.contains("Age: 72"));
        assert!(summary.contains("peanut, shellfish"));
        assert!(summary.contains("09:00, 14:30"));
    }
}
