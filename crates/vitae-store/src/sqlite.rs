//! SQLite-backed store for accounts, personal details, CV sections and lookups.
//!
//! A single connection behind a mutex; every section query is scoped by
//! `user_id` so one user's rows are never visible to another.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::schema::{ACCOUNT_SCHEMA_SQL, LOOKUP_SCHEMA_SQL, SECTION_SCHEMA_SQL};
use crate::section::{Certification, Education, Employment, Patent, Publication, Section};
use crate::types::*;
use vitae_core::{Error, Result};

/// SQLite store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl SqliteStore {
    /// Open or create the database file, creating parent directories.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
        }

        let conn = Self::create_connection(&db_path)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let stats = store.get_stats()?;
        info!(
            "SqliteStore initialized: {} users ({} confirmed), {} lookups, path={}",
            stats.users,
            stats.confirmed_users,
            stats.lookups,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        let full_schema = format!(
            "{}\n{}\n{}",
            ACCOUNT_SCHEMA_SQL, SECTION_SCHEMA_SQL, LOOKUP_SCHEMA_SQL
        );
        conn.execute_batch(&full_schema)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------

    /// Insert a user. Returns the new user ID.
    pub fn create_user(&self, user: NewUser) -> Result<i64> {
        let email = normalize_email(&user.email);
        let now = Utc::now();

        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO users (email, password_hash, registered_on, admin, confirmed, confirmed_on) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .map_err(db_err)?
            .insert(params![
                email,
                user.password_hash,
                now,
                user.admin,
                user.confirmed,
                user.confirmed_on,
            ])
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::Duplicate(email.clone())
                } else {
                    db_err(e)
                }
            })?;
        debug!("Created user {} ({})", id, email);
        Ok(id)
    }

    /// Get a user by ID.
    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM users WHERE id = ?1")
            .map_err(db_err)?
            .query_row(params![user_id], Self::row_to_user)
            .optional()
            .map_err(db_err)?;
        Ok(row)
    }

    /// Find a user by email (case-insensitive).
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM users WHERE email = ?1")
            .map_err(db_err)?
            .query_row(params![normalize_email(email)], Self::row_to_user)
            .optional()
            .map_err(db_err)?;
        Ok(row)
    }

    /// Replace a user's password hash.
    pub fn update_password(&self, user_id: i64, password_hash: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "UPDATE users SET password_hash = ?1 WHERE id = ?2",
                params![password_hash, user_id],
            )
            .map_err(db_err)?;
        Ok(count > 0)
    }

    /// Mark a user's email as confirmed.
    pub fn confirm_user(&self, user_id: i64, at: DateTime<Utc>) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "UPDATE users SET confirmed = 1, confirmed_on = ?1 WHERE id = ?2",
                params![at, user_id],
            )
            .map_err(db_err)?;
        Ok(count > 0)
    }

    /// Make sure an admin account exists for `email`.
    ///
    /// Creates a confirmed admin when the email is unknown, otherwise
    /// promotes the existing account. Returns the user ID.
    pub fn ensure_admin(&self, email: &str, password_hash: &str) -> Result<i64> {
        if let Some(user) = self.find_user_by_email(email)? {
            if !user.admin {
                let conn = self.conn.lock();
                conn.execute("UPDATE users SET admin = 1 WHERE id = ?1", params![user.id])
                    .map_err(db_err)?;
                info!("Promoted {} to admin", user.email);
            }
            return Ok(user.id);
        }

        let id = self.create_user(NewUser {
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            admin: true,
            confirmed: true,
            confirmed_on: Some(Utc::now()),
        })?;
        info!("Created admin account {}", normalize_email(email));
        Ok(id)
    }

    /// Count users, optionally only confirmed ones.
    pub fn count_users(&self, confirmed_only: bool) -> Result<i64> {
        let sql = if confirmed_only {
            "SELECT COUNT(*) FROM users WHERE confirmed = 1"
        } else {
            "SELECT COUNT(*) FROM users"
        };
        let conn = self.conn.lock();
        conn.query_row(sql, [], |row| row.get(0)).map_err(db_err)
    }

    // ---------------------------------------------------------------
    // Personal details
    // ---------------------------------------------------------------

    /// Get a user's personal details, if saved.
    pub fn get_personal(&self, user_id: i64) -> Result<Option<PersonalDetails>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM personal_details WHERE user_id = ?1")
            .map_err(db_err)?
            .query_row(params![user_id], Self::row_to_personal)
            .optional()
            .map_err(db_err)?;
        Ok(row)
    }

    /// Insert or replace a user's personal details.
    pub fn save_personal(&self, user_id: i64, details: &PersonalDetails) -> Result<()> {
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO personal_details (user_id, firstname, surname, initials, maiden_name, \
             id_type, id_number, race, gender, birthdate, alt_email, telno, notification, \
             fulltime_student, current_org, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16) \
             ON CONFLICT(user_id) DO UPDATE SET \
             firstname = excluded.firstname, surname = excluded.surname, \
             initials = excluded.initials, maiden_name = excluded.maiden_name, \
             id_type = excluded.id_type, id_number = excluded.id_number, \
             race = excluded.race, gender = excluded.gender, birthdate = excluded.birthdate, \
             alt_email = excluded.alt_email, telno = excluded.telno, \
             notification = excluded.notification, fulltime_student = excluded.fulltime_student, \
             current_org = excluded.current_org, updated_at = excluded.updated_at",
        )
        .map_err(db_err)?
        .execute(params![
            user_id,
            details.firstname,
            details.surname,
            details.initials,
            details.maiden_name,
            details.id_type,
            details.id_number,
            details.race,
            details.gender,
            details.birthdate,
            details.alt_email,
            details.telno,
            details.notification,
            details.fulltime_student,
            details.current_org,
            Utc::now(),
        ])
        .map_err(db_err)?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Sections
    // ---------------------------------------------------------------

    /// All of a user's entries for a section, oldest first.
    pub fn list_entries<T: Section>(&self, user_id: i64) -> Result<Vec<Entry<T>>> {
        let sql = format!("SELECT * FROM {} WHERE user_id = ?1 ORDER BY id", T::TABLE);
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params![user_id], Self::row_to_entry::<T>)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// One entry, only if it belongs to `user_id`.
    pub fn get_entry<T: Section>(&self, user_id: i64, id: i64) -> Result<Option<Entry<T>>> {
        let sql = format!("SELECT * FROM {} WHERE id = ?1 AND user_id = ?2", T::TABLE);
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(&sql)
            .map_err(db_err)?
            .query_row(params![id, user_id], Self::row_to_entry::<T>)
            .optional()
            .map_err(db_err)?;
        Ok(row)
    }

    /// Insert an entry. Returns the new entry ID.
    pub fn insert_entry<T: Section>(&self, user_id: i64, entry: &T) -> Result<i64> {
        let conn = self.conn.lock();
        Self::insert_entry_on(&conn, user_id, entry)
    }

    /// Replace an entry's fields. Returns false if no owned entry matched.
    pub fn update_entry<T: Section>(&self, user_id: i64, id: i64, entry: &T) -> Result<bool> {
        let conn = self.conn.lock();
        Self::update_entry_on(&conn, user_id, id, entry)
    }

    /// Delete an entry. Returns false if no owned entry matched.
    pub fn delete_entry<T: Section>(&self, user_id: i64, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1 AND user_id = ?2", T::TABLE);
        let conn = self.conn.lock();
        let count = conn.execute(&sql, params![id, user_id]).map_err(db_err)?;
        Ok(count > 0)
    }

    /// Save a whole list in one transaction.
    ///
    /// Items carrying an ID update that entry; items without one are
    /// inserted. Any ID not owned by the user aborts the save with
    /// `NotFound`. Returns the IDs in input order.
    pub fn save_entries<T: Section>(
        &self,
        user_id: i64,
        items: &[(Option<i64>, T)],
    ) -> Result<Vec<i64>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;
        let mut ids = Vec::with_capacity(items.len());
        for (id, entry) in items {
            match id {
                Some(id) => {
                    if !Self::update_entry_on(&tx, user_id, *id, entry)? {
                        return Err(Error::NotFound(format!("{} entry {}", T::NAME, id)));
                    }
                    ids.push(*id);
                }
                None => ids.push(Self::insert_entry_on(&tx, user_id, entry)?),
            }
        }
        tx.commit().map_err(db_err)?;
        Ok(ids)
    }

    /// Count a user's entries for a section.
    pub fn count_entries<T: Section>(&self, user_id: i64) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE user_id = ?1", T::TABLE);
        let conn = self.conn.lock();
        conn.query_row(&sql, params![user_id], |row| row.get(0))
            .map_err(db_err)
    }

    /// Per-section entry counts for one user.
    pub fn section_counts(&self, user_id: i64) -> Result<SectionCounts> {
        Ok(SectionCounts {
            employment: self.count_entries::<Employment>(user_id)?,
            education: self.count_entries::<Education>(user_id)?,
            publications: self.count_entries::<Publication>(user_id)?,
            patents: self.count_entries::<Patent>(user_id)?,
            certifications: self.count_entries::<Certification>(user_id)?,
        })
    }

    fn insert_entry_on<T: Section>(conn: &Connection, user_id: i64, entry: &T) -> Result<i64> {
        let placeholders = (1..=T::COLUMNS.len() + 1)
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} (user_id, {}) VALUES ({})",
            T::TABLE,
            T::COLUMNS.join(", "),
            placeholders
        );

        let mut values: Vec<&dyn ToSql> = vec![&user_id];
        values.extend(entry.bind());

        conn.prepare_cached(&sql)
            .map_err(db_err)?
            .insert(values.as_slice())
            .map_err(db_err)
    }

    fn update_entry_on<T: Section>(
        conn: &Connection,
        user_id: i64,
        id: i64,
        entry: &T,
    ) -> Result<bool> {
        let n = T::COLUMNS.len();
        let assignments = T::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{} = ?{}", col, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{} AND user_id = ?{}",
            T::TABLE,
            assignments,
            n + 1,
            n + 2
        );

        let mut values: Vec<&dyn ToSql> = entry.bind();
        values.push(&id);
        values.push(&user_id);

        let count = conn
            .prepare_cached(&sql)
            .map_err(db_err)?
            .execute(values.as_slice())
            .map_err(db_err)?;
        Ok(count > 0)
    }

    // ---------------------------------------------------------------
    // Lookups
    // ---------------------------------------------------------------

    /// Add a lookup value. Returns the new lookup ID.
    pub fn add_lookup(
        &self,
        kind: LookupKind,
        value: &str,
        description: Option<&str>,
    ) -> Result<i64> {
        let value = value.trim();
        let conn = self.conn.lock();
        let id = conn
            .prepare_cached("INSERT INTO lookups (kind, value, description) VALUES (?1, ?2, ?3)")
            .map_err(db_err)?
            .insert(params![kind.as_str(), value, description])
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::Duplicate(format!("{} '{}'", kind, value))
                } else {
                    db_err(e)
                }
            })?;
        Ok(id)
    }

    /// All values of one lookup kind, in insertion order.
    pub fn list_lookups(&self, kind: LookupKind) -> Result<Vec<Lookup>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT id, value, description FROM lookups WHERE kind = ?1 ORDER BY id")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![kind.as_str()], |row| {
                Ok(Lookup {
                    id: row.get(0)?,
                    kind,
                    value: row.get(1)?,
                    description: row.get(2)?,
                })
            })
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// Whether `value` is a known lookup of `kind`.
    pub fn lookup_exists(&self, kind: LookupKind, value: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let found: Option<i64> = conn
            .prepare_cached("SELECT id FROM lookups WHERE kind = ?1 AND value = ?2")
            .map_err(db_err)?
            .query_row(params![kind.as_str(), value], |row| row.get(0))
            .optional()
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    pub fn get_stats(&self) -> Result<StoreStats> {
        let users = self.count_users(false)?;
        let confirmed_users = self.count_users(true)?;

        let count_table = |table: &str| -> Result<i64> {
            let conn = self.conn.lock();
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
                .map_err(db_err)
        };

        let db_size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(StoreStats {
            users,
            confirmed_users,
            employment: count_table(Employment::TABLE)?,
            education: count_table(Education::TABLE)?,
            publications: count_table(Publication::TABLE)?,
            patents: count_table(Patent::TABLE)?,
            certifications: count_table(Certification::TABLE)?,
            lookups: count_table("lookups")?,
            db_path: self.db_path.to_string_lossy().to_string(),
            db_size_mb: db_size as f64 / (1024.0 * 1024.0),
        })
    }

    // ---------------------------------------------------------------
    // Row Mapping Helpers
    // ---------------------------------------------------------------

    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get("id")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            registered_on: row.get("registered_on")?,
            admin: row.get("admin")?,
            confirmed: row.get("confirmed")?,
            confirmed_on: row.get("confirmed_on")?,
        })
    }

    fn row_to_personal(row: &rusqlite::Row<'_>) -> rusqlite::Result<PersonalDetails> {
        Ok(PersonalDetails {
            firstname: row.get("firstname")?,
            surname: row.get("surname")?,
            initials: row.get("initials")?,
            maiden_name: row.get("maiden_name")?,
            id_type: row.get("id_type")?,
            id_number: row.get("id_number")?,
            race: row.get("race")?,
            gender: row.get("gender")?,
            birthdate: row.get("birthdate")?,
            alt_email: row.get("alt_email")?,
            telno: row.get("telno")?,
            notification: row.get("notification")?,
            fulltime_student: row.get("fulltime_student")?,
            current_org: row.get("current_org")?,
        })
    }

    fn row_to_entry<T: Section>(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entry<T>> {
        Ok(Entry {
            id: row.get("id")?,
            data: T::from_row(row)?,
        })
    }
}
