//! Database schema SQL.

/// Accounts and the one-per-user personal details row.
pub const ACCOUNT_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    registered_on TEXT NOT NULL,
    admin INTEGER NOT NULL DEFAULT 0,
    confirmed INTEGER NOT NULL DEFAULT 0,
    confirmed_on TEXT
);

CREATE TABLE IF NOT EXISTS personal_details (
    user_id INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    firstname TEXT,
    surname TEXT,
    initials TEXT,
    maiden_name TEXT,
    id_type TEXT,
    id_number TEXT,
    race TEXT,
    gender TEXT,
    birthdate TEXT,
    alt_email TEXT,
    telno TEXT,
    notification INTEGER NOT NULL DEFAULT 0,
    fulltime_student INTEGER NOT NULL DEFAULT 0,
    current_org TEXT,
    updated_at TEXT NOT NULL
);
"#;

/// Repeatable CV sections, each owned by a user.
pub const SECTION_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS employment (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    human_id TEXT NOT NULL,
    employer TEXT NOT NULL,
    position TEXT NOT NULL,
    start_date TEXT,
    end_date TEXT,
    job_desc TEXT
);

CREATE TABLE IF NOT EXISTS education (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    human_id TEXT,
    educational_institution TEXT,
    course_studied TEXT,
    start_date TEXT,
    end_date TEXT,
    accolades TEXT,
    educational_institution_type TEXT
);

CREATE TABLE IF NOT EXISTS publications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    human_id TEXT,
    title TEXT,
    authors TEXT,
    publication_date TEXT,
    publisher TEXT,
    publication_url TEXT,
    description TEXT,
    publication_category TEXT
);

CREATE TABLE IF NOT EXISTS patents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    human_id TEXT,
    title TEXT,
    description TEXT,
    patent_number TEXT,
    inventors TEXT,
    issue_date TEXT,
    patent_office TEXT,
    patent_status TEXT,
    patent_url TEXT
);

CREATE TABLE IF NOT EXISTS certifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    human_id TEXT,
    name TEXT,
    certification_number TEXT,
    issue_date TEXT,
    expiry_date TEXT,
    certification_url TEXT
);

CREATE INDEX IF NOT EXISTS idx_employment_user ON employment(user_id);
CREATE INDEX IF NOT EXISTS idx_education_user ON education(user_id);
CREATE INDEX IF NOT EXISTS idx_publications_user ON publications(user_id);
CREATE INDEX IF NOT EXISTS idx_patents_user ON patents(user_id);
CREATE INDEX IF NOT EXISTS idx_certifications_user ON certifications(user_id);
"#;

/// Reference values backing select fields.
pub const LOOKUP_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS lookups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    value TEXT NOT NULL,
    description TEXT,
    UNIQUE(kind, value)
);

CREATE INDEX IF NOT EXISTS idx_lookups_kind ON lookups(kind);
"#;
