//! SQL schema for the Cadastro SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS companies (
    company_id    TEXT PRIMARY KEY,
    code          TEXT NOT NULL UNIQUE,
    legal_name    TEXT NOT NULL,
    trade_name    TEXT,
    tax_id        TEXT NOT NULL UNIQUE,  -- digits only
    postal_code   TEXT,
    address_kind  TEXT,
    street        TEXT,
    number        TEXT,
    complement    TEXT,
    neighborhood  TEXT,
    city          TEXT,
    state         TEXT,
    capital_cents INTEGER NOT NULL DEFAULT 0,
    is_branch     INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS partners (
    partner_id    TEXT PRIMARY KEY,
    national_id   TEXT NOT NULL UNIQUE,  -- 11 digits
    name          TEXT NOT NULL,
    birth_date    TEXT,                  -- YYYY-MM-DD
    registry_id   TEXT,
    license_id    TEXT,
    postal_code   TEXT,
    address_kind  TEXT,
    street        TEXT,
    number        TEXT,
    complement    TEXT,
    neighborhood  TEXT,
    city          TEXT,
    state         TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- Percentages are integer hundredths: 10000 = 100%.
CREATE TABLE IF NOT EXISTS company_partners (
    link_id     TEXT PRIMARY KEY,
    company_id  TEXT NOT NULL REFERENCES companies(company_id),
    partner_id  TEXT NOT NULL REFERENCES partners(partner_id),
    percentage  INTEGER NOT NULL CHECK (percentage BETWEEN 0 AND 10000),
    active      INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE (company_id, partner_id)
);

-- History tables are strictly append-only; the triggers below abort any
-- UPDATE or DELETE.
CREATE TABLE IF NOT EXISTS company_history (
    snapshot_id   TEXT PRIMARY KEY,
    company_id    TEXT NOT NULL REFERENCES companies(company_id),
    code          TEXT NOT NULL,
    legal_name    TEXT NOT NULL,
    trade_name    TEXT,
    tax_id        TEXT NOT NULL,
    postal_code   TEXT,
    address_kind  TEXT,
    street        TEXT,
    number        TEXT,
    complement    TEXT,
    neighborhood  TEXT,
    city          TEXT,
    state         TEXT,
    capital_cents INTEGER NOT NULL,
    is_branch     INTEGER NOT NULL,
    source        TEXT NOT NULL,
    snapshot_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS partner_history (
    snapshot_id   TEXT PRIMARY KEY,
    partner_id    TEXT NOT NULL REFERENCES partners(partner_id),
    national_id   TEXT NOT NULL,
    name          TEXT NOT NULL,
    birth_date    TEXT,
    registry_id   TEXT,
    license_id    TEXT,
    postal_code   TEXT,
    address_kind  TEXT,
    street        TEXT,
    number        TEXT,
    complement    TEXT,
    neighborhood  TEXT,
    city          TEXT,
    state         TEXT,
    company_id    TEXT REFERENCES companies(company_id),
    percentage    INTEGER,
    source        TEXT NOT NULL,
    snapshot_at   TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS company_history_no_update
BEFORE UPDATE ON company_history
BEGIN SELECT RAISE(ABORT, 'company_history is append-only'); END;

CREATE TRIGGER IF NOT EXISTS company_history_no_delete
BEFORE DELETE ON company_history
BEGIN SELECT RAISE(ABORT, 'company_history is append-only'); END;

CREATE TRIGGER IF NOT EXISTS partner_history_no_update
BEFORE UPDATE ON partner_history
BEGIN SELECT RAISE(ABORT, 'partner_history is append-only'); END;

CREATE TRIGGER IF NOT EXISTS partner_history_no_delete
BEFORE DELETE ON partner_history
BEGIN SELECT RAISE(ABORT, 'partner_history is append-only'); END;

-- Operational records owned by the HR side of the portal. Only their
-- existence matters here: any row freezes the company's code and tax ID.
CREATE TABLE IF NOT EXISTS employees (
    record_id   TEXT PRIMARY KEY,
    company_id  TEXT NOT NULL REFERENCES companies(company_id),
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS admissions (
    record_id   TEXT PRIMARY KEY,
    company_id  TEXT NOT NULL REFERENCES companies(company_id),
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transfers (
    record_id   TEXT PRIMARY KEY,
    company_id  TEXT NOT NULL REFERENCES companies(company_id),
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_companies (
    record_id   TEXT PRIMARY KEY,
    company_id  TEXT NOT NULL REFERENCES companies(company_id),
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS company_partners_partner_idx ON company_partners(partner_id);
CREATE INDEX IF NOT EXISTS company_history_company_idx  ON company_history(company_id);
CREATE INDEX IF NOT EXISTS partner_history_partner_idx  ON partner_history(partner_id);
CREATE INDEX IF NOT EXISTS employees_company_idx        ON employees(company_id);
CREATE INDEX IF NOT EXISTS admissions_company_idx       ON admissions(company_id);
CREATE INDEX IF NOT EXISTS transfers_company_idx        ON transfers(company_id);
CREATE INDEX IF NOT EXISTS user_companies_company_idx   ON user_companies(company_id);

PRAGMA user_version = 1;
";
