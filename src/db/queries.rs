use rusqlite::params;

use super::{Database, DbError};

pub fn upsert_value(db: &Database, key: &str, value: &str, updated_at: &str) -> Result<(), DbError> {
    let conn = db.conn();
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key)
         DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, updated_at],
    )?;
    Ok(())
}

pub fn get_value(db: &Database, key: &str) -> Result<Option<String>, DbError> {
    let conn = db.conn();
    let mut stmt = conn.prepare("SELECT value FROM kv_store WHERE key = ?1")?;
    let mut rows = stmt.query_map(params![key], |row| row.get(0))?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

pub fn delete_value(db: &Database, key: &str) -> Result<(), DbError> {
    let conn = db.conn();
    conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
    Ok(())
}

pub fn count_values(db: &Database) -> Result<i64, DbError> {
    let conn = db.conn();
    let count = conn.query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))?;
    Ok(count)
}
