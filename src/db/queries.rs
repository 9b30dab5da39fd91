use rusqlite::{params, Connection, OptionalExtension};

pub const GOOGLE_SERVICE: &str = "google_calendar";

// ── Credentials ──

pub fn get_refresh_token(conn: &Connection, account: &str) -> anyhow::Result<Option<String>> {
    let token = conn
        .query_row(
            "SELECT refresh_token FROM auth WHERE id = ?1 AND service = ?2",
            params![account, GOOGLE_SERVICE],
            |row| row.get(0),
        )
        .optional()?;
    Ok(token)
}

pub fn save_refresh_token(conn: &Connection, account: &str, refresh_token: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO auth (id, service, refresh_token) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
            service = excluded.service,
            refresh_token = excluded.refresh_token,
            updated_at = datetime('now')",
        params![account, GOOGLE_SERVICE, refresh_token],
    )?;
    Ok(())
}

pub fn delete_refresh_token(conn: &Connection, account: &str) -> anyhow::Result<bool> {
    let removed = conn.execute(
        "DELETE FROM auth WHERE id = ?1 AND service = ?2",
        params![account, GOOGLE_SERVICE],
    )?;
    Ok(removed > 0)
}
