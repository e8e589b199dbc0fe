use rusqlite::{Connection, Result};

/// Initialise all tables. Safe to call on every startup (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    create_profiles_table(conn)?;
    create_conversation_turns_table(conn)?;
    create_pending_actions_table(conn)?;
    create_interests_table(conn)?;
    create_daily_usage_table(conn)?;
    create_push_log_table(conn)?;
    create_billing_tables(conn)?;
    create_classics_table(conn)?;
    create_pillar_cache_table(conn)?;
    Ok(())
}

fn create_profiles_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS profiles (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            platform         TEXT NOT NULL,
            platform_user_id TEXT NOT NULL,
            display_name     TEXT,
            birth_year       INTEGER NOT NULL,
            birth_month      INTEGER NOT NULL,
            birth_day        INTEGER NOT NULL,
            birth_hour       INTEGER NOT NULL,
            birth_minute     INTEGER NOT NULL,
            gender           TEXT NOT NULL,
            is_active        INTEGER NOT NULL DEFAULT 1,
            premium_until    TEXT,
            free_unlocks     INTEGER NOT NULL DEFAULT 0,
            referral_code    TEXT,
            last_active_at   TEXT,
            created_at       TEXT NOT NULL,
            updated_at       TEXT NOT NULL,
            UNIQUE(platform, platform_user_id)
        );
        CREATE INDEX IF NOT EXISTS idx_profiles_referral
            ON profiles(referral_code);",
    )
}

fn create_conversation_turns_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS conversation_turns (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            platform         TEXT NOT NULL,
            platform_user_id TEXT NOT NULL,
            role             TEXT NOT NULL,
            content          TEXT NOT NULL,
            created_at       TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_turns_user
            ON conversation_turns(platform, platform_user_id, id);",
    )
}

fn create_pending_actions_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS pending_actions (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            platform         TEXT NOT NULL,
            platform_user_id TEXT NOT NULL,
            action_type      TEXT NOT NULL,
            payload          TEXT NOT NULL,
            expires_at       TEXT NOT NULL,
            created_at       TEXT NOT NULL,
            UNIQUE(platform, platform_user_id, action_type)
        );",
    )
}

fn create_interests_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS interests (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            platform         TEXT NOT NULL,
            platform_user_id TEXT NOT NULL,
            category         TEXT NOT NULL,
            ask_count        INTEGER NOT NULL DEFAULT 0,
            weighted_count   REAL NOT NULL DEFAULT 0,
            score            INTEGER NOT NULL DEFAULT 0,
            last_asked       TEXT NOT NULL,
            UNIQUE(platform, platform_user_id, category)
        );",
    )
}

fn create_daily_usage_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS daily_usage (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            platform         TEXT NOT NULL,
            platform_user_id TEXT NOT NULL,
            kst_date         TEXT NOT NULL,
            count            INTEGER NOT NULL DEFAULT 0,
            UNIQUE(platform, platform_user_id, kst_date)
        );",
    )
}

fn create_push_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS push_log (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            platform              TEXT NOT NULL,
            platform_user_id      TEXT NOT NULL,
            category              TEXT NOT NULL,
            message_text          TEXT NOT NULL,
            status                TEXT NOT NULL,
            is_opened             INTEGER NOT NULL DEFAULT 0,
            converted_to_premium  INTEGER NOT NULL DEFAULT 0,
            sent_at               TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_push_user
            ON push_log(platform, platform_user_id, sent_at DESC);",
    )
}

fn create_billing_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS orders (
            id               TEXT PRIMARY KEY NOT NULL,
            platform         TEXT NOT NULL,
            platform_user_id TEXT NOT NULL,
            product          TEXT NOT NULL,
            amount           INTEGER NOT NULL,
            created_at       TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS subscriptions (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            platform         TEXT NOT NULL,
            platform_user_id TEXT NOT NULL,
            tier             TEXT NOT NULL,
            expires_at       TEXT NOT NULL,
            created_at       TEXT NOT NULL,
            UNIQUE(platform, platform_user_id)
        );
        CREATE TABLE IF NOT EXISTS credit_ledger (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            platform         TEXT NOT NULL,
            platform_user_id TEXT NOT NULL,
            delta            INTEGER NOT NULL,
            reason           TEXT NOT NULL,
            created_at       TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_credits_user
            ON credit_ledger(platform, platform_user_id);",
    )
}

fn create_classics_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS classics_chunks (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            source     TEXT NOT NULL,
            section    TEXT NOT NULL,
            content    TEXT NOT NULL,
            embedding  TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_classics_source
            ON classics_chunks(source);",
    )
}

fn create_pillar_cache_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS pillar_cache (
            cache_key  TEXT PRIMARY KEY NOT NULL,
            pillars    TEXT NOT NULL,
            created_at TEXT NOT NULL
        );",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        init_db(&conn).unwrap();
    }
}
