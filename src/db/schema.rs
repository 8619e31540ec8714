use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Users (identity - managed by the auth subsystem, consumed here)
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

        -- Sessions (bearer tokens, stored hashed)
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            token_hash TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sessions_token ON sessions(token_hash);

        -- Payment intents (one row per checkout attempt; never deleted)
        -- status is the cross-process lock: the conditional UPDATE on
        -- (order_id, status='pending') is the only synchronization
        -- primitive in the confirmation pipeline.
        CREATE TABLE IF NOT EXISTS payment_intents (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            order_id TEXT NOT NULL UNIQUE,
            payment_id TEXT,
            payment_type TEXT NOT NULL CHECK (payment_type IN ('task', 'subscription')),
            task_type TEXT NOT NULL,
            amount INTEGER NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending', 'succeeded')),
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_payment_intents_user ON payment_intents(user_id);
        CREATE INDEX IF NOT EXISTS idx_payment_intents_payment ON payment_intents(payment_id);

        -- Complaints (paid filing with the civic department)
        CREATE TABLE IF NOT EXISTS complaints (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            description TEXT NOT NULL,
            location TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending', 'filed')),
            order_id TEXT,
            created_at INTEGER NOT NULL,
            filed_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_complaints_user ON complaints(user_id, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_complaints_order ON complaints(order_id);

        -- RTI requests (drafted legal text, rendered once paid)
        CREATE TABLE IF NOT EXISTS rti_requests (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            subject TEXT NOT NULL,
            department TEXT NOT NULL,
            body_text TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('draft', 'paid', 'response_received')),
            order_id TEXT,
            document_path TEXT,
            created_at INTEGER NOT NULL,
            paid_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_rti_user ON rti_requests(user_id, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_rti_order ON rti_requests(order_id);

        -- Developer API credentials (one per user; rotated on repurchase)
        CREATE TABLE IF NOT EXISTS api_credentials (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE REFERENCES users(id),
            api_key TEXT NOT NULL,
            plan TEXT NOT NULL,
            monthly_quota INTEGER NOT NULL,
            used_count INTEGER NOT NULL DEFAULT 0,
            quota_reset_at INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        "#,
    )?;
    Ok(())
}
