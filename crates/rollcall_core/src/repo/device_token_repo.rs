//! SQLite store for messaging device tokens.
//!
//! Backs the optional `device_token` capability. Saving the same token twice
//! re-assigns it to the latest user instead of failing.

use crate::capability::{CapabilityError, DeviceTokenSaver, OptionalCapability};
use crate::repo::attendance_repo::RepoResult;
use log::info;
use rusqlite::{params, Connection};

pub struct SqliteDeviceTokenStore {
    conn: Connection,
}

impl SqliteDeviceTokenStore {
    /// Takes ownership of a migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn save(&self, user_name: &str, token: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO device_tokens (token, user_name) VALUES (?1, ?2)
             ON CONFLICT (token) DO UPDATE SET
                user_name = excluded.user_name,
                saved_at = (strftime('%s', 'now') * 1000);",
            params![token, user_name],
        )?;
        info!("event=device_token_save module=repo status=ok user={user_name}");
        Ok(())
    }

    pub fn tokens_for(&self, user_name: &str) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT token FROM device_tokens WHERE user_name = ?1 ORDER BY token;")?;
        let tokens = stmt
            .query_map([user_name], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tokens)
    }
}

impl DeviceTokenSaver for SqliteDeviceTokenStore {
    fn save_device_token(&self, user_name: &str, token: &str) -> Result<(), CapabilityError> {
        self.save(user_name, token)
            .map_err(|err| CapabilityError::Rejected {
                capability: OptionalCapability::DeviceToken,
                message: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteDeviceTokenStore;
    use crate::capability::DeviceTokenSaver;
    use crate::db::open_db_in_memory;

    #[test]
    fn saving_same_token_reassigns_owner() {
        let store = SqliteDeviceTokenStore::new(open_db_in_memory().unwrap());

        store.save_device_token("asha", "tok-1").unwrap();
        store.save_device_token("ravi", "tok-1").unwrap();

        assert!(store.tokens_for("asha").unwrap().is_empty());
        assert_eq!(store.tokens_for("ravi").unwrap(), ["tok-1"]);
    }
}
