//! UserDirectory port - username から UserId への解決

use async_trait::async_trait;

use crate::domain::ids::UserId;

use super::status_store::StoreError;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// 見つからなければ `Ok(None)`
    async fn resolve_username(&self, username: &str) -> Result<Option<UserId>, StoreError>;
}
