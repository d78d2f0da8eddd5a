//! External collaborators: permission lookups and listing-cache invalidation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::domain::{EstablishmentId, UserId};
use crate::error::CollaboratorError;

/// Account role as recorded by the user directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Moderator,
    EstablishmentOwner,
    User,
}

impl Role {
    /// Administrators and moderators may move any establishment.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Moderator)
    }
}

/// Role and ownership lookups.
#[async_trait]
pub trait PermissionDirectory: Send + Sync {
    /// Role of `user`, or `None` if the user is unknown.
    async fn role_of(&self, user: UserId) -> Result<Option<Role>, CollaboratorError>;

    /// Whether `user` is a verified owner of `establishment`.
    async fn owns(
        &self,
        user: UserId,
        establishment: EstablishmentId,
    ) -> Result<bool, CollaboratorError>;
}

/// Invalidates cached establishment listings after a committed mutation.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate_establishments(&self) -> Result<(), CollaboratorError>;
}

/// An in-memory user directory.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    roles: RwLock<HashMap<UserId, Role>>,
    ownerships: RwLock<HashSet<(UserId, EstablishmentId)>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_role(&self, user: UserId, role: Role) {
        self.roles.write().insert(user, role);
    }

    pub fn grant_ownership(&self, user: UserId, establishment: EstablishmentId) {
        self.ownerships.write().insert((user, establishment));
    }
}

#[async_trait]
impl PermissionDirectory for MemoryDirectory {
    async fn role_of(&self, user: UserId) -> Result<Option<Role>, CollaboratorError> {
        Ok(self.roles.read().get(&user).copied())
    }

    async fn owns(
        &self,
        user: UserId,
        establishment: EstablishmentId,
    ) -> Result<bool, CollaboratorError> {
        Ok(self.ownerships.read().contains(&(user, establishment)))
    }
}

/// A listing cache represented by a generation counter.
///
/// Readers compare the generation they cached against [`GenerationCache::generation`];
/// invalidation bumps it.
#[derive(Debug, Default)]
pub struct GenerationCache {
    generation: AtomicU64,
}

impl GenerationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

#[async_trait]
impl CacheInvalidator for GenerationCache {
    async fn invalidate_establishments(&self) -> Result<(), CollaboratorError> {
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_memory_directory_lookups() {
        let directory = MemoryDirectory::new();
        let user = Uuid::new_v4();
        let establishment = Uuid::new_v4();

        assert_eq!(directory.role_of(user).await.unwrap(), None);
        directory.set_role(user, Role::EstablishmentOwner);
        directory.grant_ownership(user, establishment);

        assert_eq!(
            directory.role_of(user).await.unwrap(),
            Some(Role::EstablishmentOwner)
        );
        assert!(directory.owns(user, establishment).await.unwrap());
        assert!(!directory.owns(user, Uuid::new_v4()).await.unwrap());
    }

    #[test]
    fn test_staff_roles() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Moderator.is_staff());
        assert!(!Role::EstablishmentOwner.is_staff());
        assert!(!Role::User.is_staff());
    }

    #[tokio::test]
    async fn test_generation_cache_bumps() {
        let cache = GenerationCache::new();
        cache.invalidate_establishments().await.unwrap();
        cache.invalidate_establishments().await.unwrap();
        assert_eq!(cache.generation(), 2);
    }
}
