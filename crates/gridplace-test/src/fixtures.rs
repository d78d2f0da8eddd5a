//! Seeded stores and user directories.
//!
//! The canonical scenario places establishment A at `(1, 5)` and B at `(1, 7)`
//! in zone `soi6`.

use gridplace_core::{Cell, MemoryDirectory, MemoryPlacementStore, Placement, Role, UserId};
use uuid::Uuid;

pub const SOI6: &str = "soi6";

/// A at `(1, 5)`, B at `(1, 7)` in soi6.
pub fn soi6_pair() -> (MemoryPlacementStore, Placement, Placement) {
    seed_pair(MemoryPlacementStore::new())
}

/// Same as [`soi6_pair`] but without the atomic swap procedure.
pub fn soi6_pair_without_atomic() -> (MemoryPlacementStore, Placement, Placement) {
    seed_pair(MemoryPlacementStore::without_atomic_swap())
}

fn seed_pair(store: MemoryPlacementStore) -> (MemoryPlacementStore, Placement, Placement) {
    let a = Placement::placed(Uuid::new_v4(), "Alpha Bar", SOI6, Cell::new(1, 5));
    let b = Placement::placed(Uuid::new_v4(), "Bravo Club", SOI6, Cell::new(1, 7));
    store
        .insert(a.clone())
        .expect("fresh store accepts first record");
    store
        .insert(b.clone())
        .expect("fresh store accepts second record");
    (store, a, b)
}

/// Adds a placed record to `store` and returns it.
pub fn place(store: &MemoryPlacementStore, name: &str, zone: &str, cell: Cell) -> Placement {
    let placement = Placement::placed(Uuid::new_v4(), name, zone, cell);
    store
        .insert(placement.clone())
        .expect("fixture cell must be free");
    placement
}

/// Users with each kind of access.
#[derive(Debug, Clone, Copy)]
pub struct Actors {
    pub admin: UserId,
    pub moderator: UserId,
    pub owner: UserId,
    pub stranger: UserId,
}

impl Actors {
    /// Registers an admin, a moderator, an owner of `owned` and a plain user.
    pub fn register(directory: &MemoryDirectory, owned: &Placement) -> Self {
        let actors = Self {
            admin: Uuid::new_v4(),
            moderator: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            stranger: Uuid::new_v4(),
        };
        directory.set_role(actors.admin, Role::Admin);
        directory.set_role(actors.moderator, Role::Moderator);
        directory.set_role(actors.owner, Role::EstablishmentOwner);
        directory.set_role(actors.stranger, Role::User);
        directory.grant_ownership(actors.owner, owned.id);
        actors
    }
}
