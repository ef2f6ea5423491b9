/*
[INPUT]:  Wallet connections, Auth API results, persisted storage
[OUTPUT]: Session store, link resolver and persistence adapters
[POS]:    Session layer - authenticated wallet session state
[UPDATE]: When session exports change
*/

pub mod guard;
pub mod linking;
pub mod storage;
pub mod store;

pub use guard::{LayerGuards, LayerPermit};
pub use linking::{ConnectOutcome, LinkResolver};
pub use storage::{
    FileStorage, MemoryStorage, SessionPersistence, SessionStorage, StorageError, StorageKeys,
};
pub use store::{SessionDeps, SessionStore};
