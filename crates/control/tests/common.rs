use airport_control::{AccountService, BookingService, CatalogService, MediaStorage, TokenIssuer};
use airport_testsupport::MemoryStore;
use chrono::Duration;
use std::sync::Arc;
use tempfile::TempDir;

pub const SECRET: &str = "test-secret-key";

pub struct Services {
    pub store: Arc<MemoryStore>,
    pub catalog: CatalogService,
    pub booking: BookingService,
    pub accounts: AccountService,
    pub media_root: TempDir,
}

pub fn services() -> Services {
    let store = Arc::new(MemoryStore::new());
    let media_root = tempfile::tempdir().unwrap();
    let media = MediaStorage::new(media_root.path(), "/media/");
    let tokens = TokenIssuer::with_lifetimes(SECRET, Duration::minutes(30), Duration::days(1));
    Services {
        catalog: CatalogService::new(store.clone(), media),
        booking: BookingService::new(store.clone()),
        accounts: AccountService::new(store.clone(), tokens),
        store,
        media_root,
    }
}
