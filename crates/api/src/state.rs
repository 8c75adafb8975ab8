use airport_control::{
    AccountService, AirportStore, BookingService, CatalogService, MediaStorage, TokenIssuer,
};
use airport_metrics::MetricsService;
use airport_models::{AirportError, Config};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn AirportStore>,
    pub catalog: CatalogService,
    pub booking: BookingService,
    pub accounts: AccountService,
    pub metrics: Arc<MetricsService>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn AirportStore>) -> Result<Self, AirportError> {
        let media = MediaStorage::from_config(&config.storage);
        let tokens = TokenIssuer::new(&config.auth);
        let metrics = Arc::new(MetricsService::new()?);

        Ok(Self {
            catalog: CatalogService::new(store.clone(), media),
            booking: BookingService::new(store.clone()),
            accounts: AccountService::new(store.clone(), tokens),
            config: Arc::new(config),
            store,
            metrics,
        })
    }

    pub fn page_size(&self) -> i64 {
        self.config.pagination.page_size
    }
}
