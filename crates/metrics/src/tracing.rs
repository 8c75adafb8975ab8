use airport_models::LoggingConfig;
use ::tracing::{info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

pub struct TracingService;

impl TracingService {
    /// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
    /// Calling it twice is harmless; the second call keeps the first subscriber.
    pub fn init(config: &LoggingConfig) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.level)));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_timer(UtcTime::rfc_3339())
            .with_target(true);

        let result = if config.json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        if result.is_err() {
            warn!("Tracing subscriber already installed");
        }
    }

    pub fn log_order_placed(user_id: i64, order_id: i64, tickets: usize) {
        info!(
            user_id = user_id,
            order_id = order_id,
            tickets = tickets,
            "Order placed"
        );
    }

    pub fn log_user_registered(user_id: i64) {
        info!(user_id = user_id, "User registered");
    }

    pub fn log_auth_failure(reason: &str) {
        warn!(reason = %reason, "Authentication failed");
    }

    pub fn log_image_uploaded(airplane_id: i64, path: &str) {
        info!(
            airplane_id = airplane_id,
            path = %path,
            "Airplane image uploaded"
        );
    }
}
