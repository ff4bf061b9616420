//! App Context

use std::{sync::Arc, time::Duration};

use jiff::tz::Offset;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    database::{self, Db, PoolConfig},
    domain::{
        email_promotions::{
            EmailPromotionsService, PgEmailPromotionsService,
            campaign::{Campaign, DEFAULT_SEND_DELAY},
            runner::{CampaignRunner, DEFAULT_QUEUE_CAPACITY, DEFAULT_SWEEP_INTERVAL},
            template::PromotionRenderer,
        },
        olive_branches::{OliveBranchesService, PgOliveBranchesService},
        orders::{OrdersService, PgOrdersService},
        payments::{
            PaymentsService, PgPaymentsService,
            gateway::{GatewayConfig, GatewayError, HttpPaymentGateway, PaymentGateway},
        },
        unsubscribe::{PgUnsubscribeService, UnsubscribeService, UnsubscribeSigner},
    },
    mail::{HttpMailTransport, MailConfig, MailError, MailTransport},
    signing::SigningKeyError,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply database migrations")]
    Migrate(#[source] sqlx::migrate::MigrateError),

    #[error("failed to configure payment gateway")]
    Gateway(#[source] GatewayError),

    #[error("failed to configure mail transport")]
    Mail(#[source] MailError),

    #[error("unsubscribe secret is not usable")]
    UnsubscribeSecret(#[source] SigningKeyError),
}

/// Promotion campaign settings.
#[derive(Debug, Clone)]
pub struct PromotionsConfig {
    /// Root of the public site, used for project and unsubscribe links.
    pub public_base_url: String,

    pub unsubscribe_secret: String,
    pub send_delay: Duration,

    /// How often promotions that never reached the runner are picked up.
    pub sweep_interval: Duration,
}

impl Default for PromotionsConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:8698".to_string(),
            unsubscribe_secret: String::new(),
            send_delay: DEFAULT_SEND_DELAY,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Everything needed to assemble the services besides the database.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gateway: GatewayConfig,

    /// Promotions fail at send time when no transport is configured.
    pub mail: Option<MailConfig>,

    pub promotions: PromotionsConfig,

    /// Offset at which the daily free invitation allowance resets.
    pub quota_day_offset: Offset,

    /// Apply pending migrations on startup.
    pub migrate: bool,

    pub pool: PoolConfig,
}

#[derive(Clone)]
pub struct AppContext {
    pub orders: Arc<dyn OrdersService>,
    pub payments: Arc<dyn PaymentsService>,
    pub olive_branches: Arc<dyn OliveBranchesService>,
    pub email_promotions: Arc<dyn EmailPromotionsService>,
    pub unsubscribe: Arc<dyn UnsubscribeService>,

    /// Background promotion delivery. `None` when services are supplied directly.
    pub campaigns: Option<CampaignRunner>,

    /// Handle used for readiness checks. `None` when services are supplied directly.
    pub db: Option<Db>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// Must be called from within a Tokio runtime; the campaign runner is
    /// started on it.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails or a
    /// configured secret or client cannot be used.
    pub async fn from_database_url(url: &str, config: AppConfig) -> Result<Self, AppInitError> {
        let pool = database::connect(url, config.pool)
            .await
            .map_err(AppInitError::Database)?;

        if config.migrate {
            database::migrate(&pool)
                .await
                .map_err(AppInitError::Migrate)?;

            info!("database migrations applied");
        }

        let db = Db::new(pool);

        let gateway: Arc<dyn PaymentGateway> = Arc::new(
            HttpPaymentGateway::new(config.gateway).map_err(AppInitError::Gateway)?,
        );

        let mailer: Option<Arc<dyn MailTransport>> = match config.mail {
            Some(mail) => Some(Arc::new(
                HttpMailTransport::new(mail).map_err(AppInitError::Mail)?,
            )),
            None => {
                warn!("no mail transport configured; email promotions will fail");

                None
            }
        };

        let unsubscribe = UnsubscribeSigner::new(config.promotions.unsubscribe_secret.as_bytes())
            .map_err(AppInitError::UnsubscribeSecret)?;

        let campaign = Campaign::new(
            db.clone(),
            mailer,
            PromotionRenderer::new(&config.promotions.public_base_url),
            unsubscribe.clone(),
            config.promotions.send_delay,
        );

        let campaigns = CampaignRunner::start(
            campaign,
            DEFAULT_QUEUE_CAPACITY,
            config.promotions.sweep_interval,
        );

        Ok(Self {
            orders: Arc::new(PgOrdersService::new(db.clone(), Arc::clone(&gateway))),
            payments: Arc::new(PgPaymentsService::new(db.clone(), gateway)),
            olive_branches: Arc::new(PgOliveBranchesService::new(
                db.clone(),
                config.quota_day_offset,
            )),
            email_promotions: Arc::new(PgEmailPromotionsService::new(
                db.clone(),
                Arc::new(campaigns.clone()),
            )),
            unsubscribe: Arc::new(PgUnsubscribeService::new(db.clone(), unsubscribe)),
            campaigns: Some(campaigns),
            db: Some(db),
        })
    }
}
