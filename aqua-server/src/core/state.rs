use std::sync::Arc;
use std::time::Duration;

use crate::clients::{ClientService, CodeStore, RegistrationService};
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, Result};
use crate::db::Storage;
use crate::ledger::LedgerService;
use crate::notify::{ExpoPushSender, LogMailer, LogPushSender, Mailer, PushDispatcher, PushSender};
use crate::orders::{AdminNotifier, OrderRules, OrdersManager};
use crate::payment::{HttpGateway, PaymentGateway, PaymentService};

const OTP_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// External seams the services talk through
///
/// Production wiring uses the gateway, push endpoint and log mailer from the
/// config; tests swap in stubs.
#[derive(Debug, Clone)]
pub struct Integrations {
    pub gateway: Arc<dyn PaymentGateway>,
    pub mailer: Arc<dyn Mailer>,
    pub push: Arc<dyn PushSender>,
}

impl Integrations {
    pub fn from_config(config: &Config) -> Result<Self> {
        let push: Arc<dyn PushSender> = match &config.push_endpoint {
            Some(endpoint) => Arc::new(ExpoPushSender::new(endpoint.clone())),
            None => Arc::new(LogPushSender),
        };
        Ok(Self {
            gateway: Arc::new(HttpGateway::new(config.payment.clone())?),
            mailer: Arc::new(LogMailer),
            push,
        })
    }
}

/// Shared handles for every service
///
/// Cheap to clone: services hold a [`Storage`] handle (an `Arc` over the
/// redb database) and the orders manager is behind an `Arc` so all clones
/// share one event channel.
///
/// | Field | Description |
/// |-------|-------------|
/// | config | Immutable settings |
/// | storage | Embedded redb store |
/// | ledger | Balance and bottle-credit mutations |
/// | orders | Order lifecycle, broadcasts [`shared::OrderEvent`] |
/// | clients | Profile and address book |
/// | registration | Confirmation codes and account creation |
/// | payments | Card gateway bridge |
/// | push | Push transport used by the dispatcher |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub storage: Storage,
    pub ledger: LedgerService,
    pub orders: Arc<OrdersManager>,
    pub clients: ClientService,
    pub registration: RegistrationService,
    pub payments: PaymentService,
    pub push: Arc<dyn PushSender>,
}

impl ServerState {
    /// Open the on-disk database and wire production integrations
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;
        let db_path = config.database_path();
        let storage = Storage::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Database opened");

        let integrations = Integrations::from_config(config)?;
        Ok(Self::assemble(config.clone(), storage, integrations))
    }

    /// Wire every service over an already opened storage
    pub fn assemble(config: Config, storage: Storage, integrations: Integrations) -> Self {
        let ledger = LedgerService::new(storage.clone(), config.funds_policy, config.order_bonus);

        let mut orders = OrdersManager::new(
            storage.clone(),
            ledger.clone(),
            OrderRules {
                min_bottles: config.min_mobile_bottles,
            },
        );
        if let Some(admin) = &config.admin_email {
            orders.set_admin_notifier(AdminNotifier::new(integrations.mailer.clone(), admin.clone()));
        }

        let codes = Arc::new(CodeStore::new(config.otp));
        let registration = RegistrationService::new(
            storage.clone(),
            codes,
            integrations.mailer.clone(),
            config.default_price12,
            config.default_price19,
        );
        let payments = PaymentService::new(
            storage.clone(),
            ledger.clone(),
            integrations.gateway,
            config.payment.callback_secret.clone(),
        );

        Self {
            clients: ClientService::new(storage.clone()),
            orders: Arc::new(orders),
            registration,
            payments,
            push: integrations.push,
            ledger,
            storage,
            config,
        }
    }

    /// In-memory storage with the given integrations (tests and local demos)
    pub fn in_memory(config: Config, integrations: Integrations) -> Result<Self> {
        let storage = Storage::open_in_memory()?;
        Ok(Self::assemble(config, storage, integrations))
    }

    /// Register the push dispatcher and the confirmation-code purge loop
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        let dispatcher = PushDispatcher::new(self.storage.clone(), self.push.clone(), self.orders.subscribe());
        let token = tasks.shutdown_token();
        tasks.spawn("push_dispatcher", TaskKind::Listener, dispatcher.run(token));

        let codes = self.registration.codes().clone();
        let token = tasks.shutdown_token();
        tasks.spawn("otp_purge", TaskKind::Periodic, async move {
            let mut interval = tokio::time::interval(OTP_PURGE_INTERVAL);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let purged = codes.purge_expired();
                        if purged > 0 {
                            tracing::debug!(purged, "Expired confirmation codes removed");
                        }
                    }
                }
            }
        });

        tasks.log_summary();
    }
}
