use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, SeaOrmAuthService, SeaOrmVirtualMachineService, VirtualMachineService,
};

/// Components shared by the HTTP layer and the CLI, built once at startup
/// from an explicit [`Config`].
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub vm_service: Arc<dyn VirtualMachineService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_url,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )?) as Arc<dyn AuthService + Send + Sync + 'static>;

        let vm_service = Arc::new(SeaOrmVirtualMachineService::new(store.clone()))
            as Arc<dyn VirtualMachineService + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(config),
            store,
            auth_service,
            vm_service,
        })
    }
}
