use budgetwise_advisor::{
    api::{start_server, ApiState},
    config::{AdvisorConfig, ServerConfig},
    store::{FinancialDataStore, PostgresFinancialStore},
    AdvisoryChatService,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let advisor_config = AdvisorConfig::from_env();
    let server_config = ServerConfig::from_env();

    if !advisor_config.has_api_key() {
        warn!("OPENROUTER_API_KEY not set; chat will answer with the not-configured message");
    }

    info!("BudgetWise Advisor - API Server");
    info!("Port: {}", server_config.port);
    info!("Model: {}", advisor_config.model);

    let store: Option<Arc<dyn FinancialDataStore>> = match server_config.database_url.as_deref() {
        Some(url) => match PostgresFinancialStore::connect_lazy(url) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                warn!("Financial data store disabled: {}", e);
                None
            }
        },
        None => {
            info!("No DATABASE_URL; context must be supplied by clients");
            None
        }
    };

    let state = ApiState {
        advisor: Arc::new(AdvisoryChatService::from_config(advisor_config)),
        store,
    };

    start_server(state, server_config.port).await?;

    Ok(())
}
