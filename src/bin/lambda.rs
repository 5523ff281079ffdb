use lambda_http::{tracing, Error};
use roster_api::api::gateway;
use roster_api::state::{AppState, Backends};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let config = roster_api::config::config();
    let backends = Backends::from_config(config).await;
    let state = AppState::new(config, &backends);

    gateway::run(state.dispatcher).await
}
