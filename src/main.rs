use std::error::Error;

use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file when present;
    // a missing file is fine, variables may come from the environment.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    ai_llm_service::telemetry::init("info,doc_chat_backend=info,api=info,contextor=info");
    info!("starting document chat backend");

    if let Err(e) = api::start().await {
        error!(error = %e, "server exited with error");
        return Err(e.into());
    }

    Ok(())
}
