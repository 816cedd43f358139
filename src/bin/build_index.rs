use std::error::Error;

use iabc::{IabcConfig, Secrets};

/// Embed the configured taxonomy's domains and persist the index.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();
    let config = IabcConfig::from_file(iabc::config_path_from_env())?;
    iabc::init_tracing(&config.log_level);

    let embedder = iabc::build_embedder(&config, &Secrets::from_env())?;
    let index = iabc::build_index(&config, embedder.as_ref()).await?;

    println!(
        "Indexed {} domains ({} dimensions, model {}) into {}",
        index.len(),
        index.dimension(),
        embedder.model_name(),
        config.index.dir.display()
    );

    Ok(())
}
