use std::error::Error;

use iabc::IabcConfig;
use tokio::io::AsyncReadExt;

/// Classify the text on stdin and print the result as JSON.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();
    let config = IabcConfig::from_file(iabc::config_path_from_env())?;
    iabc::init_tracing(&config.log_level);

    let classifier = iabc::bootstrap(&config)?;

    // One byte past the limit is enough to tell that it was exceeded.
    let cap = config.limits.max_input_bytes as u64 + 1;
    let mut bytes = Vec::new();
    tokio::io::stdin().take(cap).read_to_end(&mut bytes).await?;
    let text = iabc::decode_input(bytes, &config.limits)?;

    let result = classifier.classify(&text).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
