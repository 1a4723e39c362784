use crate::database::CURRENT_SCHEMA_VERSION;
use crate::manager::PitManager;
use anyhow::{Context, Result};

pub async fn execute(manager: &PitManager) -> Result<()> {
    manager
        .store()
        .upgrade()
        .await
        .context("Schema upgrade failed")?;

    println!("Schema is at version {}", CURRENT_SCHEMA_VERSION);
    Ok(())
}
