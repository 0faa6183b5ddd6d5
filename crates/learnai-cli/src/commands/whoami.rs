//! The `learnai whoami` command.

use anyhow::Result;

use learnai_client::config::LearnaiConfig;
use learnai_core::store::anonymous_user_id;

pub fn execute(config: &LearnaiConfig) -> Result<()> {
    println!("{}", anonymous_user_id(&config.storage()));
    Ok(())
}
