//! `adorn watched`: Print the parameter watch list as JSON.

use super::showcase::Showcase;
use crate::config::AdornConfig;

pub fn execute(config: &AdornConfig, pretty: bool) -> anyhow::Result<()> {
    let engine = super::engine(config, None);
    Showcase::define(&engine, &config.showcase)?;

    let watched = engine.registry().all_watched();
    tracing::debug!("{} watched parameter(s)", watched.len());
    let json = if pretty {
        serde_json::to_string_pretty(&watched)?
    } else {
        serde_json::to_string(&watched)?
    };
    println!("{}", json);
    Ok(())
}
