//! `pantera quote`: offline evaluation of one trip text.

use std::sync::Arc;

use pantera_config::Config;
use pantera_engine::Engine;
use pantera_protocols::{RunFlag, TracingNotifier};

pub(crate) fn quote(config: &Config, text: &str) -> anyhow::Result<()> {
    let engine = Engine::new(config, Arc::new(TracingNotifier), RunFlag::new())?;
    let quote = engine.quote(text);
    println!("{}", serde_json::to_string_pretty(&quote)?);
    Ok(())
}
