//! Type command handler for inspecting static data.

use anyhow::{Context, Result};

use structurebot_lib::Config;

use crate::output::{render_type, OutputFormat};

/// Resolve `name` through the configured static data and print it.
pub fn handle_type(config: &Config, name: &str, format: OutputFormat) -> Result<()> {
    let registry = config
        .type_registry()
        .context("failed to load static data")?;
    let ty = registry.resolve(name)?;
    print!("{}", render_type(&ty, format)?);
    Ok(())
}
