//! Display model configuration command.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::info;
use vship_flat::DisplayModel;
use vship_flat::display_model::{to_cvvdp_json, write_cvvdp_json};

pub fn run(presets: &[String], output: Option<PathBuf>) -> Result<()> {
    let models = collect(presets)?;

    match output {
        Some(path) => {
            write_cvvdp_json(&models, &path)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            info!("Wrote {} display models", models.len());
            println!("Saved to: {}", path.display());
        }
        None => println!("{}", to_cvvdp_json(&models)?),
    }

    Ok(())
}

fn collect(presets: &[String]) -> Result<BTreeMap<String, DisplayModel>> {
    let mut models = BTreeMap::new();
    for key in presets {
        let Some(model) = DisplayModel::preset(key) else {
            bail!(
                "Unknown display preset '{}' (expected one of: {})",
                key,
                DisplayModel::PRESET_KEYS.join(", ")
            );
        };
        models.insert(key.clone(), model);
    }
    Ok(models)
}
