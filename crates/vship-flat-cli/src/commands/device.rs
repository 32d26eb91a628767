//! Library version and GPU listing.

use anyhow::{Context, Result};
use tracing::info;
use vship_flat::Vship;

pub fn version() -> Result<()> {
    let vship = Vship::native();
    println!("libvship {}", vship.version());
    Ok(())
}

pub fn list(check: bool) -> Result<()> {
    let vship = Vship::native();
    let count = vship.device_count().context("Failed to count GPUs")?;

    println!("GPUs: {}", count);
    println!("{:-<60}", "");
    for id in 0..count as i32 {
        let info = vship
            .device_info(id)
            .with_context(|| format!("Failed to query GPU {}", id))?;
        println!("[{}] {}", id, info);

        if check {
            info!("Running full check on GPU {}", id);
            match vship.gpu_full_check(id) {
                Ok(()) => println!("    check: ok"),
                Err(err) => println!("    check: {}", err),
            }
        }
    }

    Ok(())
}
