use anyhow::Context as _;
use devflow_core::config::Config;
use devflow_core::store::Store;
use devflow_core::{io, paths};

use super::Context;
use crate::output::print_json;

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let root = &ctx.root;
    let dir = paths::devflow_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config_path = paths::config_path(root);
    let config_created = !config_path.exists();
    if config_created {
        Config::default()
            .save(root)
            .context("failed to write config.yaml")?;
    }

    let db_path = paths::database_path(root);
    let store_created = !db_path.exists();
    Store::open(&db_path).context("failed to create store")?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "root": root,
            "config_created": config_created,
            "store_created": store_created,
        }));
    }

    println!("Initializing devflow in: {}", root.display());
    for (created, name) in [
        (config_created, paths::CONFIG_FILE),
        (store_created, paths::DATABASE_FILE),
    ] {
        let label = if created { "created:" } else { "exists: " };
        println!("  {label} {name}");
    }
    println!("\nSet GEMINI_API_KEY to enable AI features, then run `devflow serve`.");
    Ok(())
}
