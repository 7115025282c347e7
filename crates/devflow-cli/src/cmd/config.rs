use clap::Subcommand;
use devflow_core::config::{AiConfig, WarnLevel};

use super::Context;
use crate::output::print_json;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the loaded configuration
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(ctx: &Context, subcmd: ConfigSubcommand) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(ctx),
        ConfigSubcommand::Validate => validate(ctx),
    }
}

fn show(ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let key_set = AiConfig::api_key().is_some();

    if ctx.json {
        return print_json(&serde_json::json!({
            "config": config,
            "api_key_configured": key_set,
        }));
    }

    println!("AI");
    println!("  api_base:     {}", config.ai.api_base);
    println!("  pro_model:    {}", config.ai.pro_model);
    println!("  flash_model:  {}", config.ai.flash_model);
    println!("  timeout_secs: {}", config.ai.timeout_secs);
    println!("  api key:      {}", if key_set { "set" } else { "not set" });
    println!("Server");
    println!("  port:         {}", config.server.port);
    println!("  open_browser: {}", config.server.open_browser);
    println!("Preview");
    println!("  transpiler:   {}", config.preview.transpiler_url);
    println!("  prefix:       {}", config.preview.resource_prefix);
    Ok(())
}

fn validate(ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let warnings = config.validate();

    if ctx.json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
