//! `baton config`: configuration management commands.

use anyhow::Context as _;
use baton_config::AppConfig;

pub async fn validate() -> anyhow::Result<()> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            // Additional validation checks
            let mut warnings = Vec::new();

            if config.completion.api_key.is_none() {
                warnings.push("No API key set (set BATON_API_KEY for a live completion client)");
            }

            if config.engine.max_depth == 0 {
                warnings.push("engine.max_depth is 0; sub-agent delegation is disabled");
            }

            if config.dispatch.timeout_ms == 0 {
                warnings.push("dispatch.timeout_ms is 0; tool attempts run unbounded");
            }

            if config.stream.viewer == "hidden" {
                warnings.push("stream.viewer is 'hidden'; watch output carries only structural frames");
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for warning in &warnings {
                    println!("   ⚠️  {warning}");
                }
            }

            println!();
            println!("   Model:           {}", config.completion.model);
            println!("   Iterations:      {}", config.engine.max_iterations);
            println!("   Max depth:       {}", config.engine.max_depth);
            println!("   Tool timeout:    {}ms", config.dispatch.timeout_ms);
            println!("   Tool retries:    {}", config.dispatch.max_retries);
            println!("   Stream capacity: {}", config.stream.capacity);
            println!("   Viewer:          {}", config.stream.viewer);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> anyhow::Result<()> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn config_path_is_valid() {
        let path = baton_config::AppConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().contains("config.toml"));
    }
}
