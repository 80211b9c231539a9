use clap::Subcommand;
use gtm_core::config::{default_config_path, Config};

use crate::output::print_json;
use crate::wiring::Env;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration after env overrides
    Show,
    /// Write a default config file if none exists
    Init,
}

pub fn run(env: &Env, subcommand: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcommand {
        ConfigSubcommand::Show => {
            if json {
                return print_json(&env.config);
            }
            print!("{}", serde_yaml::to_string(&env.config)?);
            println!("# data dir: {}", env.data_dir.display());
            Ok(())
        }
        ConfigSubcommand::Init => {
            let path = default_config_path()?;
            if path.exists() {
                println!("Config already exists at {}", path.display());
                return Ok(());
            }
            Config::default().save(&path)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}
