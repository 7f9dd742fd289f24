pub mod toml_config;

pub use toml_config::EngineConfig;

#[cfg(feature = "cli")]
mod cli {
    use crate::utils::error::Result;
    use crate::utils::validation::{validate_file_extension, validate_path, Validate};
    use clap::{Parser, Subcommand};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "astro-match")]
    #[command(about = "Astrological and questionnaire compatibility scoring")]
    pub struct CliConfig {
        /// TOML 配置檔
        #[arg(long, global = true)]
        pub config: Option<String>,

        #[arg(long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Score one pair and print the JSON report
        Score {
            /// JSON array with exactly two participants
            #[arg(long)]
            pair: String,
        },
        /// Score a subject against many candidates and write a CSV ranking
        Rank {
            #[arg(long)]
            subject: String,
            #[arg(long)]
            candidates: String,
            #[arg(long, default_value = "./ranking.csv")]
            output: String,
        },
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            if let Some(config) = &self.config {
                validate_path("config", config)?;
                validate_file_extension("config", config, &["toml"])?;
            }

            match &self.command {
                Command::Score { pair } => {
                    validate_path("pair", pair)?;
                    validate_file_extension("pair", pair, &["json"])?;
                }
                Command::Rank {
                    subject,
                    candidates,
                    output,
                } => {
                    validate_file_extension("subject", subject, &["json"])?;
                    validate_file_extension("candidates", candidates, &["json"])?;
                    validate_path("output", output)?;
                    validate_file_extension("output", output, &["csv"])?;
                }
            }
            Ok(())
        }
    }

}

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};
