use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use move37_core::catalog;
use move37_core::composer::compose;
use move37_core::store::DataStore;
use move37_genai::{GeminiClient, GenAiConfig, ImagenClient};
use move37_pipeline::character_sheet::generate_character_sheet;
use move37_pipeline::{CharacterReferenceRequest, ReferenceGenerator, ThrottlePolicy};

/// Reference sheet and prompt tooling for Move37 data directories.
#[derive(Parser, Debug)]
#[command(name = "move37", author, version, about, long_about = None)]
struct Cli {
    /// Data root holding characters/, environments/, styles/ and cinematography/
    #[arg(long, global = true, env = "DATA_ROOT", default_value = "data")]
    data_dir: PathBuf,

    /// Log format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate reference images for a character
    Character {
        /// Character id (file name under characters/ without .json)
        id: String,

        /// Style to generate for; defaults to the character's style_id
        #[arg(long)]
        style: Option<String>,

        /// Regenerate images that already exist
        #[arg(long)]
        force: bool,

        /// Images per angle
        #[arg(long, default_value_t = 1)]
        variants: u32,

        /// Only generate this angle (front, side, back, head)
        #[arg(long)]
        angle: Option<String>,

        /// Print the plan as JSON without generating anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate reference images for an environment
    Environment {
        /// Environment id (file name under environments/ without .json)
        id: String,

        /// Regenerate images that already exist
        #[arg(long)]
        force: bool,

        /// Print the plan as JSON without generating anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Render one image per character sheet in the data directory
    BatchRender,

    /// Print the prompt composed from a sheet or sequence file
    Prompt {
        /// JSON file: character sheet, environment sheet or scene sequence
        file: PathBuf,
    },

    /// Turn a free-text description into a character sheet
    CharacterJson {
        /// Natural language description of the character
        description: String,

        /// Save the sheet as characters/<ID>.json instead of printing it
        #[arg(long, value_name = "ID")]
        save: Option<String>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let store = DataStore::new(&cli.data_dir);

    match cli.command {
        Command::Character {
            id,
            style,
            force,
            variants,
            angle,
            dry_run,
        } => {
            let request = CharacterReferenceRequest {
                character_id: id,
                style_id: style,
                force,
                variant_count: variants,
                target_angle: angle,
            };
            let generator = reference_generator(store)?;

            if dry_run {
                let (_, plan) = generator.plan_character(&request)?;
                println!("{}", serde_json::to_string_pretty(&plan)?);
                return Ok(());
            }

            let references = generator
                .generate_character_references(&request)
                .await
                .with_context(|| format!("generating references for '{}'", request.character_id))?;
            println!("{}", serde_json::to_string_pretty(&references)?);
        }

        Command::Environment { id, force, dry_run } => {
            let generator = reference_generator(store)?;

            if dry_run {
                let (_, plan) = generator.plan_environment(&id, force)?;
                println!("{}", serde_json::to_string_pretty(&plan)?);
                return Ok(());
            }

            let references = generator
                .generate_environment_references(&id, force)
                .await
                .with_context(|| format!("generating references for '{id}'"))?;
            println!("{}", serde_json::to_string_pretty(&references)?);
        }

        Command::BatchRender => {
            let rendered = reference_generator(store)?
                .render_character_sheets()
                .await
                .context("rendering character sheets")?;
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }

        Command::Prompt { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let record: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", file.display()))?;
            println!("{}", compose(&record, &store)?);
        }

        Command::CharacterJson { description, save } => {
            let config = GenAiConfig::from_env();
            let text = GeminiClient::new(config.http_client()?, &config);
            let sheet = generate_character_sheet(&text, &description).await?;
            let pretty = serde_json::to_string_pretty(&sheet)?;

            match save {
                Some(id) => {
                    let filename = format!("{id}.json");
                    catalog::write_record(store.root(), "characters", &filename, &pretty)?;
                    tracing::info!(filename = %filename, "Character sheet saved");
                }
                None => println!("{pretty}"),
            }
        }
    }

    Ok(())
}

/// Build the orchestrator with the live image client.
fn reference_generator(store: DataStore) -> Result<ReferenceGenerator> {
    let config = GenAiConfig::from_env();
    if config.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set, generation calls will fail");
    }
    let images = Arc::new(ImagenClient::new(config.http_client()?, &config));
    Ok(ReferenceGenerator::new(store, images, ThrottlePolicy::from_env()))
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "move37_cli=info,move37_pipeline=info,move37_genai=info".into());

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn character_flags_parse() {
        let cli = Cli::parse_from([
            "move37", "character", "kaelen", "--style", "noir", "--variants", "3", "--angle",
            "head", "--force",
        ]);
        match cli.command {
            Command::Character {
                id,
                style,
                force,
                variants,
                angle,
                dry_run,
            } => {
                assert_eq!(id, "kaelen");
                assert_eq!(style.as_deref(), Some("noir"));
                assert!(force);
                assert_eq!(variants, 3);
                assert_eq!(angle.as_deref(), Some("head"));
                assert!(!dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn batch_render_takes_no_arguments() {
        let cli = Cli::parse_from(["move37", "batch-render"]);
        assert!(matches!(cli.command, Command::BatchRender));
        assert!(Cli::try_parse_from(["move37", "batch-render", "kaelen"]).is_err());
    }

    #[test]
    fn data_dir_is_global() {
        let cli = Cli::parse_from(["move37", "prompt", "scene.json", "--data-dir", "/tmp/data"]);
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/data"));
    }
}

