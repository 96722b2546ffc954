use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::{debug, info};

use xso_core::config::{self, CONFIG_FILE_NAME, XsoConfig};
use xso_core::ir::SchemaModel;
use xso_core::parse;
use xso_core::transform::{NumericClassifier, SkipPatterns};
use xso_core::{CodeGenerator, GeneratedFile};
use xso_odoo::{GenerationContext, OdooGenerator};

#[derive(Parser)]
#[command(name = "xso", about = "XSD class model to Odoo model generator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Odoo models from a class-model bundle
    Generate {
        /// Path to the class-model bundle (YAML or JSON)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Leave the generated sources unformatted
        #[arg(long)]
        no_format: bool,
    },

    /// Check a bundle and the project configuration
    Validate {
        /// Path to the class-model bundle
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Inspect registry names, implicit inverses and modules of a bundle
    Inspect {
        /// Path to the class-model bundle
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,
    },

    /// Initialize a new xso configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            output,
            no_format,
        } => cmd_generate(input, output, no_format),

        Commands::Validate { input } => cmd_validate(input),

        Commands::Inspect { input, format } => cmd_inspect(input, format),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "xso", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<XsoConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))
}

fn load_bundle(path: &Path) -> Result<SchemaModel> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");

    let model = match ext {
        "json" => parse::from_json(&content),
        _ => parse::from_yaml(&content),
    }
    .with_context(|| format!("invalid bundle {}", path.display()))?;
    Ok(model)
}

/// Directory relative schema locations of a bundle are resolved against.
fn schema_dir(bundle: &Path) -> PathBuf {
    match bundle.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Write generated files to disk under the given base directory.
fn write_files(base: &Path, files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        let path = base.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, &file.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("  wrote {}", path.display());
    }
    Ok(())
}

/// Run `{command} format` over the generated files. A failing or missing
/// formatter aborts the run with everything it printed.
fn run_formatter(command: &str, output_dir: &Path, files: &[GeneratedFile]) -> Result<()> {
    if files.is_empty() {
        return Ok(());
    }

    let result = Command::new(command)
        .arg("format")
        .args(files.iter().map(|f| f.path.as_str()))
        .current_dir(output_dir)
        .output()
        .with_context(|| format!("failed to run `{command} format` in {}", output_dir.display()))?;

    let stdout = String::from_utf8_lossy(&result.stdout);
    let stderr = String::from_utf8_lossy(&result.stderr);
    if !result.status.success() {
        anyhow::bail!(
            "`{command} format` failed ({}):\n{}{}",
            result.status,
            stdout,
            stderr
        );
    }
    debug!("{command} format: {}", stdout.trim());
    eprintln!("  formatted with {command}");
    Ok(())
}

fn cmd_generate(input: Option<PathBuf>, output: Option<PathBuf>, no_format: bool) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let input = input.unwrap_or_else(|| PathBuf::from(&cfg.input));
    let output_dir = output.unwrap_or_else(|| PathBuf::from(&cfg.output));
    let model = load_bundle(&input)?;

    eprintln!("Generating {} → {}", input.display(), output_dir.display());
    let generator = OdooGenerator::with_schema_dir(schema_dir(&input));
    let files = generator
        .generate(&model, &cfg)
        .map_err(|e| anyhow::anyhow!(e))?;

    fs::create_dir_all(&output_dir).with_context(|| {
        format!("failed to create output directory {}", output_dir.display())
    })?;
    write_files(&output_dir, &files)?;

    if cfg.format.enabled && !no_format {
        run_formatter(&cfg.format.command, &output_dir, &files)?;
    } else {
        info!("formatting disabled");
    }

    eprintln!("Generated {} files in {}", files.len(), output_dir.display());
    Ok(())
}

fn cmd_validate(input: PathBuf) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let model = load_bundle(&input)?;

    SkipPatterns::new(&cfg.skip)?;
    NumericClassifier::from_config(&cfg.numeric)?;

    let enumerations = model.forest.iter().filter(|c| c.is_enumeration()).count();
    eprintln!("Valid bundle: {}", input.display());
    eprintln!("  Classes: {}", model.forest.len());
    eprintln!("  Enumerations: {enumerations}");
    eprintln!("  Modules: {}", model.modules.len());
    eprintln!("  Packages: {}", model.packages.len());
    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_inspect(input: PathBuf, format: InspectFormat) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let model = load_bundle(&input)?;
    let ctx = GenerationContext::collect(&model, &cfg, Some(schema_dir(&input).as_path()))?;

    let summary = build_inspect_summary(&ctx);

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{}", yaml);
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_inspect_summary(ctx: &GenerationContext) -> serde_json::Value {
    let registry_names: serde_json::Map<String, serde_json::Value> = ctx
        .names
        .iter()
        .map(|entry| {
            (
                entry.registry_name.clone(),
                serde_json::json!({
                    "class": ctx.forest.get(entry.class).qname,
                    "path": entry.path,
                    "unique_path": entry.unique_path,
                }),
            )
        })
        .collect();

    let modules: Vec<serde_json::Value> = ctx
        .modules
        .iter()
        .map(|(name, roots)| {
            let classes: Vec<&str> = roots
                .iter()
                .map(|id| ctx.forest.get(*id).qname.as_str())
                .collect();
            serde_json::json!({
                "name": name,
                "classes": classes,
            })
        })
        .collect();

    serde_json::json!({
        "registry_names": registry_names,
        "implicit_inverses": ctx.inverses,
        "modules": modules,
    })
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"
classes:
  - qname: "{ns}TNFe"
    name: TNFe
    attributes:
      - name: det
        max_occurs: unbounded
        types: [{class: "{ns}det"}]
    inner:
      - qname: "{ns}det"
        name: det
modules:
  nfe.v4_00.leiaute: ["{ns}TNFe"]
"#;

    #[test]
    fn schema_dir_defaults_to_current_dir() {
        assert_eq!(schema_dir(Path::new("classes.yaml")), PathBuf::from("."));
        assert_eq!(schema_dir(Path::new("schemas/nfe/classes.yaml")), PathBuf::from("schemas/nfe"));
    }

    #[test]
    fn loads_bundles_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("classes.yaml");
        fs::write(&yaml, BUNDLE).unwrap();
        assert_eq!(load_bundle(&yaml).unwrap().forest.len(), 2);

        let json = dir.path().join("classes.json");
        fs::write(&json, r#"{"classes": [{"qname": "A", "name": "A"}]}"#).unwrap();
        assert_eq!(load_bundle(&json).unwrap().forest.len(), 1);

        assert!(load_bundle(&dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn writes_module_tree() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![GeneratedFile {
            path: "nfe/v4_00/leiaute.py".to_string(),
            title: "nfe.v4_00.leiaute".to_string(),
            content: "import textwrap\n".to_string(),
        }];
        write_files(dir.path(), &files).unwrap();
        let written = fs::read_to_string(dir.path().join("nfe/v4_00/leiaute.py")).unwrap();
        assert_eq!(written, "import textwrap\n");
    }

    #[test]
    fn missing_formatter_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![GeneratedFile {
            path: "models.py".to_string(),
            title: "models".to_string(),
            content: String::new(),
        }];
        assert!(run_formatter("xso-no-such-formatter", dir.path(), &files).is_err());
        assert!(run_formatter("xso-no-such-formatter", dir.path(), &[]).is_ok());
    }

    #[test]
    fn inspect_lists_names_and_inverses() {
        let model = parse::from_yaml(BUNDLE).unwrap();
        let cfg = XsoConfig {
            schema: "nfe".to_string(),
            version: "40".to_string(),
            ..XsoConfig::default()
        };
        let ctx = GenerationContext::collect(&model, &cfg, None).unwrap();
        let summary = build_inspect_summary(&ctx);

        assert_eq!(summary["registry_names"]["nfe.40.det"]["path"], "Tnfe.Det");
        assert_eq!(summary["registry_names"]["nfe.40.det"]["class"], "{ns}det");
        assert_eq!(summary["implicit_inverses"]["nfe.40.det"][0]["parent"], "nfe.40.tnfe");
        assert_eq!(summary["modules"][0]["name"], "nfe.v4_00.leiaute");
    }
}
