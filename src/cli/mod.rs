//! SS-017: CLI subcommands (init, validate, synth, graph, drift, status).

use crate::core::types::{Document, DocumentFormat, StackConfig};
use crate::core::{parser, state, synth};
use crate::tripwire::drift;
use crate::units::hello_stack;
use clap::Subcommand;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new synthstack project
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate stack.yaml without synthesizing
    Validate {
        /// Path to stack.yaml
        #[arg(short, long, default_value = "stack.yaml")]
        file: PathBuf,
    },

    /// Compose the stack and emit the provisioning document
    Synth {
        /// Path to stack.yaml
        #[arg(short, long, default_value = "stack.yaml")]
        file: PathBuf,

        /// Write document and lock into this directory instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Document format
        #[arg(long, value_enum, default_value_t = DocumentFormat::Json)]
        format: DocumentFormat,
    },

    /// Show resources in dependency order with their dependencies
    Graph {
        /// Path to stack.yaml
        #[arg(short, long, default_value = "stack.yaml")]
        file: PathBuf,
    },

    /// Compare a fresh synthesis against the lock (tripwire)
    Drift {
        /// Path to stack.yaml
        #[arg(short, long, default_value = "stack.yaml")]
        file: PathBuf,

        /// Output directory holding the lock
        #[arg(short, long, default_value = "out")]
        out: PathBuf,

        /// Exit non-zero on any drift (for CI/cron)
        #[arg(long)]
        tripwire: bool,
    },

    /// Show the lock written by the last synth
    Status {
        /// Output directory holding the lock
        #[arg(short, long, default_value = "out")]
        out: PathBuf,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Synth { file, out, format } => cmd_synth(&file, out.as_deref(), format),
        Commands::Graph { file } => cmd_graph(&file),
        Commands::Drift {
            file,
            out,
            tripwire,
        } => cmd_drift(&file, &out, tripwire),
        Commands::Status { out } => cmd_status(&out),
    }
}

const TEMPLATE: &str = r#"version: "1.0"
name: hello
project: HelloStack

provider:
  region: ap-northeast-1
  default_tags: {}

vpc:
  cidr: 10.0.0.0/16
  azs: [ap-northeast-1a, ap-northeast-1c]
  private_subnets: [10.0.1.0/24, 10.0.2.0/24]
  public_subnets: [10.0.101.0/24, 10.0.102.0/24]
  enable_nat_gateway: true

instances:
  - name: connectable
    subnet_index: 0
    instance_type: t2.micro
"#;

fn cmd_init(path: &Path) -> Result<(), String> {
    let config_path = path.join("stack.yaml");
    if config_path.exists() {
        return Err(format!("{} already exists", config_path.display()));
    }

    std::fs::create_dir_all(path)
        .map_err(|e| format!("cannot create {}: {}", path.display(), e))?;
    std::fs::write(&config_path, TEMPLATE)
        .map_err(|e| format!("cannot write {}: {}", config_path.display(), e))?;

    println!("Initialized synthstack project at {}", path.display());
    println!("  Created: {}", config_path.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<(), String> {
    let config = parser::parse_config_file(file)?;
    let errors = parser::validate_config(&config);

    if errors.is_empty() {
        println!(
            "OK: {} (vpc {}, {} instances)",
            config.name,
            config.vpc.cidr,
            config.instances.len()
        );
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        Err(format!("{} validation error(s)", errors.len()))
    }
}

/// Parse and validate a stack config file, returning errors if invalid.
fn parse_and_validate(file: &Path) -> Result<StackConfig, String> {
    let config = parser::parse_config_file(file)?;
    let errors = parser::validate_config(&config);
    if errors.is_empty() {
        return Ok(config);
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err("validation failed".to_string())
}

/// Parse, validate, compose and synthesize in one go.
fn synthesize_file(file: &Path) -> Result<Document, String> {
    let config = parse_and_validate(file)?;
    let tree = hello_stack::compose(&config).map_err(|e| e.to_string())?;
    synth::synthesize(&tree).map_err(|e| e.to_string())
}

fn cmd_synth(file: &Path, out: Option<&Path>, format: DocumentFormat) -> Result<(), String> {
    let document = synthesize_file(file)?;
    let rendered = synth::render_document(&document, format).map_err(|e| e.to_string())?;

    match out {
        None => print!("{}", rendered),
        Some(dir) => {
            let path = state::write_output(dir, &document, &rendered, format)?;
            println!(
                "Synthesized {} ({} resources)",
                document.name,
                document.resources.len()
            );
            println!("  Wrote: {}", path.display());
            println!("  Wrote: {}", state::lock_file_path(dir).display());
        }
    }
    Ok(())
}

fn cmd_graph(file: &Path) -> Result<(), String> {
    let document = synthesize_file(file)?;
    println!(
        "Graph: {} ({} resources)",
        document.name,
        document.resources.len()
    );
    println!();
    for (i, record) in document.resources.iter().enumerate() {
        println!("  {:>3}. {} [{}]", i + 1, record.path, record.resource_type);
        for dep in &record.depends_on {
            println!("         <- {}", dep);
        }
    }
    Ok(())
}

fn cmd_drift(file: &Path, out: &Path, tripwire_mode: bool) -> Result<(), String> {
    let lock = state::load_lock(out)?.ok_or_else(|| {
        format!(
            "no lock at {}. Run `synthstack synth --out {}` first.",
            state::lock_file_path(out).display(),
            out.display()
        )
    })?;
    let document = synthesize_file(file)?;

    println!("Checking {} ({} resources)...", lock.name, lock.resources.len());
    let mut findings = drift::detect_drift(&lock, &document)?;
    findings.extend(drift::check_document_file(out, &lock));

    if findings.is_empty() {
        println!("No drift detected.");
        return Ok(());
    }

    for f in &findings {
        warn!(path = %f.path, kind = %f.kind, "drift detected");
        println!("  {}: {} ({})", f.kind, f.path, f.detail);
        println!("    Expected: {}", f.expected_hash);
        println!("    Actual:   {}", f.actual_hash);
    }
    println!();
    println!("Drift detected: {} finding(s)", findings.len());
    if tripwire_mode {
        return Err(format!("{} drift finding(s)", findings.len()));
    }
    Ok(())
}

fn cmd_status(out: &Path) -> Result<(), String> {
    let Some(lock) = state::load_lock(out)? else {
        println!("No lock found. Run `synthstack synth --out {}` first.", out.display());
        return Ok(());
    };

    println!("Stack: {}", lock.name);
    println!("  Generator: {}", lock.generator);
    println!("  Document:  {} ({})", lock.document, lock.document_hash);
    println!("  Resources: {}", lock.resources.len());
    for (path, fp) in &lock.resources {
        let deps = if fp.depends_on.is_empty() {
            String::new()
        } else {
            format!(" <- {}", fp.depends_on.join(", "))
        };
        println!("    {}: [{}]{}", path, fp.resource_type, deps);
    }
    Ok(())
}
