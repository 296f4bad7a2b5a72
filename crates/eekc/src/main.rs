use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use eek::{BuildError, Definition, EekError, Evaluator, ExecVar, ExecutionConfig, SourceMap, Value};
use log::{debug, warn};
use rustyline::{error::ReadlineError, DefaultEditor};

#[derive(Parser, Debug)]
#[command(name = "eekc", version, about = "Build and run eek evaluator definitions")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a definition and report the formula's result type
    Check {
        #[arg(value_name = "DEFINITION")]
        definition: PathBuf,
        /// Print the assembled program
        #[arg(long)]
        emit_source: bool,
    },
    /// Build a definition and evaluate it once
    Eval {
        #[arg(value_name = "DEFINITION")]
        definition: PathBuf,
        /// Override a variable, e.g. `--set N=76`
        #[arg(long = "set", value_name = "NAME=VALUE")]
        overrides: Vec<String>,
        #[command(flatten)]
        limits: Limits,
    },
    /// Build a definition, then evaluate it for each line of overrides
    Repl {
        #[arg(value_name = "DEFINITION")]
        definition: PathBuf,
        #[command(flatten)]
        limits: Limits,
    },
}

#[derive(clap::Args, Debug)]
struct Limits {
    /// Abort an evaluation after this many milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
    /// Abort an evaluation after this many interpreter steps
    #[arg(long, value_name = "N")]
    max_steps: Option<u64>,
}

impl Limits {
    fn config(&self) -> ExecutionConfig {
        let mut config = ExecutionConfig::default();
        if let Some(ms) = self.timeout_ms {
            config = config.with_timeout(Some(Duration::from_millis(ms)));
        }
        config.with_max_steps(self.max_steps)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    match args.command {
        Command::Check {
            definition,
            emit_source,
        } => {
            let evaluator = build(&definition, ExecutionConfig::default())?;
            let artifact = evaluator
                .artifact()
                .ok_or_else(|| anyhow!("evaluator was not built"))?;
            if emit_source {
                print!("{}", artifact.source());
            }
            match artifact.result_type() {
                Some(ty) => println!("ok: {} returns {ty}", evaluator.name()),
                None => println!("ok: {}", evaluator.name()),
            }
        }
        Command::Eval {
            definition,
            overrides,
            limits,
        } => {
            let evaluator = build(&definition, limits.config())?;
            let overrides = parse_overrides(&evaluator, overrides.iter().map(String::as_str))?;
            let value = evaluator.evaluate(overrides)?;
            println!("{value}");
        }
        Command::Repl { definition, limits } => {
            let evaluator = build(&definition, limits.config())?;
            repl(&evaluator)?;
        }
    }
    Ok(())
}

fn build(path: &Path, config: ExecutionConfig) -> Result<Evaluator> {
    let definition = Definition::load(path)?;
    let mut evaluator = Evaluator::from_definition(&definition);
    evaluator.set_execution_config(config);
    if let Err(err) = evaluator.build() {
        if let EekError::Build(BuildError::Compile(compile)) = &err {
            if let Some(diagnostic) = compile.diagnostic() {
                let source = eek::assemble::assemble(evaluator.registry());
                let sources = SourceMap::single(path.display().to_string(), source);
                bail!("{}", diagnostic.render(&sources));
            }
        }
        return Err(err).with_context(|| format!("failed to build {}", path.display()));
    }
    debug!("built {}", path.display());
    Ok(evaluator)
}

/// Parses `NAME=VALUE` pairs, reading each value as its variable's type.
fn parse_overrides<'s>(evaluator: &Evaluator, pairs: impl Iterator<Item = &'s str>) -> Result<ExecVar> {
    let mut overrides = ExecVar::new();
    for pair in pairs {
        let (name, text) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected NAME=VALUE, got `{pair}`"))?;
        let name = name.trim();
        let var = evaluator
            .registry()
            .variable(name)
            .ok_or_else(|| anyhow!("unknown variable {name}"))?;
        let value: Value = var.ty.parse_value(text)?;
        overrides.insert(name.to_string(), value);
    }
    Ok(overrides)
}

fn repl(evaluator: &Evaluator) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!(
        "{}: enter NAME=VALUE overrides separated by spaces, empty line for defaults, :quit to exit",
        evaluator.name()
    );
    loop {
        match rl.readline("eek> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == ":quit" || trimmed == ":exit" {
                    break;
                }
                if trimmed == ":source" {
                    if let Some(artifact) = evaluator.artifact() {
                        print!("{}", artifact.source());
                    }
                    continue;
                }
                if let Some(entry) = history_entry(trimmed) {
                    if let Err(err) = rl.add_history_entry(entry) {
                        warn!("history entry dropped: {err}");
                    }
                }
                let result = parse_overrides(evaluator, trimmed.split_whitespace())
                    .and_then(|overrides| evaluator.evaluate(overrides).map_err(Into::into));
                match result {
                    Ok(value) => println!("{value}"),
                    Err(err) => eprintln!("error: {err}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("repl error: {err}");
                break;
            }
        }
    }
    Ok(())
}

/// Lines worth keeping in the repl history; blank input evaluates defaults.
fn history_entry(line: &str) -> Option<&str> {
    let line = line.trim();
    (!line.is_empty()).then_some(line)
}
