//! Demonstration CLI: reads a schema JSON file and a rule JSON file, compiles
//! the rule against the schema for the requested dialect, and prints the
//! resulting SQL fragment and ordered parameters. Performs no execution —
//! purely a thin shell around [`rulesql::compile`].

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rulesql::{compile, Dialect, Schema};

#[derive(Parser, Debug)]
#[command(name = "rulesql", about = "Compile a JSON-Logic rule against a schema into parameterized SQL")]
struct Cli {
    /// Path to the schema JSON file.
    #[arg(long)]
    schema: PathBuf,

    /// Path to the rule JSON file, or "-" to read from stdin.
    #[arg(long)]
    rule: PathBuf,

    /// Target SQL dialect.
    #[arg(long, value_enum, default_value = "postgres")]
    dialect: CliDialect,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliDialect {
    Postgres,
    Mysql,
    Mssql,
    Sqlite,
}

impl From<CliDialect> for Dialect {
    fn from(value: CliDialect) -> Self {
        match value {
            CliDialect::Postgres => Dialect::Postgres,
            CliDialect::Mysql => Dialect::MySql,
            CliDialect::Mssql => Dialect::Mssql,
            CliDialect::Sqlite => Dialect::Sqlite,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let schema_raw = fs::read_to_string(&cli.schema).map_err(|e| format!("reading schema: {e}"))?;
    let schema_json: serde_json::Value =
        serde_json::from_str(&schema_raw).map_err(|e| format!("parsing schema JSON: {e}"))?;
    let schema = Schema::from_json(&schema_json).map_err(|e| format!("loading schema: {e}"))?;
    schema.validate_self().map_err(|e| format!("invalid schema: {e}"))?;

    let rule_raw = if cli.rule == PathBuf::from("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("reading rule from stdin: {e}"))?;
        buf
    } else {
        fs::read_to_string(&cli.rule).map_err(|e| format!("reading rule: {e}"))?
    };
    let rule_json: serde_json::Value =
        serde_json::from_str(&rule_raw).map_err(|e| format!("parsing rule JSON: {e}"))?;

    let compiled = compile(&schema, cli.dialect.into(), &rule_json).map_err(|e| e.to_string())?;

    println!("{}", compiled.sql);
    println!("{}", serde_json::to_string_pretty(&compiled.params).unwrap());
    Ok(())
}
