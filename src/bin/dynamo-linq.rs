//! dynamo-linq: translate host queries to PartiQL from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Translate a query against a model file
//! dynamo-linq --model model.toml translate 'Person.Where(p => p.Age > 10)'
//!
//! # Show every stage of the translation
//! dynamo-linq explain 'Person.Select(p => new { p.Name, p.Age })'
//!
//! # List the entities of the model
//! dynamo-linq entities
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use dynamo_linq::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dynamo-linq")]
#[command(version)]
#[command(about = "Translate object queries into PartiQL", long_about = None)]
#[command(after_help = "EXAMPLES:
    dynamo-linq --model model.toml translate 'Person.Where(p => p.Age > 10)'
    dynamo-linq explain 'Person.Where(p => p.Name.StartsWith(\"A\")).Select(p => p.Name)'
    dynamo-linq --format json entities")]
struct Cli {
    /// Entity model file (TOML)
    #[arg(short, long, env = "DYNAMO_LINQ_MODEL")]
    model: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Verbose output (debug logging)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a query and print the PartiQL statement
    Translate {
        /// The query chain, e.g. `Person.Where(p => p.Age > 10)`
        query: String,
    },
    /// Show the parsed chain, the query shape and the statement
    Explain {
        /// The query chain to explain
        query: String,
    },
    /// List the entities of the model
    Entities,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    init_tracing(cli.verbose)?;
    let model = load_model(cli.model.as_ref())?;

    match &cli.command {
        Commands::Translate { query } => translate_query(&model, query, cli.format),
        Commands::Explain { query } => explain_query(&model, query, cli.format),
        Commands::Entities => list_entities(&model, cli.format),
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "dynamo_linq=debug" } else { "dynamo_linq=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// `--model`, then `$DYNAMO_LINQ_MODEL`, then `<config dir>/dynamo-linq/model.toml`.
fn load_model(path: Option<&PathBuf>) -> Result<Model> {
    let path = match path {
        Some(path) => path.clone(),
        None => {
            let default = dirs::config_dir()
                .map(|dir| dir.join("dynamo-linq").join("model.toml"))
                .filter(|path| path.exists());
            match default {
                Some(path) => path,
                None => bail!("No model file. Use --model or set DYNAMO_LINQ_MODEL"),
            }
        }
    };

    Model::load_from_file(&path)
        .with_context(|| format!("Failed to load model from {}", path.display()))
}

fn translate_query(model: &Model, query: &str, format: OutputFormat) -> Result<()> {
    let chain = dynamo_linq::parse(query)?;
    let shape = dynamo_linq::translate(model, &chain)?;
    let partiql = shape.to_partiql()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&partiql)?),
        OutputFormat::Text => {
            println!("{}", partiql.statement.white());
            print_parameters(&partiql);
        }
    }
    Ok(())
}

fn print_parameters(partiql: &PartiqlQuery) {
    if partiql.parameters.is_empty() {
        return;
    }
    println!();
    println!("{}", "Parameters:".cyan());
    for (i, parameter) in partiql.parameters.iter().enumerate() {
        println!(
            "  ?{} = {} {}",
            i + 1,
            parameter.value.to_string().yellow(),
            format!("({})", parameter.attribute_type.descriptor()).dimmed()
        );
    }
}

fn explain_query(model: &Model, query: &str, format: OutputFormat) -> Result<()> {
    let chain = dynamo_linq::parse(query)?;
    let shape = dynamo_linq::translate(model, &chain)?;
    let partiql = shape.to_partiql()?;

    if format == OutputFormat::Json {
        let explanation = serde_json::json!({
            "chain": chain,
            "shape": shape,
            "query": partiql,
        });
        println!("{}", serde_json::to_string_pretty(&explanation)?);
        return Ok(());
    }

    println!("{} {}", "Query:".dimmed(), query.yellow());
    println!();

    println!("{}", "Operators:".green().bold());
    for operator in &chain.operators {
        println!("  • {}", operator.to_string().white());
    }
    println!();

    println!("{}", "Query Shape:".green().bold());
    println!(
        "  {} {} {}",
        "From:".dimmed(),
        shape.from().to_string().cyan(),
        format!("(table \"{}\")", shape.from().table).dimmed()
    );
    match shape.filter() {
        Some(filter) => println!("  {} {}", "Filter:".dimmed(), filter.to_string().white()),
        None => println!("  {} {}", "Filter:".dimmed(), "(none)".dimmed()),
    }
    if shape.projection_map().is_empty() {
        println!("  {} {}", "Projection:".dimmed(), "(whole entity)".dimmed());
    } else {
        println!("  {}", "Projection:".dimmed());
        for (member, expr) in shape.projection_map() {
            println!("    {} → {}", member.to_string().cyan(), expr.to_string().white());
        }
    }
    println!();

    println!("{}", "PartiQL:".green().bold());
    println!("  {}", partiql.statement.white());
    print_parameters(&partiql);
    Ok(())
}

fn list_entities(model: &Model, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(model)?);
        return Ok(());
    }

    if model.entities.is_empty() {
        println!("{}", "(no entities)".dimmed());
        return Ok(());
    }

    for entity in &model.entities {
        println!(
            "{} {}",
            entity.name.cyan().bold(),
            format!("→ \"{}\"", entity.table_name()).dimmed()
        );
        if let Some(key) = &entity.partition_key {
            println!("  {} {}", "Partition key:".dimmed(), key.yellow());
        }
        if let Some(key) = &entity.sort_key {
            println!("  {} {}", "Sort key:".dimmed(), key.yellow());
        }
        for property in &entity.properties {
            let attribute = if property.attribute_name() == property.name {
                String::new()
            } else {
                format!(" as \"{}\"", property.attribute_name())
            };
            println!(
                "  {:20} {:10}{}",
                property.name.white(),
                property.host_type.to_string().dimmed(),
                attribute.yellow()
            );
        }
    }
    Ok(())
}
