use clap::{Parser as ClapParser, Subcommand};
use jsonpath_overlay::{
    cli::{self, ApplyOptions, CliError, CompareOptions, QueryOptions, QueryResult},
    output::OutputFormat,
};
use std::{
    io::{self, Read},
    path::PathBuf,
};

#[derive(ClapParser)]
#[command(name = "jpo")]
#[command(about = "jpo - JSONPath queries and overlays for JSON and YAML documents")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a JSONPath query and print the selected nodes
    Query {
        /// The JSONPath query, e.g. '$.store.book[?@.price < 10].title'
        path: String,

        /// Document input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,

        /// Print the nodelist as YAML
        #[arg(long, conflicts_with = "pretty")]
        yaml: bool,

        /// Enable the `~` property-name extension
        #[arg(long)]
        property_names: bool,

        /// Only validate syntax, don't execute
        #[arg(long)]
        syntax_only: bool,
    },

    /// Apply an overlay to a document and print the result
    Apply {
        /// Overlay file
        #[arg(short, long)]
        overlay: PathBuf,

        /// Document input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Print the overlay that turns ORIGINAL into TARGET
    Compare {
        original: PathBuf,
        target: PathBuf,

        /// Existing overlay to extend
        #[arg(short, long)]
        existing: Option<PathBuf>,

        /// Title of a newly created overlay
        #[arg(short, long)]
        title: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Query {
            path,
            input,
            pretty,
            yaml,
            property_names,
            syntax_only,
        } => run_query(path, input, pretty, yaml, property_names, syntax_only),
        Commands::Apply { overlay, input } => read_input(input).and_then(|input| {
            let output = cli::execute_apply(&ApplyOptions { input, overlay })?;
            print!("{}", output);
            Ok(())
        }),
        Commands::Compare {
            original,
            target,
            existing,
            title,
        } => cli::execute_compare(&CompareOptions {
            original,
            target,
            existing,
            title,
        })
        .map(|output| print!("{}", output)),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// Falls back to stdin when no input was given and stdin is not a terminal
fn read_input(input: Option<String>) -> Result<Option<String>, CliError> {
    match input {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn run_query(
    query: String,
    input: Option<String>,
    pretty: bool,
    yaml: bool,
    property_names: bool,
    syntax_only: bool,
) -> Result<(), CliError> {
    let input = if syntax_only { input } else { read_input(input)? };

    let format = match (yaml, pretty) {
        (true, _) => OutputFormat::Yaml,
        (false, true) => OutputFormat::JsonPretty,
        (false, false) => OutputFormat::Json,
    };

    let options = QueryOptions {
        query,
        input,
        format,
        property_names,
        syntax_only,
    };

    match cli::execute_query(&options)? {
        QueryResult::SyntaxValid => println!("Syntax is valid"),
        QueryResult::Success(output) => println!("{}", output.trim_end()),
    }
    Ok(())
}
