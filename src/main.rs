use clap::{Parser as ClapParser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use treeq::cli::{self, CliError, EvalOptions, EvalResult};
use treeq::{EncoderPreferences, EvalConfig, InputFormat, OutputFormat};

#[derive(ClapParser)]
#[command(name = "treeq")]
#[command(about = "treeq - Query and rewrite YAML, JSON and properties documents")]
#[command(version)]
struct Cli {
    /// Log evaluation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression against each input document
    Eval {
        /// The expression to evaluate
        expression: String,

        /// Input file (reads --input or stdin if not provided)
        file: Option<PathBuf>,

        /// Document text to use as input
        #[arg(long, conflicts_with = "file")]
        input: Option<String>,

        #[arg(short = 'p', long, value_enum, default_value_t = InputFormat::Yaml)]
        input_format: InputFormat,

        #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Yaml)]
        output_format: OutputFormat,

        /// Indentation for YAML and JSON output; 0 prints compact JSON
        #[arg(short = 'I', long, default_value_t = 2)]
        indent: usize,

        /// Keep `\( ... )` in string literals verbatim
        #[arg(long)]
        no_interpolation: bool,

        /// Write sequence positions as key[0] in properties output
        #[arg(long)]
        array_brackets: bool,

        /// Only validate syntax, don't execute
        #[arg(long)]
        syntax_only: bool,
    },

    /// List documentation categories
    Docs,

    /// Show documentation for a specific category
    Doc {
        /// Category name (use 'treeq docs' to list categories)
        category: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Eval {
            expression,
            file,
            input,
            input_format,
            output_format,
            indent,
            no_interpolation,
            array_brackets,
            syntax_only,
        } => read_input(file, input).and_then(|input| {
            run_eval(EvalOptions {
                expression,
                input,
                input_format,
                output_format,
                preferences: EncoderPreferences {
                    indent,
                    use_array_brackets: array_brackets,
                    ..EncoderPreferences::default()
                },
                config: EvalConfig {
                    interpolation: !no_interpolation,
                },
                syntax_only,
            })
        }),
        Commands::Docs => {
            print!("{}", cli::get_docs_overview());
            Ok(())
        }
        Commands::Doc { category } => cli::get_doc_category(&category).map(|content| {
            print!("{}", content);
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "treeq=debug" } else { "treeq=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(file: Option<PathBuf>, input: Option<String>) -> Result<Option<String>, CliError> {
    if let Some(path) = file {
        return Ok(Some(fs::read_to_string(path)?));
    }
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

fn run_eval(options: EvalOptions) -> Result<(), CliError> {
    match cli::execute_eval(&options)? {
        EvalResult::SyntaxValid => println!("Syntax is valid"),
        EvalResult::Success(output) => print!("{}", output),
    }
    Ok(())
}
