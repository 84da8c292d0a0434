use std::io::{BufRead, IsTerminal};
use std::process;

use clap::{CommandFactory, Parser};

use bridgework::Urn;

/// Bridgework CLI — URN parser and inspector.
///
/// Parses one or more canonical URN strings
/// (urn:domain:partition:tenant:owner:class:id) given as an argument or on
/// stdin (one per line) and prints a structured representation in the
/// chosen format.
#[derive(Parser)]
#[command(name = "bridgework-cli", version, about, long_about = None)]
struct Cli {
    /// A single URN string. Reads from stdin when omitted.
    #[arg(value_name = "URN")]
    urn: Option<String>,

    /// Domain substituted when the domain segment is empty.
    #[arg(long, default_value = "")]
    default_domain: String,

    /// Output format.
    #[arg(short, long, default_value = "json", value_enum)]
    format: OutputFormat,

    /// Pretty-print JSON output (ignored for other formats).
    #[arg(short, long)]
    pretty: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OutputFormat {
    /// JSON output
    Json,
    /// Canonical urn:...:... string
    Canonical,
    /// Human-readable debug output
    Debug,
}

fn main() {
    let cli = Cli::parse();

    // When no URN is provided and stdin is a terminal (not piped), show
    // help instead of blocking.
    if cli.urn.is_none() && std::io::stdin().is_terminal() {
        Cli::command().print_help().ok();
        println!();
        process::exit(0);
    }

    let inputs = match read_inputs(&cli) {
        Ok(lines) => lines,
        Err(e) => {
            eprintln!("Error reading input: {e}");
            process::exit(1);
        }
    };

    if inputs.is_empty() {
        eprintln!("Error: empty input");
        process::exit(1);
    }

    for input in inputs {
        let urn = match Urn::parse_with_default_domain(&input, &cli.default_domain) {
            Ok(urn) => urn,
            Err(e) => {
                eprintln!("Parse error: {e}");
                process::exit(2);
            }
        };

        match cli.format {
            OutputFormat::Json => println!("{}", format_json(&urn, cli.pretty)),
            OutputFormat::Canonical => println!("{urn}"),
            OutputFormat::Debug => print!("{}", format_debug(&urn)),
        }
    }
}

/// Collect URN strings from the argument or stdin (one per line).
fn read_inputs(cli: &Cli) -> Result<Vec<String>, std::io::Error> {
    if let Some(urn) = &cli.urn {
        return Ok(vec![urn.clone()]);
    }

    let mut lines = Vec::new();
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    Ok(lines)
}

/// Serialize a [`Urn`] to a JSON string.
fn format_json(urn: &Urn, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(urn).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    } else {
        serde_json::to_string(urn).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

/// Render a [`Urn`] in a human-readable debug format.
fn format_debug(urn: &Urn) -> String {
    let field = |value: &Option<String>| -> String {
        value.clone().unwrap_or_else(|| "(none)".to_string())
    };

    let mut out = String::with_capacity(128);
    out.push_str("=== URN ===\n");
    out.push_str(&format!("Domain:    {}\n", urn.domain));
    out.push_str(&format!("Partition: {}\n", field(&urn.partition)));
    out.push_str(&format!("Tenant:    {}\n", field(&urn.tenant)));
    out.push_str(&format!("Owner:     {}\n", field(&urn.owner)));
    out.push_str(&format!("Class:     {}\n", urn.class));
    out.push_str(&format!("Id:        {}\n", urn.id));
    out.push_str("===========\n");
    out
}
