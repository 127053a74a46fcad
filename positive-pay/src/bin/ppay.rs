//! CLI tool to inspect, check and rewrite positive-pay issue files.

use clap::{Parser, Subcommand};
use fixedwidth_rs::EncodeOptions;
use positive_pay::{PositivePayFile, load, render, store_with, verify};
use std::io::{self, Write};
use std::process;
use tracing::info;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Work with positive-pay check issue files.
#[derive(Parser)]
#[command(name = "ppay")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log paths, record counts and codec activity on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the header, groups and checks of a file
    Decode {
        /// Positive-pay file to read
        input: String,
    },
    /// Check that every trailer matches its check records
    Verify {
        /// Positive-pay file to read
        input: String,
    },
    /// Decode a file and write it back out
    Reencode {
        /// Positive-pay file to read
        input: String,

        /// Write output to file instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Terminate lines with CRLF instead of LF
        #[arg(long)]
        crlf: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(io::stderr);
    Registry::default().with(filter).with(fmt_layer).init();
}

fn open(input: &str) -> PositivePayFile {
    info!(input, "reading");
    match load(input) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn print_file(file: &PositivePayFile) {
    println!("Bank:     {:05}", file.header.bank_id);
    println!("Account:  {}", file.header.account_number);
    for (index, group) in file.check_groups.iter().enumerate() {
        println!(
            "Group {}: {} check(s), total {}",
            index + 1,
            group.trailer.record_count,
            group.trailer.total_amount
        );
        for check in &group.records {
            println!(
                "  {:010}  {}  {:>12}  {}",
                check.check_serial,
                check.issue_date,
                check.amount.to_string(),
                check.payee
            );
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Decode { input } => {
            let file = open(&input);
            print_file(&file);
        }
        Command::Verify { input } => {
            let file = open(&input);
            let discrepancies = verify(&file);
            if discrepancies.is_empty() {
                println!("{input}: OK ({} group(s))", file.check_groups.len());
                return;
            }
            for discrepancy in &discrepancies {
                eprintln!("{input}: {discrepancy}");
            }
            process::exit(1);
        }
        Command::Reencode {
            input,
            output,
            crlf,
        } => {
            let file = open(&input);
            let mut options = EncodeOptions::default().with_final_newline();
            if crlf {
                options = options.crlf();
            }

            if let Some(out_path) = &output {
                info!(output = %out_path, crlf, "writing");
                if let Err(e) = store_with(out_path, &file, &options) {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
                return;
            }

            let text = match render(&file, &options) {
                Ok(text) => text,
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
            if let Err(e) = io::stdout().write_all(text.as_bytes()) {
                eprintln!("Error writing output: {e}");
                process::exit(1);
            }
        }
    }
}
