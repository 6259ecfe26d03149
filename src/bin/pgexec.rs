//! pgexec — run checked statements and COPY loads from the shell
//!
//! # Usage
//!
//! ```bash
//! # Run a statement, expecting rows
//! pgexec exec "SELECT id, name FROM nodes LIMIT 5"
//!
//! # Prepare and run a statement with parameters
//! pgexec prepared get_node --sql "SELECT * FROM nodes WHERE id = $1" --param 42
//!
//! # Stream a tab-separated file into a table
//! pgexec copy nodes --file nodes.tsv
//!
//! # Show how text is escaped for COPY
//! pgexec escape 'a\b'
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use pgexec::logging::init_logging;
use pgexec::prelude::*;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pgexec")]
#[command(version)]
#[command(about = "Status-checked PostgreSQL execution and COPY loading", long_about = None)]
#[command(after_help = "EXAMPLES:
    pgexec exec 'SELECT 1'
    pgexec exec 'CREATE TABLE t (a int)' --expect command_ok
    pgexec prepared ins --sql 'INSERT INTO t VALUES ($1)' --param 7 --expect command_ok
    pgexec copy t --file rows.tsv")]
struct Cli {
    /// libpq connection string or URI
    #[arg(long, global = true, env = "PGEXEC_CONNINFO")]
    conninfo: Option<String>,

    /// Config file (defaults to the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `pgexec=trace`
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Verbose output (same as --log-level debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one statement and check its status
    Exec {
        /// The statement text
        sql: String,

        /// Expected result status
        #[arg(short, long, default_value = "tuples_ok")]
        expect: ExecStatus,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Register a statement with PREPARE and execute it
    Prepared {
        /// Statement name
        name: String,

        /// Statement body, with $1, $2 placeholders
        #[arg(long)]
        sql: String,

        /// Positional parameters
        #[arg(short, long)]
        param: Vec<String>,

        /// Parameter positions (0-based) that are sent as NULL instead
        #[arg(long)]
        null_at: Vec<usize>,

        /// Expected result status
        #[arg(short, long, default_value = "tuples_ok")]
        expect: ExecStatus,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Stream tab-separated rows into a table with COPY
    Copy {
        /// Target table
        table: String,

        /// Input file (stdin when omitted)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Column list
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Print the COPY text encoding of a value
    Escape {
        /// Text to escape
        text: String,

        /// Use a fixed buffer of this many bytes
        #[arg(long)]
        bounded: Option<usize>,

        /// Control character style
        #[arg(long)]
        style: Option<EscapeStyle>,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = ExecConfig::load(cli.config.as_deref())?;
    if let Some(conninfo) = cli.conninfo {
        config.conninfo = Some(conninfo);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    } else if cli.verbose {
        config.log_level = "debug".to_string();
    }
    init_logging(&config.log_level);

    match cli.command {
        Commands::Escape {
            text,
            bounded,
            style,
        } => {
            show_escape(&text, bounded, style.unwrap_or(config.escape_style));
            Ok(())
        }
        Commands::Exec {
            sql,
            expect,
            format,
        } => {
            let mut session = connect(&config)?;
            let mut conn = session.handle();
            let res = execute_simple(&mut conn, expect, &sql)?;
            print_result(&res, &format);
            Ok(())
        }
        Commands::Prepared {
            name,
            sql,
            param,
            null_at,
            expect,
            format,
        } => {
            let mut session = connect(&config)?;
            let mut conn = session.handle();
            exec_sql!(&mut conn, ExecStatus::CommandOk, "PREPARE {} AS {}", name, sql)?;

            let params: Params = param
                .into_iter()
                .enumerate()
                .map(|(i, v)| if null_at.contains(&i) { None } else { Some(v) })
                .collect();
            match execute_prepared(&mut conn, &name, &params, expect)? {
                Some(res) => print_result(&res, &format),
                None => println!("{} {}", "✓".green(), expect.to_string().dimmed()),
            }
            Ok(())
        }
        Commands::Copy {
            table,
            file,
            columns,
        } => {
            let mut session = connect(&config)?;
            let mut conn = session.handle();
            let rows = copy_rows(&mut conn, &config, &table, file, &columns)?;
            println!("{} {} row(s) copied into {}", "✓".green(), rows, table.cyan());
            Ok(())
        }
    }
}

fn connect(config: &ExecConfig) -> Result<PqSession> {
    let conninfo = config
        .conninfo
        .as_deref()
        .context("no connection string; use --conninfo or set PGEXEC_CONNINFO")?;
    Ok(PqSession::connect(conninfo)?)
}

fn copy_rows<C: Connection>(
    conn: &mut C,
    config: &ExecConfig,
    table: &str,
    file: Option<PathBuf>,
    columns: &[String],
) -> Result<u64> {
    let reader: Box<dyn BufRead> = match &file {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    if columns.is_empty() {
        exec_sql!(conn, ExecStatus::CopyIn, "COPY {} FROM STDIN", table)?;
    } else {
        exec_sql!(conn, ExecStatus::CopyIn, "COPY {} ({}) FROM STDIN", table, columns.join(","))?;
    }

    let mut batch = CopyRowBuffer::new(table)
        .style(config.escape_style)
        .chunk_size(config.copy_chunk_size);
    for line in reader.lines() {
        let line = line?;
        let fields: Vec<Option<&str>> = line
            .split('\t')
            .map(|f| if f == "\\N" { None } else { Some(f) })
            .collect();
        batch.push_row(conn, &fields)?;
    }
    Ok(batch.finish(conn)?)
}

fn show_escape(text: &str, bounded: Option<usize>, style: EscapeStyle) {
    match bounded {
        Some(size) => {
            let mut out = vec![0u8; size];
            let res = escape_bounded_with(style, &mut out, text.as_bytes());
            println!("{:?}", String::from_utf8_lossy(res.bytes(&out)));
            if res.truncated {
                println!(
                    "{} truncated after {} of {} input bytes",
                    "⚠".yellow(),
                    res.consumed,
                    text.len()
                );
            }
        }
        None => {
            let mut out = Vec::new();
            escape_with(style, text.as_bytes(), &mut out);
            println!("{:?}", String::from_utf8_lossy(&out));
        }
    }
}

fn print_result<R: QueryResult>(res: &R, format: &OutputFormat) {
    if res.columns() == 0 {
        match res.affected_rows() {
            Some(n) => println!("{} {} rows affected", "✓".green(), n),
            None => println!("{} {}", "✓".green(), res.status().to_string().dimmed()),
        }
        return;
    }

    let columns: Vec<String> = (0..res.columns())
        .map(|c| res.column_name(c).unwrap_or("?").to_string())
        .collect();

    match format {
        OutputFormat::Json => {
            let rows: Vec<BTreeMap<&str, serde_json::Value>> = (0..res.rows())
                .map(|r| {
                    columns
                        .iter()
                        .enumerate()
                        .map(|(c, name)| {
                            let value = res
                                .value(r, c)
                                .map(|v| serde_json::Value::String(v.to_string()))
                                .unwrap_or(serde_json::Value::Null);
                            (name.as_str(), value)
                        })
                        .collect()
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
        }
        OutputFormat::Table => {
            if res.rows() == 0 {
                println!("{}", "(no results)".dimmed());
                return;
            }

            // Calculate column widths
            let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
            for r in 0..res.rows() {
                for (c, width) in widths.iter_mut().enumerate() {
                    *width = (*width).max(res.value(r, c).unwrap_or("NULL").len());
                }
            }

            let header: Vec<String> = columns
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:width$}", c, width = w))
                .collect();
            println!("{}", header.join(" │ ").white().bold());

            let sep: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            println!("{}", sep.join("─┼─").dimmed());

            for r in 0..res.rows() {
                let cells: Vec<String> = widths
                    .iter()
                    .enumerate()
                    .map(|(c, w)| format!("{:width$}", res.value(r, c).unwrap_or("NULL"), width = w))
                    .collect();
                println!("{}", cells.join(" │ "));
            }

            println!();
            println!("{} row(s) returned", res.rows().to_string().cyan());
        }
    }
}
