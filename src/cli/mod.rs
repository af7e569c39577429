/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Tommaso Fontana
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Command-line interface structs, functions, and methods.
//!
//! Each module corresponds to a command.

use crate::graphs::load::ArcPolicy;
use crate::partition::Partition;
use crate::worker::Job;
use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use std::time::SystemTime;

pub mod generate;
pub mod launch;
pub mod oracle;
pub mod run;
pub mod worker;

pub mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));

    pub fn version_string() -> String {
        format!(
            "{}
git info: {} {} {}
build info: built for {} with {}",
            PKG_VERSION,
            GIT_VERSION.unwrap_or(""),
            GIT_COMMIT_HASH.unwrap_or(""),
            match GIT_DIRTY {
                None => "",
                Some(true) => "(dirty)",
                Some(false) => "(clean)",
            },
            TARGET,
            RUSTC_VERSION
        )
    }
}

/// Parses a duration from a string.
/// If no suffix is given, it is assumed to be in milliseconds.
/// You can use suffixes, the available ones are:
/// - `s` for seconds
/// - `m` for minutes
/// - `h` for hours
/// - `d` for days
///
/// Example: `1d2h3m4s567` this is parsed as: 1 day, 2 hours, 3 minutes, 4 seconds, and 567 milliseconds.
pub(crate) fn parse_duration(value: &str) -> Result<Duration> {
    if value.is_empty() {
        bail!("Empty duration string, if you want every 0 milliseconds use `0`.");
    }
    let mut duration = Duration::from_secs(0);
    let mut acc = String::new();
    for c in value.chars() {
        if c.is_ascii_digit() {
            acc.push(c);
        } else if c.is_whitespace() {
            continue;
        } else {
            let dur = acc.parse::<u64>()?;
            match c {
                's' => duration += Duration::from_secs(dur),
                'm' => duration += Duration::from_secs(dur * 60),
                'h' => duration += Duration::from_secs(dur * 60 * 60),
                'd' => duration += Duration::from_secs(dur * 60 * 60 * 24),
                _ => return Err(anyhow!("Invalid duration suffix: {}", c)),
            }
            acc.clear();
        }
    }
    if !acc.is_empty() {
        let dur = acc.parse::<u64>()?;
        duration += Duration::from_millis(dur);
    }
    Ok(duration)
}

/// Initializes the `env_logger` logger with a custom format including
/// timestamps with elapsed time since initialization.
pub fn init_envlogger() -> Result<()> {
    use jiff::fmt::friendly::{Designator, Spacing, SpanPrinter};
    use jiff::SpanRound;

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    let start = std::time::Instant::now();
    let printer = SpanPrinter::new()
        .spacing(Spacing::None)
        .designator(Designator::Compact);
    let span_round = SpanRound::new()
        .largest(jiff::Unit::Day)
        .smallest(jiff::Unit::Millisecond)
        .days_are_24_hours();

    builder.format(move |buf, record| {
        let Ok(ts) = jiff::Timestamp::try_from(SystemTime::now()) else {
            return Err(std::io::Error::other("Failed to get timestamp"));
        };
        let style = buf.default_level_style(record.level());
        let elapsed = start.elapsed();
        let span = jiff::Span::new()
            .seconds(elapsed.as_secs() as i64)
            .milliseconds(elapsed.subsec_millis() as i64);
        let span = span.round(span_round).map_err(std::io::Error::other)?;
        writeln!(
            buf,
            "{} {} {style}{}{style:#} [{:?}] {} - {}",
            ts.strftime("%F %T%.3f"),
            printer.span_to_string(&span),
            record.level(),
            std::thread::current().id(),
            record.target(),
            record.args()
        )
    });
    builder.try_init()?;
    Ok(())
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    #[arg(long, value_parser = parse_duration, global=true, display_order = 1000)]
    /// How often to log progress. Default is 10s. You can use the suffixes "s"
    /// for seconds, "m" for minutes, "h" for hours, and "d" for days. If no
    /// suffix is provided it is assumed to be in milliseconds.
    /// Example: "1d2h3m4s567" is parsed as 1 day + 2 hours + 3 minutes + 4
    /// seconds + 567 milliseconds = 93784567 milliseconds.
    pub log_interval: Option<Duration>,
}

/// Shared CLI arguments describing a shortest-path job on a graph file.
#[derive(Args, Debug, Clone)]
pub struct JobArgs {
    /// The graph, in text format.
    pub graph: PathBuf,
    /// The source node.
    pub source: usize,
    /// The destination node.
    pub destination: usize,
    #[arg(long, value_enum, default_value_t = Partition::RoundRobin)]
    /// How nodes are assigned to workers.
    pub partition: Partition,
    #[arg(long)]
    /// The maximum number of supersteps (default: the number of nodes).
    pub max_supersteps: Option<usize>,
    #[arg(long)]
    /// Drop arcs with out-of-range endpoints instead of failing.
    pub lenient: bool,
}

impl JobArgs {
    pub fn job(&self) -> Job {
        Job::new(self.source, self.destination)
            .partition(self.partition)
            .max_supersteps(self.max_supersteps)
    }

    pub fn arc_policy(&self) -> ArcPolicy {
        if self.lenient {
            ArcPolicy::Drop
        } else {
            ArcPolicy::Reject
        }
    }

    /// Returns the command-line arguments that parse to these arguments.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            self.graph.clone().into(),
            self.source.to_string().into(),
            self.destination.to_string().into(),
        ];
        if let Some(value) = self.partition.to_possible_value() {
            args.push("--partition".into());
            args.push(value.get_name().into());
        }
        if let Some(max_supersteps) = self.max_supersteps {
            args.push("--max-supersteps".into());
            args.push(max_supersteps.to_string().into());
        }
        if self.lenient {
            args.push("--lenient".into());
        }
        args
    }
}

#[derive(Subcommand, Debug)]
pub enum SubCommands {
    Run(run::CliArgs),
    Worker(worker::CliArgs),
    Launch(launch::CliArgs),
    Oracle(oracle::CliArgs),
    #[command(subcommand)]
    Generate(generate::SubCommands),
}

#[derive(Parser, Debug)]
#[command(name = "bsp-sssp", version=build_info::version_string())]
/// Bulk-synchronous parallel single-source shortest paths.
///
/// Noteworthy environment variables:
///
/// - RUST_LOG: configuration for env_logger, e.g., `info` (the default) or
///   `debug`; you can also use `RUST_LOG=bsp_sssp=debug` to see only the logs
///   of this crate.
pub struct Cli {
    #[command(subcommand)]
    pub command: SubCommands,
    #[clap(flatten)]
    pub args: GlobalArgs,
}

/// The entry point of the command-line interface.
pub fn cli_main<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let start = std::time::Instant::now();
    let cli = Cli::parse_from(args);
    match cli.command {
        SubCommands::Run(args) => {
            run::main(cli.args, args)?;
        }
        SubCommands::Worker(args) => {
            worker::main(cli.args, args)?;
        }
        SubCommands::Launch(args) => {
            launch::main(cli.args, args)?;
        }
        SubCommands::Oracle(args) => {
            oracle::main(cli.args, args)?;
        }
        SubCommands::Generate(args) => {
            generate::main(cli.args, args)?;
        }
    }

    log::info!(
        "The command took {}",
        pretty_print_elapsed(start.elapsed().as_secs_f64())
    );

    Ok(())
}

/// Pretty-prints seconds in a human-readable format.
fn pretty_print_elapsed(elapsed: f64) -> String {
    let mut result = String::new();
    let mut elapsed_seconds = elapsed as u64;
    let days = elapsed_seconds / (60 * 60 * 24);
    elapsed_seconds %= 60 * 60 * 24;
    let hours = elapsed_seconds / (60 * 60);
    elapsed_seconds %= 60 * 60;
    let minutes = elapsed_seconds / 60;

    match days {
        0 => {}
        1 => result.push_str("1 day "),
        _ => result.push_str(&format!("{} days ", days)),
    }
    match hours {
        0 => {}
        1 => result.push_str("1 hour "),
        _ => result.push_str(&format!("{} hours ", hours)),
    }
    match minutes {
        0 => {}
        1 => result.push_str("1 minute "),
        _ => result.push_str(&format!("{} minutes ", minutes)),
    }

    result.push_str(&format!("{:.3} seconds ({}s)", elapsed % 60.0, elapsed));
    result
}
