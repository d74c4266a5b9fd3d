use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process;
use tracing::warn;

use pbs_cputime::config::Config;
use pbs_cputime::display::DisplayManager;
use pbs_cputime::file_discovery::{report_window, FileDiscovery};
use pbs_cputime::logging::init_logging;
use pbs_cputime::report::{Report, ReportOptions};
use pbs_cputime::timestamp_parser::TimestampParser;
use pbs_cputime::{AccountingAnalyzer, Filters};

#[derive(Parser)]
#[command(name = "pbs-cputime")]
#[command(about = "Statistic information of PBS accounting data")]
#[command(version)]
struct Cli {
    /// Start date. Format is [[yy]yy]mmdd or dd; missing year/month are taken from today
    start_date: String,

    /// Same as start_date. If not specified, treat as today
    end_date: Option<String>,

    /// Print all job stats at the end
    #[arg(short, long)]
    verbose: bool,

    /// Group by user
    #[arg(short, long)]
    user: bool,

    /// Group by group
    #[arg(short, long)]
    group: bool,

    /// Only count in specified user
    #[arg(short = 'U', long = "only-user")]
    only_user: Vec<String>,

    /// Only count in specified group
    #[arg(short = 'G', long = "only-group")]
    only_group: Vec<String>,

    /// Only count in specified queue
    #[arg(short = 'Q', long = "only-queue")]
    only_queue: Vec<String>,

    /// Treat specified queue as router queue (not included in the final result)
    #[arg(short = 'R', long = "ignore-queue")]
    ignore_queue: Vec<String>,

    /// Print job stats for multi-queue jobs (unusual, might hint at job id conflicts)
    #[arg(short = 'D', long = "debug-multiqueue")]
    debug_multiqueue: bool,

    /// Directory holding the daily accounting files
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        handle_error(e);
    }
}

fn run(cli: Cli) -> Result<()> {
    let (config, config_error) = Config::load_or_default();
    let _log_guard = init_logging(&config.logging, &config.paths.log_directory);
    if let Some(err) = config_error {
        warn!(error = %format!("{:#}", err), "Ignoring invalid configuration, using defaults");
    }

    let now = Utc::now();
    let start = TimestampParser::parse_date_arg(Some(cli.start_date.as_str()), now)?;
    let end = TimestampParser::parse_date_arg(cli.end_date.as_deref(), now)?;

    let files = FileDiscovery::new(cli.dir).daily_files(start, end);

    let filters = Filters::new(cli.only_user, cli.only_group, cli.only_queue);
    let router_queues: BTreeSet<String> = cli.ignore_queue.into_iter().collect();

    let mut analyzer = AccountingAnalyzer::new(report_window(start, end), filters);
    analyzer.ingest_files(&files);
    let aggregation = analyzer.finish(&router_queues);

    let options = ReportOptions {
        by_user: cli.user,
        by_group: cli.group,
        verbose: cli.verbose,
        debug_multiqueue: cli.debug_multiqueue,
    };
    let report = Report::build(&aggregation, options);
    DisplayManager::new(cli.json).display(&report)
}

fn handle_error(e: anyhow::Error) -> ! {
    eprintln!("{} {:#}", "error:".red().bold(), e);
    process::exit(1);
}
