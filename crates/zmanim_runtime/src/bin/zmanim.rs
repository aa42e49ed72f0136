//! Zmanim CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use zmanim_engine::{
    CalculationRequest, CalculationService, EngineConfig, InMemoryDirectory, RangeRequest,
    StaticCalendar,
};
use zmanim_foundation::{ActiveEvents, CalcFlags, Error, Location, Result};
use zmanim_runtime::{
    OutputFormat, PublisherFile, Repl, Reply, logging, render_day, render_issues, render_preview,
    render_range,
};

/// Calculate halachic times from formulas.
#[derive(Parser, Debug)]
#[command(name = "zmanim", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    options: GlobalOptions,
}

#[derive(Args, Debug, Default)]
struct GlobalOptions {
    /// Active event codes, comma separated (overrides the file's calendar)
    #[arg(long, global = true, value_delimiter = ',')]
    events: Option<Vec<String>>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Include formulas that are disabled
    #[arg(long, global = true)]
    include_disabled: bool,

    /// Include formulas that are not published
    #[arg(long, global = true)]
    include_unpublished: bool,

    /// Include beta formulas
    #[arg(long, global = true)]
    include_beta: bool,

    /// Compute formulas whose tags exclude them today
    #[arg(long, global = true)]
    include_inactive: bool,

    /// Fail references to undefined formulas
    #[arg(long, global = true)]
    strict: bool,

    /// Skip the result cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calculate one day from a publisher file
    Calc {
        /// Publisher file
        file: PathBuf,
        /// Date (YYYY-MM-DD), today if omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Calculate a range of days from a publisher file
    Range {
        /// Publisher file
        file: PathBuf,
        /// First date (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Last date (YYYY-MM-DD), inclusive
        #[arg(long)]
        to: NaiveDate,
        /// Only report this formula key
        #[arg(long)]
        zman: Option<String>,
    },
    /// Evaluate one formula at a location
    Eval {
        /// Formula text
        formula: String,
        /// Latitude in degrees, north positive
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in degrees, east positive
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Elevation in meters
        #[arg(long, default_value_t = 0.0)]
        elevation: f64,
        /// IANA timezone name
        #[arg(long)]
        tz: String,
        /// Date (YYYY-MM-DD), today if omitted
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Show each step of the evaluation
        #[arg(long)]
        breakdown: bool,
    },
    /// Check every formula in a publisher file without calculating
    Check {
        /// Publisher file
        file: PathBuf,
    },
    /// Start the interactive REPL
    Repl {
        /// Publisher file to load first
        file: Option<PathBuf>,
        /// Session date (YYYY-MM-DD), today if omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

impl GlobalOptions {
    const fn flags(&self) -> CalcFlags {
        CalcFlags {
            include_disabled: self.include_disabled,
            include_unpublished: self.include_unpublished,
            include_beta: self.include_beta,
            include_inactive: self.include_inactive,
        }
    }

    const fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }

    fn config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_strict_references(self.strict)
            .with_cache_enabled(!self.no_cache)
    }

    fn events(&self) -> Option<ActiveEvents> {
        self.events
            .as_ref()
            .map(|codes| codes.iter().map(|c| c.trim()).filter(|c| !c.is_empty()).collect())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(logging::level_for(cli.options.verbose));

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

/// Runs a command. `Ok(false)` means the command ran but found problems.
fn run(cli: Cli) -> Result<bool> {
    let options = cli.options;
    match cli.command {
        Command::Calc { file, date } => {
            let file = PublisherFile::load(&file)?;
            let service = file.service(options.config())?;
            let date = date.unwrap_or_else(today);
            let mut request = CalculationRequest::new(file.publisher_id(), file.locality_id(), date)
                .with_flags(options.flags());
            if let Some(events) = options.events() {
                request = request.with_events(events);
            }
            let day = service.calculate(&request)?;
            println!("{}", render_day(&day, options.format())?);
            Ok(true)
        }
        Command::Range {
            file,
            from,
            to,
            zman,
        } => {
            let file = PublisherFile::load(&file)?;
            let service = file.service(options.config())?;
            let mut request = RangeRequest::new(file.publisher_id(), file.locality_id(), from, to)
                .with_flags(options.flags());
            if let Some(key) = zman {
                request = request.with_zman_key(key);
            }
            if options.no_cache {
                request = request.bypassing_cache();
            }
            let days = service.calculate_range(&request)?;
            println!("{}", render_range(&days, options.format())?);
            Ok(true)
        }
        Command::Eval {
            formula,
            lat,
            lon,
            elevation,
            tz,
            date,
            breakdown,
        } => {
            let location = Location::with_timezone_name(lat, lon, &tz)?.with_elevation(elevation);
            let service = CalculationService::with_directory(
                options.config(),
                Arc::new(InMemoryDirectory::new()),
                Arc::new(StaticCalendar::new()),
            );
            let events = options.events().unwrap_or_default();
            let preview = service.preview_formula(
                &formula,
                &location,
                date.unwrap_or_else(today),
                &events,
                None,
            )?;
            println!("{}", render_preview(&preview, breakdown, options.format())?);
            Ok(preview.diagnostic.is_none())
        }
        Command::Check { file } => {
            let file = PublisherFile::load(&file)?;
            file.location()?;
            file.definitions()?;
            let findings = file.check();
            for (key, issue) in &findings {
                println!("{}", render_issues(key, std::slice::from_ref(issue)));
            }
            if findings.is_empty() {
                println!("{} formulas ok", file.zmanim.len());
            }
            Ok(findings.is_empty())
        }
        Command::Repl { file, date } => {
            let mut repl = Repl::new()?.with_date(date.unwrap_or_else(today));
            if let Some(path) = file {
                let path = path.to_str().ok_or_else(|| {
                    Error::invalid_argument(format!("{} is not valid UTF-8", path.display()))
                })?;
                if let Reply::Text(text) = repl.eval(&format!(":load {path}"))? {
                    println!("{text}");
                }
            }
            if let Some(codes) = options.events {
                repl.eval(&format!(":events {}", codes.join(",")))?;
            }
            repl.run()?;
            Ok(true)
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
