//! The interactive formula REPL.
//!
//! Each input line is either a `:command` or a formula, which is evaluated
//! for the session's date, location and active events. Formulas defined
//! with `:def` or loaded with `:load` can be referenced as `@key`.

use std::io::{self, Write};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use zmanim_engine::{CalculationService, EngineConfig, InMemoryDirectory, StaticCalendar};
use zmanim_foundation::{ActiveEvents, Error, FormulaDefinition, Location, Result};
use zmanim_language::validate_formula;

use crate::editor::{LineEditor, ReadResult, RustylineEditor, is_complete};
use crate::output::{OutputFormat, render_issues, render_preview};
use crate::publisher_file::PublisherFile;

const HELP: &str = "\
Enter a formula to evaluate it, e.g. `solar(16.1, before_sunrise)`.

Commands:
  :date [YYYY-MM-DD]              Show or set the date
  :loc [LAT LON TZ [ELEVATION]]   Show or set the location
  :events [a,b,... | none]        Show or set active event codes
  :def KEY FORMULA                Define a formula for @KEY references
  :defs                           List defined formulas
  :load FILE                      Load a publisher file's locality and formulas
  :breakdown [on|off]             Show each step of an evaluation
  :help                           Show this help
  :quit                           Exit (or Ctrl+D)";

/// What the REPL prints after one input.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    /// Text to print.
    Text(String),
    /// Leave the REPL.
    Quit,
}

/// The interactive REPL.
pub struct Repl<E: LineEditor = RustylineEditor> {
    editor: E,
    service: CalculationService,
    date: NaiveDate,
    location: Location,
    events: ActiveEvents,
    definitions: Vec<FormulaDefinition>,
    breakdown: bool,
    show_banner: bool,
    prompt: String,
    continuation_prompt: String,
}

impl Repl<RustylineEditor> {
    /// Creates a REPL with the rustyline editor.
    ///
    /// # Errors
    /// Returns an error if the editor fails to initialize.
    pub fn new() -> Result<Self> {
        Ok(Self::with_editor(RustylineEditor::new()?))
    }
}

impl<E: LineEditor> Repl<E> {
    /// Creates a REPL reading from `editor`, at Jerusalem on today's date.
    #[must_use]
    pub fn with_editor(editor: E) -> Self {
        let service = CalculationService::with_directory(
            EngineConfig::default(),
            Arc::new(InMemoryDirectory::new()),
            Arc::new(StaticCalendar::new()),
        );
        let location = Location {
            name: Some("Jerusalem".to_string()),
            latitude: 31.7683,
            longitude: 35.2137,
            elevation: 0.0,
            timezone: Tz::Asia__Jerusalem,
            is_israel: true,
        };
        Self {
            editor,
            service,
            date: Utc::now().date_naive(),
            location,
            events: ActiveEvents::new(),
            definitions: Vec::new(),
            breakdown: false,
            show_banner: true,
            prompt: "zmanim> ".to_string(),
            continuation_prompt: "   ...> ".to_string(),
        }
    }

    /// Builder method to set the date.
    #[must_use]
    pub const fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    /// Builder method to set the location.
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Disables the welcome banner.
    #[must_use]
    pub const fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// The session date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// The session location.
    #[must_use]
    pub const fn location(&self) -> &Location {
        &self.location
    }

    /// Runs the REPL until `:quit` or end of input.
    ///
    /// # Errors
    /// Returns an error if reading input fails.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            self.print_banner();
        }

        while let Some(input) = self.read_input()? {
            if input.trim().is_empty() {
                continue;
            }
            self.editor.add_history(&input);
            match self.eval(&input) {
                Ok(Reply::Text(text)) => println!("{text}"),
                Ok(Reply::Quit) => break,
                Err(e) => print_error(&e),
            }
        }
        Ok(())
    }

    /// Handles one input: a command or a formula.
    ///
    /// # Errors
    /// Returns an error for a malformed command or a formula that does not parse.
    pub fn eval(&mut self, input: &str) -> Result<Reply> {
        let input = input.trim();
        let Some(command) = input.strip_prefix(':') else {
            return self.eval_formula(input);
        };
        let (name, args) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(n, a)| (n, a.trim()));

        match name {
            "date" => self.date_command(args),
            "loc" => self.loc_command(args),
            "events" => Ok(self.events_command(args)),
            "def" => self.def_command(args),
            "defs" => Ok(self.defs_command()),
            "load" => self.load_command(args),
            "breakdown" => self.breakdown_command(args),
            "help" => Ok(Reply::Text(HELP.to_string())),
            "quit" | "q" | "exit" => Ok(Reply::Quit),
            other => Err(Error::invalid_argument(format!(
                "unknown command ':{other}' (try :help)"
            ))),
        }
    }

    fn eval_formula(&self, text: &str) -> Result<Reply> {
        let preview = self.service.preview_formula(
            text,
            &self.location,
            self.date,
            &self.events,
            Some(&self.definitions),
        )?;
        render_preview(&preview, self.breakdown, OutputFormat::Text).map(Reply::Text)
    }

    fn date_command(&mut self, args: &str) -> Result<Reply> {
        if !args.is_empty() {
            self.date = NaiveDate::parse_from_str(args, "%Y-%m-%d").map_err(|_| {
                Error::invalid_argument(format!("'{args}' is not a YYYY-MM-DD date"))
            })?;
        }
        Ok(Reply::Text(self.date.format("%A %Y-%m-%d").to_string()))
    }

    fn loc_command(&mut self, args: &str) -> Result<Reply> {
        let parts: Vec<&str> = args.split_whitespace().collect();
        match parts.as_slice() {
            [] => {}
            [lat, lon, tz, rest @ ..] if rest.len() <= 1 => {
                let number = |s: &str| {
                    s.parse::<f64>()
                        .map_err(|_| Error::invalid_argument(format!("'{s}' is not a number")))
                };
                let mut location = Location::with_timezone_name(number(lat)?, number(lon)?, tz)?;
                if let Some(elevation) = rest.first() {
                    location = location.with_elevation(number(elevation)?);
                }
                self.location = location;
            }
            _ => {
                return Err(Error::invalid_argument(
                    "usage: :loc LAT LON TZ [ELEVATION]",
                ));
            }
        }
        let l = &self.location;
        Ok(Reply::Text(format!(
            "{}{:.4}, {:.4}, {}m, {}",
            l.name.as_ref().map_or(String::new(), |n| format!("{n}: ")),
            l.latitude,
            l.longitude,
            l.elevation,
            l.timezone.name()
        )))
    }

    fn events_command(&mut self, args: &str) -> Reply {
        match args {
            "" => {}
            "none" => self.events = ActiveEvents::new(),
            codes => {
                self.events = codes
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .collect();
            }
        }
        if self.events.is_empty() {
            Reply::Text("no active events".to_string())
        } else {
            Reply::Text(self.events.sorted_codes().join(", "))
        }
    }

    fn def_command(&mut self, args: &str) -> Result<Reply> {
        let Some((key, formula)) = args.split_once(char::is_whitespace) else {
            return Err(Error::invalid_argument("usage: :def KEY FORMULA"));
        };
        let formula = formula.trim();
        let keys: Vec<&str> = self
            .definitions
            .iter()
            .map(|d| d.key.as_str())
            .chain(std::iter::once(key))
            .collect();
        let issues = validate_formula(formula, Some(key), &keys);

        let definition = FormulaDefinition::new(key, formula);
        match self.definitions.iter_mut().find(|d| d.key == key) {
            Some(existing) => *existing = definition,
            None => self.definitions.push(definition),
        }
        self.editor.add_completions(vec![key.to_string()]);

        if issues.is_empty() {
            Ok(Reply::Text(format!("defined @{key}")))
        } else {
            Ok(Reply::Text(format!(
                "defined @{key} with problems:\n{}",
                render_issues(key, &issues)
            )))
        }
    }

    fn defs_command(&self) -> Reply {
        if self.definitions.is_empty() {
            return Reply::Text("no formulas defined".to_string());
        }
        let width = self.definitions.iter().map(|d| d.key.len()).max().unwrap_or(0);
        let lines: Vec<String> = self
            .definitions
            .iter()
            .map(|d| format!("@{:<width$}  {}", d.key, d.formula))
            .collect();
        Reply::Text(lines.join("\n"))
    }

    fn load_command(&mut self, args: &str) -> Result<Reply> {
        if args.is_empty() {
            return Err(Error::invalid_argument("usage: :load FILE"));
        }
        let file = PublisherFile::load(args)?;
        self.location = file.location()?;
        self.definitions = file.definitions()?;
        self.editor
            .add_completions(self.definitions.iter().map(|d| d.key.clone()).collect());
        Ok(Reply::Text(format!(
            "loaded {} formulas for {}",
            self.definitions.len(),
            self.location.name.as_deref().unwrap_or("unnamed locality")
        )))
    }

    fn breakdown_command(&mut self, args: &str) -> Result<Reply> {
        self.breakdown = match args {
            "" => !self.breakdown,
            "on" => true,
            "off" => false,
            other => {
                return Err(Error::invalid_argument(format!(
                    "expected on or off, got '{other}'"
                )));
            }
        };
        let state = if self.breakdown { "on" } else { "off" };
        Ok(Reply::Text(format!("breakdown {state}")))
    }

    /// Reads one input, continuing while brackets are open.
    fn read_input(&mut self) -> Result<Option<String>> {
        let mut input = String::new();
        loop {
            let prompt = if input.is_empty() {
                &self.prompt
            } else {
                &self.continuation_prompt
            };
            match self.editor.read_line(prompt)? {
                ReadResult::Line(line) => {
                    if !input.is_empty() {
                        input.push('\n');
                    }
                    input.push_str(&line);
                    if is_complete(&input) {
                        return Ok(Some(input));
                    }
                }
                ReadResult::Interrupted => {
                    if !input.is_empty() {
                        println!("Input cancelled.");
                    }
                    return Ok(Some(String::new()));
                }
                ReadResult::Eof => {
                    return Ok(if input.is_empty() { None } else { Some(input) });
                }
            }
        }
    }

    fn print_banner(&self) {
        println!("\x1b[1;36mzmanim\x1b[0m {}", env!("CARGO_PKG_VERSION"));
        println!(
            "{} at {}. Type :help for commands, Ctrl+D to exit.\n",
            self.date,
            self.location.name.as_deref().unwrap_or("custom location")
        );
        let _ = io::stdout().flush();
    }
}

fn print_error(error: &Error) {
    eprintln!("\x1b[31mError: {error}\x1b[0m");
}
