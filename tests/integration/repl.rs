//! REPL integration tests
//!
//! Drive a full session through a scripted line editor.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use zmanim_foundation::Result;
use zmanim_runtime::{LineEditor, ReadResult, Repl, Reply};

use crate::{LAKEWOOD_FILE, date};

/// Replays scripted lines and records what the REPL hands back.
#[derive(Clone, Default)]
struct ScriptedEditor {
    lines: Rc<RefCell<VecDeque<ReadResult>>>,
    history: Rc<RefCell<Vec<String>>>,
    completions: Rc<RefCell<Vec<String>>>,
}

impl ScriptedEditor {
    fn with_lines(lines: &[&str]) -> Self {
        let editor = Self::default();
        editor
            .lines
            .borrow_mut()
            .extend(lines.iter().map(|l| ReadResult::Line((*l).to_string())));
        editor
    }
}

impl LineEditor for ScriptedEditor {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadResult> {
        Ok(self.lines.borrow_mut().pop_front().unwrap_or(ReadResult::Eof))
    }

    fn add_history(&mut self, line: &str) {
        self.history.borrow_mut().push(line.to_string());
    }

    fn add_completions(&mut self, words: Vec<String>) {
        self.completions.borrow_mut().extend(words);
    }
}

fn text(reply: Reply) -> String {
    match reply {
        Reply::Text(text) => text,
        Reply::Quit => panic!("unexpected quit"),
    }
}

#[test]
fn session_runs_until_quit() {
    let editor = ScriptedEditor::with_lines(&[
        ":date 2025-06-21",
        "",
        ":def alos solar(16.1,",
        "  before_sunrise)",
        "@alos + 10min",
        ":quit",
        ":date 2030-01-01",
    ]);
    let mut repl = Repl::with_editor(editor.clone()).without_banner();
    repl.run().unwrap();

    assert_eq!(repl.date(), date(2025, 6, 21));
    let history = editor.history.borrow();
    assert_eq!(history.len(), 4);
    assert_eq!(history[1], ":def alos solar(16.1,\n  before_sunrise)");
    assert_eq!(editor.completions.borrow().as_slice(), ["alos"]);
    // the line after :quit is never read
    assert_eq!(editor.lines.borrow().len(), 1);
}

#[test]
fn interrupt_discards_partial_input() {
    let editor = ScriptedEditor::default();
    editor.lines.borrow_mut().extend([
        ReadResult::Line("earlier_of(sunrise,".to_string()),
        ReadResult::Interrupted,
        ReadResult::Line(":date 2025-01-02".to_string()),
    ]);
    let mut repl = Repl::with_editor(editor.clone()).without_banner();
    repl.run().unwrap();
    assert_eq!(repl.date(), date(2025, 1, 2));
    assert_eq!(editor.history.borrow().as_slice(), [":date 2025-01-02"]);
}

#[test]
fn errors_do_not_end_the_session() {
    let editor = ScriptedEditor::with_lines(&[":bogus", "sunrise +", ":date 2025-02-03"]);
    let mut repl = Repl::with_editor(editor).without_banner();
    repl.run().unwrap();
    assert_eq!(repl.date(), date(2025, 2, 3));
}

#[test]
fn loading_a_publisher_file() {
    let editor = ScriptedEditor::default();
    let mut repl = Repl::with_editor(editor.clone())
        .without_banner()
        .with_date(date(2025, 12, 26));

    let loaded = text(repl.eval(&format!(":load {LAKEWOOD_FILE}")).unwrap());
    assert_eq!(loaded, "loaded 13 formulas for Lakewood, NJ");
    assert_eq!(repl.location().timezone.name(), "America/New_York");
    assert!(editor.completions.borrow().contains(&"candle_lighting".to_string()));

    let defs = text(repl.eval(":defs").unwrap());
    assert!(defs.contains("@havdalah"));

    // References resolve against the loaded set.
    let havdalah = text(repl.eval("@havdalah").unwrap());
    assert!(havdalah.starts_with("17:"), "{havdalah}");
    assert!(havdalah.contains("2025-12-26"));

    assert!(repl.eval(":load /nonexistent.toml").is_err());
}

#[test]
fn breakdown_and_events() {
    let mut repl = Repl::with_editor(ScriptedEditor::default())
        .without_banner()
        .with_date(date(2025, 3, 20));

    assert_eq!(text(repl.eval(":breakdown on").unwrap()), "breakdown on");
    let out = text(repl.eval("earlier_of(sunrise, sunset) + 1h").unwrap());
    assert!(out.lines().count() > 3, "{out}");
    assert!(out.contains("earlier_of("));

    assert_eq!(
        text(repl.eval(":events shabbos, chanukah").unwrap()),
        "chanukah, shabbos"
    );
    assert_eq!(text(repl.eval(":events none").unwrap()), "no active events");
}
