//! Line-based terminal front end over `PracticeController`.

use std::fmt::{self, Write as _};
use std::io::Write;

use drill_core::model::{Difficulty, Grade, PracticeMode, ProblemFilters, ProblemId};
use services::{
    Advance, Debouncer, FavoriteToggle, PracticeController, SessionError, SessionStart,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

const PROGRESS_BAR_WIDTH: usize = 20;
const SEARCH_KEY: &str = "search";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start(PracticeMode),
    Search(String),
    Pick(usize),
    Flip,
    Grade(Grade),
    Skip,
    Favorite,
    Note(String),
    Timer,
    Continue,
    Menu,
    Report,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    MissingArgument(&'static str),
    InvalidArgument { command: &'static str, raw: String },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => f.write_str("type a command, or `help`"),
            CommandError::Unknown(raw) => write!(f, "unknown command: {raw}"),
            CommandError::MissingArgument(command) => write!(f, "{command} needs an argument"),
            CommandError::InvalidArgument { command, raw } => {
                write!(f, "invalid argument for {command}: {raw}")
            }
        }
    }
}

impl std::error::Error for CommandError {}

/// Parse one input line.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(head, rest)| (head, rest.trim()));

    let command = match head.to_ascii_lowercase().as_str() {
        "" => return Err(CommandError::Empty),
        "random" => Command::Start(PracticeMode::Random),
        "mistakes" => Command::Start(PracticeMode::Mistakes),
        "favorites" | "favs" => Command::Start(PracticeMode::Custom(ProblemFilters::favorites())),
        "custom" => Command::Start(PracticeMode::Custom(parse_filters(rest)?)),
        "search" | "/" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument("search"));
            }
            Command::Search(rest.to_owned())
        }
        "pick" => {
            let n = rest.parse::<usize>().ok().filter(|&n| n > 0).ok_or_else(|| {
                CommandError::InvalidArgument {
                    command: "pick",
                    raw: rest.to_owned(),
                }
            })?;
            Command::Pick(n)
        }
        "flip" | "f" => Command::Flip,
        "skip" | "next" | "n" => Command::Skip,
        "fav" => Command::Favorite,
        "note" => Command::Note(rest.to_owned()),
        "timer" | "t" => Command::Timer,
        "continue" | "c" | "yes" | "y" => Command::Continue,
        "menu" | "no" => Command::Menu,
        "report" | "r" => Command::Report,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => match other.parse::<Grade>() {
            Ok(grade) => Command::Grade(grade),
            Err(_) => return Err(CommandError::Unknown(other.to_owned())),
        },
    };
    Ok(command)
}

/// `d=hard,medium f=50 h=3`; every part is optional.
fn parse_filters(raw: &str) -> Result<ProblemFilters, CommandError> {
    let mut filters = ProblemFilters::default();
    for part in raw.split_whitespace() {
        let invalid = || CommandError::InvalidArgument {
            command: "custom",
            raw: part.to_owned(),
        };
        let (key, value) = part.split_once('=').ok_or_else(invalid)?;
        match key {
            "d" | "difficulty" => {
                let difficulties = value
                    .split(',')
                    .map(str::parse::<Difficulty>)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| invalid())?;
                filters = filters.with_difficulties(difficulties);
            }
            "f" | "freq" => {
                let min = value
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(invalid)?;
                filters = filters.with_min_frequency(min);
            }
            "h" | "hardness" => {
                let max = value.parse::<u32>().map_err(|_| invalid())?;
                filters = filters.with_max_hardness(max);
            }
            _ => return Err(invalid()),
        }
    }
    Ok(filters)
}

pub const HELP: &str = "\
Modes:    random | mistakes | favorites | custom [d=easy,hard] [f=<min freq>] [h=<max hardness>]
Search:   search <term> | pick <n>
Card:     flip | easy | medium | hard | skip | fav | note <text> | timer
Session:  continue | menu | report
Other:    help | quit";

//
// ─── RENDERING ─────────────────────────────────────────────────────────────────
//

/// The current card, with progress bar and markers.
#[must_use]
pub fn render_card(ctl: &PracticeController) -> String {
    let Some(problem) = ctl.current_problem() else {
        return String::new();
    };
    let mut out = String::new();

    if let Some(progress) = ctl.progress() {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_precision_loss,
            clippy::cast_sign_loss
        )]
        let filled = (progress.fraction() * PROGRESS_BAR_WIDTH as f64).round() as usize;
        let _ = writeln!(
            out,
            "[{}{}] {}/{}  pass {}  {}",
            "#".repeat(filled),
            ".".repeat(PROGRESS_BAR_WIDTH.saturating_sub(filled)),
            progress.cursor + 1,
            progress.total,
            progress.pass,
            ctl.elapsed_display(),
        );
    }

    let star = if ctl.is_favorite_current() { " *" } else { "" };
    let _ = writeln!(
        out,
        "#{} {}{}  ({}, frequency {}, hardness {})",
        problem.id(),
        problem.name(),
        star,
        problem.difficulty(),
        problem.frequency(),
        problem.hardness_rating(),
    );
    if !problem.link().is_empty() {
        let _ = writeln!(out, "{}", problem.link());
    }

    if ctl.is_flipped() {
        let _ = writeln!(out, "Answer: {}", problem.answer());
        if !problem.complexity().is_empty() {
            let _ = writeln!(out, "Complexity: {}", problem.complexity());
        }
    } else {
        let _ = writeln!(out, "(flip to see the answer)");
    }

    if let Some(note) = ctl.note_for_current().filter(|note| !note.is_empty()) {
        let _ = writeln!(out, "Note: {note}");
    }
    out
}

#[must_use]
pub fn render_report(ctl: &PracticeController) -> String {
    let report = ctl.report();
    format!(
        "Total Problems:    {}\n\
         Problems Seen:     {}\n\
         Correct:           {}\n\
         Incorrect:         {}\n\
         Current Streak:    {}\n\
         Longest Streak:    {}\n\
         Favorite Problems: {}\n",
        report.total_problems,
        report.total_seen,
        report.problems_correct,
        report.problems_incorrect,
        report.current_streak,
        report.longest_streak,
        report.favorites,
    )
}

const PASS_COMPLETE_PROMPT: &str =
    "You've completed all questions! Would you like to continue with a new set? (continue/menu)";

fn describe_error(err: &SessionError) -> String {
    if err.is_empty_selection() {
        return "No problems match the selected criteria.".to_owned();
    }
    match err {
        SessionError::MissingCurrentProblem | SessionError::NotInSession => {
            "Start a session first.".to_owned()
        }
        other => other.to_string(),
    }
}

//
// ─── LOOP ──────────────────────────────────────────────────────────────────────
//

/// Terminal session: owns the last search results so `pick` can refer to them.
///
/// `search` lines are debounced. A term is only looked up once no newer
/// `search` arrives within the configured quiet period, so pasted or
/// scripted bursts print one result list.
pub struct Repl<W> {
    ctl: PracticeController,
    out: W,
    last_search: Vec<ProblemId>,
    debouncer: Debouncer<&'static str>,
    settled_tx: mpsc::UnboundedSender<String>,
    settled_rx: mpsc::UnboundedReceiver<String>,
}

impl<W: Write> Repl<W> {
    pub fn new(ctl: PracticeController, out: W) -> Self {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        Self {
            debouncer: Debouncer::new(ctl.settings().search_debounce),
            ctl,
            out,
            last_search: Vec::new(),
            settled_tx,
            settled_rx,
        }
    }

    #[must_use]
    pub fn controller(&self) -> &PracticeController {
        &self.ctl
    }

    /// Read commands until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if reading input or writing output fails.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> std::io::Result<()> {
        writeln!(self.out, "{HELP}")?;
        let mut lines = input.lines();
        loop {
            write!(self.out, "> ")?;
            self.out.flush()?;
            let line = tokio::select! {
                biased;
                Some(term) = self.settled_rx.recv() => {
                    self.search(&term)?;
                    continue;
                }
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                self.settle_search().await?;
                break;
            };
            match parse_command(&line) {
                Ok(Command::Quit) => {
                    self.debouncer.cancel(&SEARCH_KEY);
                    break;
                }
                Ok(command @ Command::Search(_)) => self.dispatch(command).await?,
                Ok(command) => {
                    self.settle_search().await?;
                    self.dispatch(command).await?;
                }
                Err(CommandError::Empty) => {}
                Err(err) => writeln!(self.out, "{err}")?,
            }
        }
        Ok(())
    }

    /// Apply one command and print its outcome.
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if writing output fails.
    pub async fn dispatch(&mut self, command: Command) -> std::io::Result<()> {
        match command {
            Command::Start(mode) => {
                let started = self.ctl.start_session(mode);
                self.show_started(started)?;
            }
            Command::Search(term) => {
                let settled = self.settled_tx.clone();
                self.debouncer.schedule(SEARCH_KEY, async move {
                    let _ = settled.send(term);
                });
            }
            Command::Pick(n) => {
                let picked = n.checked_sub(1).and_then(|i| self.last_search.get(i)).cloned();
                match picked {
                    Some(id) => {
                        let started = self.ctl.pick(id);
                        self.show_started(started)?;
                    }
                    None => writeln!(self.out, "No search result #{n}.")?,
                }
            }
            Command::Flip => {
                if self.ctl.current_problem().is_some() {
                    self.ctl.flip();
                    self.show_card()?;
                } else {
                    writeln!(self.out, "Start a session first.")?;
                }
            }
            Command::Grade(grade) => match self.ctl.grade(grade).await {
                Ok(report) => {
                    writeln!(self.out, "{}", report.feedback())?;
                    if let Some(err) = &report.persist_failure {
                        writeln!(self.out, "Warning: progress could not be saved ({err}).")?;
                    }
                    self.show_advance(&report.advance)?;
                }
                Err(err) => writeln!(self.out, "{}", describe_error(&err))?,
            },
            Command::Skip => match self.ctl.advance() {
                Ok(advance) => self.show_advance(&advance)?,
                Err(err) => writeln!(self.out, "{}", describe_error(&err))?,
            },
            Command::Favorite => match self.ctl.toggle_favorite().await {
                Ok(applied) => {
                    let text = match applied.value {
                        FavoriteToggle::Added => "Added to favorites.",
                        FavoriteToggle::Removed => "Removed from favorites.",
                        FavoriteToggle::Suppressed => "Still saving the last change, try again.",
                    };
                    writeln!(self.out, "{text}")?;
                    if let Some(err) = &applied.persist_failure {
                        writeln!(self.out, "Warning: progress could not be saved ({err}).")?;
                    }
                }
                Err(err) => writeln!(self.out, "{}", describe_error(&err))?,
            },
            Command::Note(text) => match self.ctl.save_note(text).await {
                Ok(applied) => match &applied.persist_failure {
                    None => writeln!(self.out, "Note saved.")?,
                    Some(err) => {
                        writeln!(self.out, "Warning: note kept but not saved ({err}).")?;
                    }
                },
                Err(err) => writeln!(self.out, "{}", describe_error(&err))?,
            },
            Command::Timer => {
                if self.ctl.current_problem().is_some() {
                    let running = self.ctl.toggle_stopwatch();
                    let state = if running { "running" } else { "paused" };
                    writeln!(self.out, "Timer {state} at {}.", self.ctl.elapsed_display())?;
                } else {
                    writeln!(self.out, "Start a session first.")?;
                }
            }
            Command::Continue => {
                let started = self.ctl.continue_pass();
                self.show_started(started)?;
            }
            Command::Menu => {
                self.ctl.return_to_menu();
                writeln!(self.out, "Back at the menu.")?;
            }
            Command::Report => {
                let report = render_report(&self.ctl);
                write!(self.out, "{report}")?;
            }
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => {}
        }
        Ok(())
    }

    /// Print the pending search, if any, once it settles.
    async fn settle_search(&mut self) -> std::io::Result<()> {
        if self.debouncer.is_pending(&SEARCH_KEY) {
            if let Some(term) = self.settled_rx.recv().await {
                self.search(&term)?;
            }
        }
        while let Ok(term) = self.settled_rx.try_recv() {
            self.search(&term)?;
        }
        Ok(())
    }

    fn search(&mut self, term: &str) -> std::io::Result<()> {
        let hits: Vec<(ProblemId, String)> = self
            .ctl
            .search(term)
            .into_iter()
            .map(|p| (p.id().clone(), p.name().to_owned()))
            .collect();
        if hits.is_empty() {
            writeln!(self.out, "No matches.")?;
        }
        for (n, (id, name)) in hits.iter().enumerate() {
            writeln!(self.out, "  {}. #{id} {name}", n + 1)?;
        }
        self.last_search = hits.into_iter().map(|(id, _)| id).collect();
        Ok(())
    }

    fn show_started(
        &mut self,
        started: Result<SessionStart, SessionError>,
    ) -> std::io::Result<()> {
        match started {
            Ok(start) => {
                writeln!(
                    self.out,
                    "Practicing {} problem(s) ({}).",
                    start.total,
                    start.mode.label()
                )?;
                self.show_card()
            }
            Err(SessionError::PassNotComplete) => {
                writeln!(self.out, "Finish the current pass first.")
            }
            Err(err) => writeln!(self.out, "{}", describe_error(&err)),
        }
    }

    fn show_advance(&mut self, advance: &Advance) -> std::io::Result<()> {
        match advance {
            Advance::Next(_) => self.show_card(),
            Advance::PassComplete { .. } => writeln!(self.out, "{PASS_COMPLETE_PROMPT}"),
        }
    }

    fn show_card(&mut self) -> std::io::Result<()> {
        let card = render_card(&self.ctl);
        write!(self.out, "{card}")
    }
}
