mod analytics;
mod app;
mod catalog;
mod config;
mod engine;
mod event;
mod session;
mod store;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use app::{App, AppScreen};
use config::Config;
use engine::question::KindPolicy;
use engine::selector::SelectionMode;
use event::{AppEvent, EventHandler};
use session::Phase;
use store::json_store::{self, JsonStore};
use store::ProgressStore;
use ui::components::flashcard::Flashcard;
use ui::components::progress_bar::ProgressBar;
use ui::components::progress_table::ProgressTable;
use ui::components::script_menu::{ScriptEntry, ScriptMenu};
use ui::components::summary::SummaryCard;
use ui::layout::{AppLayout, centered_rect, pack_hint_lines};
use ui::theme::Theme;

#[derive(Parser)]
#[command(
    name = "rolecall",
    version,
    about = "Flashcards for Blood on the Clocktower character abilities"
)]
struct Cli {
    #[arg(short, long, help = "Start straight into this script")]
    script: Option<String>,

    #[arg(short, long, value_enum, help = "Question selection")]
    mode: Option<SelectionMode>,

    #[arg(short, long, value_enum, help = "Question kind")]
    kind: Option<KindPolicy>,

    #[arg(long, help = "Include travellers")]
    travellers: bool,

    #[arg(long, help = "Include fabled")]
    fabled: bool,

    #[arg(long, help = "Fixed RNG seed for reproducible quizzes")]
    seed: Option<u64>,

    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, value_name = "PATH", help = "Write progress to a file and exit")]
    export: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Replace progress from an export file and exit")]
    import: Option<PathBuf>,

    #[arg(long, help = "Erase all progress and exit")]
    reset_progress: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut config = Config::load().unwrap_or_else(|e| {
        log::warn!("config unreadable, using defaults: {e:#}");
        Config::default()
    });
    apply_overrides(&mut config, &cli);
    config.validate(&Theme::available_themes());

    let mut progress = match JsonStore::new() {
        Ok(store) => ProgressStore::open(Box::new(store)),
        Err(e) => {
            log::warn!("progress will not be saved: {e:#}");
            ProgressStore::in_memory()
        }
    };

    if run_headless(&cli, &mut progress)? {
        return Ok(());
    }

    let mut app = App::new(config, progress)
        .with_seed(cli.seed)
        .with_pending_script(cli.script.clone());
    app.persist_settings = true;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));
    event::spawn_catalog_load(events.sender());

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        log::error!("{err:#}");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

/// Logs go to a file because the terminal belongs to the UI.
fn init_logging() {
    let dir = json_store::data_dir();
    let file = fs::create_dir_all(&dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("rolecall.log"))
    });
    let Ok(file) = file else {
        return;
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(theme) = &cli.theme {
        config.theme = theme.clone();
    }
    if let Some(mode) = cli.mode {
        config.selection_mode = mode;
    }
    if let Some(kind) = cli.kind {
        config.question_kind = kind;
    }
    if cli.travellers {
        config.include_travellers = true;
    }
    if cli.fabled {
        config.include_fabled = true;
    }
}

/// Handles the flags that act on stored progress without opening the UI.
/// Returns true when one of them ran.
fn run_headless(cli: &Cli, progress: &mut ProgressStore) -> Result<bool> {
    if cli.reset_progress {
        progress.reset_all();
        println!("Progress erased.");
        return Ok(true);
    }
    if let Some(path) = &cli.export {
        json_store::write_export(path, &progress.export())?;
        println!(
            "Exported progress for {} characters to {}",
            progress.records().len(),
            path.display()
        );
        return Ok(true);
    }
    if let Some(path) = &cli.import {
        let data = json_store::read_export(path)?;
        progress.import(data)?;
        println!(
            "Imported progress for {} characters from {}",
            progress.records().len(),
            path.display()
        );
        return Ok(true);
    }
    Ok(false)
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key, events),
            AppEvent::CatalogLoaded(result) => app.on_catalog_loaded(result),
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent, events: &EventHandler) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Loading => {
            if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                app.should_quit = true;
            }
        }
        AppScreen::LoadFailed => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
            KeyCode::Char('r') => {
                app.screen = AppScreen::Loading;
                event::spawn_catalog_load(events.sender());
            }
            _ => {}
        },
        AppScreen::ScriptSelect => handle_script_select_key(app, key),
        AppScreen::Quiz => handle_quiz_key(app, key),
        AppScreen::Completed => handle_completed_key(app, key),
        AppScreen::Stats => handle_stats_key(app, key),
        AppScreen::Settings => handle_settings_key(app, key),
    }
}

fn handle_script_select_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.script_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.script_next(),
        KeyCode::Enter => app.start_selected_quiz(),
        KeyCode::Char('s') => app.go_to_stats(),
        KeyCode::Char('c') => app.go_to_settings(),
        _ => {}
    }
}

fn handle_quiz_key(app: &mut App, key: KeyEvent) {
    let Some(session) = app.session.as_ref() else {
        app.go_to_script_select();
        return;
    };

    if session.phase() == Phase::Empty {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
            app.go_to_script_select();
        }
        return;
    }

    if session.is_result_shown() {
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('n') | KeyCode::Right => {
                app.next_question()
            }
            KeyCode::Esc => app.go_to_script_select(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char(ch @ '1'..='9') => {
            let index = ch as usize - '1' as usize;
            app.answer(index);
        }
        KeyCode::Esc => app.go_to_script_select(),
        _ => {}
    }
}

fn handle_completed_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => app.restart_quiz(),
        KeyCode::Char('s') => app.go_to_stats(),
        KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => app.go_to_script_select(),
        _ => {}
    }
}

fn handle_stats_key(app: &mut App, key: KeyEvent) {
    // Confirmation dialog takes priority
    if app.stats_confirm_reset {
        match key.code {
            KeyCode::Char('y') => app.confirm_reset(true),
            KeyCode::Char('n') | KeyCode::Esc => app.confirm_reset(false),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_to_script_select(),
        KeyCode::Char('j') | KeyCode::Down => app.stats_scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.stats_scroll_up(),
        KeyCode::Char('x') | KeyCode::Delete => {
            if !app.progress.is_empty() {
                app.request_reset();
            }
        }
        _ => {}
    }
}

fn handle_settings_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.leave_settings(),
        KeyCode::Up | KeyCode::Char('k') => app.settings_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.settings_next(),
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => app.settings_cycle_forward(),
        KeyCode::Left | KeyCode::Char('h') => app.settings_cycle_backward(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Loading => render_message(frame, app, "Loading characters...", &["[q] Quit"]),
        AppScreen::LoadFailed => {
            let message = format!(
                "Could not load character data: {}",
                app.load_error.as_deref().unwrap_or("unknown error")
            );
            render_message(frame, app, &message, &["[r] Retry", "[q] Quit"]);
        }
        AppScreen::ScriptSelect => render_script_select(frame, app),
        AppScreen::Quiz => render_quiz(frame, app),
        AppScreen::Completed => render_completed(frame, app),
        AppScreen::Stats => render_stats(frame, app),
        AppScreen::Settings => render_settings(frame, app),
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: Rect, info: &str) {
    let colors = &app.theme.colors;
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " rolecall ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {info}"),
            Style::default().fg(colors.text_dim()).bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn footer_lines(hints: &[&str], width: u16) -> Vec<String> {
    pack_hint_lines(hints, width as usize)
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, area: Rect, lines: Vec<String>) {
    let colors = &app.theme.colors;
    let lines: Vec<Line> = lines
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.text_dim()))))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_message(frame: &mut ratatui::Frame, app: &App, message: &str, hints: &[&str]) {
    let area = frame.area();
    let hints = footer_lines(hints, area.width);
    let layout = AppLayout::new(area, hints.len() as u16);
    render_header(frame, app, layout.header, "");

    let centered = centered_rect(60, 30, layout.main);
    let paragraph = Paragraph::new(Line::from(Span::styled(
        message,
        Style::default().fg(app.theme.colors.fg()),
    )))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::bordered().border_style(Style::default().fg(app.theme.colors.border())));
    frame.render_widget(paragraph, centered);

    render_footer(frame, app, layout.footer, hints);
}

fn render_script_select(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let hints = footer_lines(
        &["[Enter] Start", "[j/k] Move", "[s] Stats", "[c] Settings", "[q] Quit"],
        area.width,
    );
    let layout = AppLayout::new(area, hints.len() as u16);

    let totals = app.progress.totals();
    let info = format!(
        "{} characters studied | {:.0}% accuracy",
        totals.characters,
        totals.accuracy() * 100.0
    );
    render_header(frame, app, layout.header, &info);

    let filter = app.config.category_filter();
    let entries: Vec<ScriptEntry> = app
        .scripts
        .iter()
        .map(|name| ScriptEntry {
            name,
            characters: app
                .catalog
                .as_ref()
                .map(|c| c.characters_for_script(name, filter).len())
                .unwrap_or(0),
        })
        .collect();
    let menu = ScriptMenu::new(entries, app.script_selected, app.theme);
    frame.render_widget(&menu, centered_rect(50, 80, layout.main));

    render_footer(frame, app, layout.footer, hints);
}

fn render_quiz(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let Some(session) = app.session.as_ref() else {
        return;
    };
    let script = app.active_script.as_deref().unwrap_or("");

    if session.phase() == Phase::Empty {
        let message = format!("Nothing to quiz in {script} with the current filters.");
        render_message(frame, app, &message, &["[Esc] Back"]);
        return;
    }

    let hint_set: &[&str] = if session.is_result_shown() {
        &["[Enter] Next", "[Esc] Scripts"]
    } else {
        &["[1-4] Answer", "[Esc] Scripts"]
    };
    let hints = footer_lines(hint_set, area.width);
    let layout = AppLayout::new(area, hints.len() as u16);

    let score = session.score();
    let info = format!(
        "{script} | {} | Score {}/{}",
        session.options().mode.label(),
        score.correct,
        score.total
    );
    render_header(frame, app, layout.header, &info);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(8)])
        .split(layout.main);

    if session.options().mode == SelectionMode::Exhaustive {
        let bar = ProgressBar::new(
            "Characters",
            session.answered_count(),
            session.pool_len(),
            app.theme,
        );
        frame.render_widget(bar, main[0]);
    }

    if let Some(question) = session.current() {
        let card = Flashcard::new(
            question,
            session.selected_answer(),
            app.current_record(),
            app.theme,
        );
        frame.render_widget(card, centered_rect(80, 100, main[1]));
    }

    render_footer(frame, app, layout.footer, hints);
}

fn render_completed(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let hints = footer_lines(&["[r] Again", "[s] Stats", "[Enter] Scripts"], area.width);
    let layout = AppLayout::new(area, hints.len() as u16);
    render_header(frame, app, layout.header, "");

    if let Some(session) = app.session.as_ref() {
        let summary = session.summary();
        let script = app.active_script.as_deref().unwrap_or("");
        let card = SummaryCard::new(&summary, script, app.theme);
        frame.render_widget(card, centered_rect(40, 50, layout.main));
    }

    render_footer(frame, app, layout.footer, hints);
}

fn render_stats(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let hints = footer_lines(&["[j/k] Scroll", "[x] Reset progress", "[Esc] Back"], area.width);
    let layout = AppLayout::new(area, hints.len() as u16);
    render_header(frame, app, layout.header, "Statistics");

    let table = ProgressTable::new(
        app.progress.by_weakness(),
        app.progress.totals(),
        app.stats_scroll,
        app.stats_confirm_reset,
        app.theme,
    );
    frame.render_widget(table, layout.main);

    render_footer(frame, app, layout.footer, hints);
}

fn render_settings(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let centered = centered_rect(60, 80, area);

    let block = Block::bordered()
        .title(" Settings ")
        .border_style(Style::default().fg(colors.accent()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(centered);
    block.render(centered, frame.buffer_mut());

    let fields = app.settings_rows();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(fields.len() as u16 * 2),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(inner);

    Paragraph::new(Line::from(Span::styled(
        "  Use arrows to navigate, Enter/Right to change, ESC to save & exit",
        Style::default().fg(colors.text_dim()),
    )))
    .render(layout[0], frame.buffer_mut());

    let field_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(fields.iter().map(|_| Constraint::Length(2)).collect::<Vec<_>>())
        .split(layout[1]);

    for (i, (label, value)) in fields.iter().enumerate() {
        let is_selected = i == app.settings_selected;
        let indicator = if is_selected { " > " } else { "   " };

        let label_style = Style::default()
            .fg(if is_selected { colors.accent() } else { colors.fg() })
            .add_modifier(if is_selected { Modifier::BOLD } else { Modifier::empty() });
        let value_style = Style::default().fg(if is_selected {
            colors.selected()
        } else {
            colors.text_dim()
        });

        Paragraph::new(Line::from(vec![
            Span::styled(format!("{indicator}{label:<20}"), label_style),
            Span::styled(format!("< {value} >"), value_style),
        ]))
        .render(field_layout[i], frame.buffer_mut());
    }

    Paragraph::new(Line::from(Span::styled(
        "  [ESC] Save & back  [Enter/arrows] Change value",
        Style::default().fg(colors.accent()),
    )))
    .render(layout[3], frame.buffer_mut());
}
