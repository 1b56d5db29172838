use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph};
use tracing::{info, warn};

use keycheck::app::{App, Overrides, Tab};
use keycheck::config::Config;
use keycheck::event::{AppEvent, EventHandler};
use keycheck::keyboard::layout::FormFactor;
use keycheck::logging;
use keycheck::prompts::{Corpus, LengthTier};
use keycheck::session::typing::Stage;
use keycheck::store::prefs::{JsonPrefStore, MemoryPrefStore, PreferenceStore};
use keycheck::ui::components::checker_report::CheckerReport;
use keycheck::ui::components::dashboard::Dashboard;
use keycheck::ui::components::event_log::EventLog;
use keycheck::ui::components::keyboard_view::KeyboardView;
use keycheck::ui::components::tab_bar::TabBar;
use keycheck::ui::components::typing_area::TypingArea;
use keycheck::ui::layout::{AppLayout, CheckerLayout, centered_rect, pack_hint_lines};

#[derive(Parser)]
#[command(name = "keycheck", version, about = "Terminal keyboard tester and typing speed test")]
struct Cli {
    #[arg(short, long, help = "Theme name (dark, light)")]
    theme: Option<String>,

    #[arg(short, long, value_parser = parse_layout, help = "Keyboard layout (60%, 65%, 75%, tkl, 100%)")]
    layout: Option<FormFactor>,

    #[arg(long, value_parser = parse_tab, help = "Tab to open (checker, typing)")]
    tab: Option<Tab>,

    #[arg(short, long, help = "Typing prompt pack")]
    pack: Option<String>,

    #[arg(long, value_parser = parse_length, help = "Prompt length (short, medium, long, very)")]
    length: Option<LengthTier>,

    #[arg(long, help = "Read configuration from this file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Write a default config file and exit")]
    init_config: bool,
}

fn parse_layout(value: &str) -> Result<FormFactor, String> {
    FormFactor::parse(value).ok_or_else(|| format!("unknown layout `{value}`"))
}

fn parse_tab(value: &str) -> Result<Tab, String> {
    Tab::parse(value).ok_or_else(|| format!("unknown tab `{value}`"))
}

fn parse_length(value: &str) -> Result<LengthTier, String> {
    LengthTier::parse(value).ok_or_else(|| format!("unknown length `{value}`"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.init_config {
        let config = Config::default();
        let path = match &cli.config {
            Some(path) => {
                config.save_to(path)?;
                path.clone()
            }
            None => config.save()?,
        };
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let mut config = loaded.as_ref().cloned().unwrap_or_default();
    logging::init_global(&PathBuf::from(&config.log_file));
    if let Err(e) = &loaded {
        warn!("config unreadable, using defaults: {e:#}");
    }
    for note in config.validate() {
        warn!("config: {note}");
    }

    let prefs: Box<dyn PreferenceStore> = match JsonPrefStore::new() {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("{e}; preferences will not be saved");
            Box::new(MemoryPrefStore::default())
        }
    };

    let overrides = Overrides {
        theme: cli.theme,
        layout: cli.layout,
        tab: cli.tab,
        pack: cli.pack,
        length: cli.length,
    };
    let mut app = App::new(config, prefs, Corpus::load(), overrides);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Release events and bare modifier presses need the enhanced protocol.
    app.keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true))
        && execute!(
            io::stdout(),
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                    | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
            )
        )
        .is_ok();
    info!(enhanced = app.keyboard_enhanced, "terminal ready");

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(50));

    let result = run_app(&mut terminal, &mut app, &events);

    if app.keyboard_enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key, at) => app.handle_key(key, at),
            AppEvent::Tick => app.on_tick(Instant::now()),
            AppEvent::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    frame.render_widget(Block::default().style(Style::default().bg(colors.bg())), area);

    let hints: &[&str] = match app.tab {
        Tab::Checker => &[
            "[^T] Typing",
            "[^F] Finish",
            "[^R] Restart",
            "[^L] Layout",
            "[^O] OS",
            "[^D] Theme",
            "[^Q] Quit",
        ],
        Tab::Typing => &[
            "[^T] Checker",
            "[Esc] Restart",
            "[^L] Length",
            "[^P] Pack",
            "[^D] Theme",
            "[^Q] Quit",
        ],
    };
    let footer_lines = pack_hint_lines(hints, area.width as usize);
    let app_layout = AppLayout::new(area, footer_lines.len() as u16);

    let status = match app.tab {
        Tab::Checker => format!(
            "{} | {}",
            app.checker.form_factor().display_name(),
            app.checker.os
        ),
        Tab::Typing => format!(
            "{} | {}",
            app.typing.pack_title(),
            app.typing.session.tier
        ),
    };
    frame.render_widget(TabBar::new(app.tab, &status, &app.theme), app_layout.header);

    match app.tab {
        Tab::Checker => render_checker(frame, app, app_layout.main),
        Tab::Typing => render_typing(frame, app, app_layout.main),
    }

    let footer: Vec<Line> = footer_lines
        .into_iter()
        .map(|line| Line::styled(line, Style::default().fg(colors.text_pending())))
        .collect();
    frame.render_widget(Paragraph::new(footer), app_layout.footer);
}

fn render_checker(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let layout = CheckerLayout::new(area);
    let states = app.checker.key_states();
    let title = format!("{} layout", app.checker.form_factor().display_name());
    let board = KeyboardView::new(
        app.checker.session.layout(),
        &states,
        app.checker.os,
        title,
        &app.theme,
    );
    frame.render_widget(board, layout.board);
    frame.render_widget(CheckerReport::new(&app.checker, &app.theme), layout.report);
    frame.render_widget(EventLog::new(&app.checker.session.log, &app.theme), layout.log);
}

fn render_typing(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    frame.render_widget(TypingArea::new(&app.typing, &app.theme), area);

    if app.typing.stage() == Stage::Done {
        if let Some(result) = &app.typing.result {
            let popup = centered_rect(50, 50, area);
            frame.render_widget(Dashboard::new(result, &app.theme), popup);
        }
    }
}
