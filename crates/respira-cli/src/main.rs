//! Respira CLI — terminal breathing companion

use std::io;
use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::*;

use respira::audio::types::AssetPaths;
use respira::audio::{CueEngine, CuePlayer};
use respira::session::{
    BreathPattern, BreathSequencer, Phase, SequencerEvent, SequencerOptions, SessionSnapshot,
    StartOutcome,
};

use respira_app::auth::{self, AuthBridge, AuthOutcome};
use respira_app::config::assets::AUDIO_FILES;
use respira_app::config::personalization::DEFAULT_BASE_URL;
use respira_app::data::{AssetCache, FavoritesStore, SessionLog, SessionRecord, Settings};
use respira_app::network::HttpClient;
use respira_app::phrases::{self, MoodState};
use respira_app::profile::{ProfileService, UserProfile};

#[derive(Parser)]
#[command(name = "respira", about = "Terminal breathing companion", version)]
struct Cli {
    /// Breathing preset (box, 478, coherent, relax)
    pattern: Option<String>,

    /// Total session length in minutes; omit to breathe until 'q'
    #[arg(long)]
    minutes: Option<f32>,

    /// Personalization key id (as found on the keychain tag)
    #[arg(long)]
    key: Option<String>,

    /// Device secret for the auth bridge (requires --key)
    #[arg(long)]
    secret: Option<String>,

    /// Run without audio
    #[arg(long)]
    silent: bool,

    /// Skip the ambient background loop
    #[arg(long)]
    no_ambient: bool,

    /// List the built-in presets and exit
    #[arg(long)]
    list_patterns: bool,
}

struct App {
    pattern: BreathPattern,
    pattern_label: String,
    greeting: Option<String>,
    phrase: String,
    phrase_is_favorite: bool,
    auth_notice: Option<String>,
    snapshot: SessionSnapshot,
    last_elapsed_secs: f32,
    last_cycles: u32,
    volume: f32,
    audio_status: String,
    status: String,
    running: bool,
    finished_naturally: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list_patterns {
        for name in BreathPattern::preset_names() {
            let p = BreathPattern::preset(name).unwrap_or_default();
            println!("{:<10} {}", name, p);
        }
        return;
    }

    let mut settings = Settings::load().unwrap_or_else(|e| {
        log::warn!("could not load settings: {}", e);
        Settings::default()
    });
    let mut favorites = FavoritesStore::load().unwrap_or_else(|e| {
        log::warn!("could not load favorites: {}", e);
        FavoritesStore::new()
    });
    let mut history = SessionLog::load().unwrap_or_else(|e| {
        log::warn!("could not load history: {}", e);
        SessionLog::new()
    });

    // Pattern: CLI argument beats the remembered default
    let pattern_label = cli
        .pattern
        .clone()
        .unwrap_or_else(|| settings.default_pattern.clone());
    let pattern = match BreathPattern::preset(&pattern_label) {
        Some(p) => p,
        None => {
            eprintln!(
                "Unknown pattern '{}'. Available: {}",
                pattern_label,
                BreathPattern::preset_names().join(", ")
            );
            std::process::exit(1);
        }
    };

    // Personalization: auth bridge when a secret is present, plain
    // profile fetch otherwise. Every failure degrades to the generic
    // experience.
    let base_url = settings
        .personalization_base
        .clone()
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let mut auth_notice = None;
    let profile: Option<UserProfile> = match (&cli.key, &cli.secret) {
        (Some(key), Some(secret)) => {
            let bridge = match settings.auth_base.clone() {
                Some(base) => AuthBridge::with_base_url(base),
                None => AuthBridge::new(),
            };
            match bridge.and_then(|b| b.authenticate(key, secret)) {
                Ok(AuthOutcome::Granted(profile)) => Some(profile),
                Ok(AuthOutcome::Blocked { reason }) => {
                    auth_notice = Some(format!(
                        "{} — visita {}/ayuda para reactivar tu llave",
                        reason, base_url
                    ));
                    None
                }
                Err(e) => {
                    log::warn!("auth bridge unreachable: {}", e);
                    auth::cached_payload()
                }
            }
        }
        (Some(key), None) => ProfileService::with_base_url(&base_url)
            .ok()
            .and_then(|svc| svc.fetch_or_default(key)),
        _ => None,
    };

    // Phrase selection over the remembered mood state
    let mood_state = MoodState {
        mood: profile
            .as_ref()
            .and_then(|p| p.estado.clone())
            .or_else(|| settings.last_mood.clone()),
        category: profile
            .as_ref()
            .and_then(|p| p.categoria.as_deref().and_then(phrases::Category::parse))
            .or_else(|| {
                settings
                    .last_category
                    .as_deref()
                    .and_then(phrases::Category::parse)
            }),
        ..Default::default()
    };
    let selection = phrases::select_and_mark(&mood_state, &mut rand::rng());
    settings.last_mood = selection.updated.mood.clone();
    settings.last_category = Some(selection.category.as_str().to_string());

    let greeting = profile.as_ref().and_then(|p| {
        if p.nombre.is_empty() {
            None
        } else if p.mensaje.is_empty() {
            Some(format!("Hola, {}.", p.nombre))
        } else {
            Some(format!("Hola, {}. {}", p.nombre, p.mensaje))
        }
    });

    // Audio: cached assets, best-effort sync of missing ones, then the
    // cue engine. Any failure leaves the session silent.
    let (engine, audio_status) = if cli.silent {
        (None, "silent".to_string())
    } else {
        match open_cue_engine(&base_url) {
            Some(engine) => {
                engine.preload();
                engine.set_volume(settings.volume);
                (Some(Arc::new(engine)), "on".to_string())
            }
            None => (None, "unavailable".to_string()),
        }
    };

    let cues: Option<Arc<dyn CuePlayer>> = engine
        .as_ref()
        .map(|e| e.clone() as Arc<dyn CuePlayer>);

    let sequencer = BreathSequencer::spawn(
        cues,
        SequencerOptions {
            stop_cues_on_pause: settings.stop_cues_on_pause,
            ..Default::default()
        },
    );

    let total = cli
        .minutes
        .filter(|m| *m > 0.0)
        .map(|m| Duration::from_secs_f32(m * 60.0));
    if sequencer.start(pattern, total) != StartOutcome::Started {
        eprintln!("A session is already running");
        std::process::exit(1);
    }

    if settings.ambient && !cli.no_ambient {
        if let Some(ref engine) = engine {
            engine.start_ambient();
        }
    }

    let mut app = App {
        pattern,
        pattern_label: pattern_label.clone(),
        greeting,
        phrase: selection.phrase.clone(),
        phrase_is_favorite: favorites.contains(&selection.phrase),
        auth_notice,
        snapshot: SessionSnapshot::default(),
        last_elapsed_secs: 0.0,
        last_cycles: 0,
        volume: settings.volume,
        audio_status,
        status: "Respirando".to_string(),
        running: true,
        finished_naturally: false,
    };

    // Suppress stderr during the TUI — audio backends write diagnostic
    // messages to stderr which corrupt the ratatui display.
    let saved_stderr = unsafe { libc::dup(2) };
    if let Ok(devnull) = std::fs::File::open("/dev/null") {
        unsafe { libc::dup2(devnull.as_raw_fd(), 2) };
    }

    let tui_result = run_tui(&mut app, &sequencer, engine.as_deref(), &mut favorites);

    // Stop audio while still in the alternate screen (backends log on
    // drop). The engine itself shuts down when the sequencer releases
    // its handle.
    if let Some(engine) = engine {
        engine.stop_ambient();
        drop(engine);
    }
    sequencer.shutdown();

    // Restore stderr
    if saved_stderr >= 0 {
        unsafe {
            libc::dup2(saved_stderr, 2);
            libc::close(saved_stderr);
        }
    }

    if let Err(e) = tui_result {
        eprintln!("Terminal error: {}", e);
    }

    // Record the session and persist everything that changed
    let duration_secs = app.last_elapsed_secs.round() as u32;
    if duration_secs > 0 {
        history.record(SessionRecord::now(
            pattern_label.clone(),
            duration_secs,
            app.last_cycles,
            app.finished_naturally,
        ));
    }
    settings.volume = app.volume;
    if let Err(e) = history.save() {
        log::warn!("could not save history: {}", e);
    }
    if let Err(e) = favorites.save() {
        log::warn!("could not save favorites: {}", e);
    }
    if let Err(e) = settings.save() {
        log::warn!("could not save settings: {}", e);
    }

    // Best-effort session push to the auth plugin
    if let (Some(key), Some(secret)) = (&cli.key, &cli.secret) {
        if duration_secs > 0 {
            let bridge = match settings.auth_base.clone() {
                Some(base) => AuthBridge::with_base_url(base),
                None => AuthBridge::new(),
            };
            if let Ok(bridge) = bridge {
                bridge.push_update(
                    key,
                    secret,
                    serde_json::json!({
                        "pattern": pattern_label,
                        "duration_secs": duration_secs,
                        "cycles": app.last_cycles,
                        "completed": app.finished_naturally,
                    }),
                );
            }
        }
    }

    println!(
        "Sesión de {} — {}s, {} ciclos.",
        app.pattern, duration_secs, app.last_cycles
    );
}

/// Open the cue engine over the offline asset cache.
///
/// Missing assets are fetched once, best-effort; a cold cache with no
/// network simply means a silent session.
fn open_cue_engine(base_url: &str) -> Option<CueEngine> {
    let cache = match AssetCache::open() {
        Ok(c) => c,
        Err(e) => {
            log::warn!("asset cache unavailable: {}", e);
            return CueEngine::new(AssetPaths::default()).ok();
        }
    };

    if cache.cached_names().len() < AUDIO_FILES.len() {
        match HttpClient::new() {
            Ok(client) => {
                let fetched = cache.sync(&client, base_url);
                if fetched > 0 {
                    log::info!("fetched {} audio asset(s)", fetched);
                }
            }
            Err(e) => log::warn!("could not build HTTP client: {}", e),
        }
    }

    let paths = AssetPaths {
        breath: cache.get(AUDIO_FILES[0]),
        ambient: cache.get(AUDIO_FILES[1]),
    };
    match CueEngine::new(paths) {
        Ok(engine) => Some(engine),
        Err(e) => {
            log::warn!("audio unavailable: {}", e);
            None
        }
    }
}

fn run_tui(
    app: &mut App,
    sequencer: &BreathSequencer,
    engine: Option<&CueEngine>,
    favorites: &mut FavoritesStore,
) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(33); // ~30fps
    let mut last_tick = Instant::now();

    while app.running {
        terminal.draw(|f| draw_ui(f, app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            if sequencer.is_running() {
                                app.status = "Terminando...".to_string();
                                sequencer.stop();
                            } else {
                                app.running = false;
                            }
                        }
                        KeyCode::Char(' ') => {
                            if app.snapshot.paused {
                                sequencer.resume();
                            } else {
                                sequencer.pause();
                            }
                        }
                        KeyCode::Char('f') => {
                            app.phrase_is_favorite = favorites.toggle(&app.phrase);
                        }
                        KeyCode::Char('+') | KeyCode::Char('=') => {
                            app.volume = (app.volume + 0.05).min(2.0);
                            if let Some(engine) = engine {
                                engine.set_volume(app.volume);
                            }
                        }
                        KeyCode::Char('-') => {
                            app.volume = (app.volume - 0.05).max(0.0);
                            if let Some(engine) = engine {
                                engine.set_volume(app.volume);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();

            // Poll sequencer events
            while let Some(event) = sequencer.try_recv_event() {
                match event {
                    SequencerEvent::PhaseStarted { .. } => {}
                    SequencerEvent::Countdown { .. } => {}
                    SequencerEvent::Paused => {
                        app.status = "En pausa".to_string();
                    }
                    SequencerEvent::Resumed => {
                        app.status = "Respirando".to_string();
                    }
                    SequencerEvent::Finished { natural } => {
                        app.finished_naturally = natural;
                        app.status = if natural {
                            "Sesión completa".to_string()
                        } else {
                            "Sesión detenida".to_string()
                        };
                        app.running = false;
                    }
                }
            }

            // Drain cue engine events; failures only change the status line
            if let Some(engine) = engine {
                while let Some(event) = engine.try_recv_event() {
                    if let respira::audio::CueEvent::CueFailed(_) = event {
                        app.audio_status = "degraded".to_string();
                    }
                }
            }

            // Read the shared snapshot; remember the last live values for
            // the session record (the snapshot resets when the session ends)
            app.snapshot = sequencer.snapshot();
            if app.snapshot.running {
                app.last_elapsed_secs = app.snapshot.elapsed_secs;
                app.last_cycles = app.snapshot.cycles_completed;
            }
        }
    }

    terminal::disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

fn draw_ui(f: &mut Frame, app: &App) {
    let area = f.area();

    let outer = Block::default()
        .title(format!(" Respira v{} ", env!("CARGO_PKG_VERSION")))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::vertical([
        Constraint::Length(4), // greeting + phrase
        Constraint::Length(5), // breath gauge
        Constraint::Length(4), // session stats
        Constraint::Length(3), // help bar
    ])
    .split(inner);

    draw_phrase(f, app, chunks[0]);
    draw_breath(f, app, chunks[1]);
    draw_stats(f, app, chunks[2]);
    draw_help(f, app, chunks[3]);
}

fn draw_phrase(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();
    if let Some(ref greeting) = app.greeting {
        lines.push(Line::from(Span::styled(
            format!("  {}", greeting),
            Style::default().fg(Color::DarkGray),
        )));
    }
    let marker = if app.phrase_is_favorite { " ♥" } else { "" };
    lines.push(Line::from(vec![
        Span::styled(
            format!("  “{}”", app.phrase),
            Style::default().fg(Color::White).italic(),
        ),
        Span::styled(marker, Style::default().fg(Color::Red)),
    ]));
    if let Some(ref notice) = app.auth_notice {
        lines.push(Line::from(Span::styled(
            format!("  {}", notice),
            Style::default().fg(Color::Yellow),
        )));
    }
    f.render_widget(Paragraph::new(lines), area);
}

/// Breath gauge: fills on inhale, holds, empties on exhale
fn breath_ratio(snapshot: &SessionSnapshot) -> f64 {
    let progress = snapshot.phase_progress() as f64;
    match snapshot.phase {
        Phase::Inhale => progress,
        Phase::HoldIn => 1.0,
        Phase::Exhale => 1.0 - progress,
        Phase::HoldOut => 0.0,
    }
}

fn draw_breath(f: &mut Frame, app: &App, area: Rect) {
    let phase_color = match app.snapshot.phase {
        Phase::Inhale => Color::Cyan,
        Phase::HoldIn | Phase::HoldOut => Color::Yellow,
        Phase::Exhale => Color::Green,
    };

    let remaining = app.snapshot.phase_remaining_secs.ceil() as u32;
    let label = if app.snapshot.running {
        format!("{} · {}s", app.snapshot.phase, remaining)
    } else {
        app.status.clone()
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(" Respiración ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .gauge_style(Style::default().fg(phase_color))
        .ratio(breath_ratio(&app.snapshot).clamp(0.0, 1.0))
        .label(label);

    f.render_widget(gauge, area);
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Sesión ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray));

    let status_color = match app.status.as_str() {
        "Respirando" => Color::Green,
        "En pausa" => Color::Yellow,
        _ => Color::White,
    };

    let text = vec![
        Line::from(vec![
            Span::styled("  Estado: ", Style::default().fg(Color::DarkGray)),
            Span::styled(&app.status, Style::default().fg(status_color)),
            Span::raw("  "),
            Span::styled("Patrón: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{} ({})", app.pattern_label, app.pattern),
                Style::default().fg(Color::White),
            ),
            Span::raw("  "),
            Span::styled("Audio: ", Style::default().fg(Color::DarkGray)),
            Span::styled(&app.audio_status, Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("  Tiempo: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format_elapsed(app.last_elapsed_secs),
                Style::default().fg(Color::White),
            ),
            Span::raw("  "),
            Span::styled("Ciclos: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{}", app.last_cycles),
                Style::default().fg(Color::White),
            ),
        ]),
    ];

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_help(f: &mut Frame, app: &App, area: Rect) {
    let help = Line::from(vec![
        Span::styled("  'q' ", Style::default().fg(Color::Yellow)),
        Span::raw("terminar  |  "),
        Span::styled("espacio ", Style::default().fg(Color::Yellow)),
        Span::raw("pausa  |  "),
        Span::styled("'f' ", Style::default().fg(Color::Yellow)),
        Span::raw("favorita  |  "),
        Span::styled("'+'/'-' ", Style::default().fg(Color::Yellow)),
        Span::raw("volumen  |  "),
        Span::styled(
            format!("Vol: {}%", (app.volume * 100.0).round() as u32),
            Style::default().fg(Color::Cyan).bold(),
        ),
    ]);

    f.render_widget(Paragraph::new(help).alignment(Alignment::Left), area);
}

fn format_elapsed(secs: f32) -> String {
    let secs = secs.max(0.0) as u64;
    let m = secs / 60;
    let s = secs % 60;
    format!("{:02}:{:02}", m, s)
}
