mod display;

use std::cell::Cell;
use std::collections::HashMap;
use std::error::Error;
use std::io::{stdout, BufWriter, Write};
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::{self, Color, Print},
    terminal,
    ExecutableCommand, QueueableCommand,
};
use nalgebra::Vector3;
use rand::thread_rng;

use liftoff::config::GameConfig;
use liftoff::session::{FrameInput, Session};
use liftoff::state_machine::GamePhase;

use display::Screen;

type AppResult<T> = Result<T, Box<dyn Error>>;

const FRAME: Duration = Duration::from_millis(33); // ≈30 FPS
const FRAME_SECONDS: f32 = 0.033;

/// How far ahead of the rocket a held direction key places the follow target.
const STEER_REACH: f32 = 3.0;

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames.  Covers terminals that don't emit key-release events.
const HOLD_WINDOW: u64 = 4;

/// Frames a phase banner stays on screen.
const BANNER_FRAMES: u32 = 45;

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn any_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64) -> bool {
    keys.iter().any(|k| is_held(key_frame, k, frame))
}

// ── Menu ──────────────────────────────────────────────────────────────────────

enum MenuResult {
    Start,
    Quit,
}

fn show_menu<W: Write>(out: &mut W, rx: &mpsc::Receiver<Event>) -> std::io::Result<MenuResult> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;

    let title = "▲  L I F T O F F  ▲";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(title.chars().count() as u16 / 2),
        cy.saturating_sub(4),
    ))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(title))?;

    let lines: &[(&str, Color)] = &[
        ("Dodge debris and birds, catch the stars.", Color::White),
        ("", Color::White),
        ("[ENTER] Launch    [Q] Quit", Color::Yellow),
        ("←↑↓→ / WASD : Steer   P : Pause", Color::DarkGrey),
    ];
    for (i, (text, color)) in lines.iter().enumerate() {
        let row = cy.saturating_sub(2) + i as u16;
        out.queue(cursor::MoveTo(
            cx.saturating_sub(text.chars().count() as u16 / 2),
            row,
        ))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*text))?;
    }

    out.queue(style::ResetColor)?;
    out.flush()?;

    // Block until the user makes a choice
    loop {
        if let Ok(Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. })) = rx.recv() {
            match code {
                KeyCode::Enter | KeyCode::Char(' ') => return Ok(MenuResult::Start),
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    return Ok(MenuResult::Quit);
                }
                _ => {}
            }
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Returns `true` → quit program,  `false` → back to menu.
///
/// Input model: a `key_frame` map records the frame number of the last
/// press/repeat event for every key.  Each frame the fresh steering keys are
/// combined into one follow target, so diagonals work with two keys held.
fn game_loop<W: Write>(
    out: &mut W,
    session: &mut Session,
    rx: &mpsc::Receiver<Event>,
) -> AppResult<bool> {
    let mut rng = thread_rng();

    // The host is a presentation-layer subscriber like any other.
    let announced: Rc<Cell<Option<GamePhase>>> = Rc::new(Cell::new(None));
    {
        let announced = Rc::clone(&announced);
        session.machine_mut().subscribe(move |phase| {
            if matches!(phase, GamePhase::Ignition | GamePhase::PlayerDied) {
                announced.set(Some(phase));
            }
        });
    }
    session.start(&mut rng)?;

    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut banner: Option<(String, u32)> = None;
    let mut frame: u64 = 0;

    loop {
        let frame_start = Instant::now();
        frame += 1;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(Event::Key(KeyEvent { code, kind, modifiers, .. })) = rx.try_recv() {
            match kind {
                KeyEventKind::Press => {
                    key_frame.insert(code, frame);
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                            return Ok(true);
                        }
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(true);
                        }
                        KeyCode::Char('p') | KeyCode::Char('P')
                            if session.phase() != GamePhase::PlayerDied =>
                        {
                            session.toggle_pause();
                        }
                        KeyCode::Char('r') | KeyCode::Char('R')
                            if session.player().restart_offered() =>
                        {
                            return Ok(false);
                        }
                        _ => {}
                    }
                }
                KeyEventKind::Repeat => {
                    key_frame.insert(code, frame);
                }
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        // ── Steering → follow target ──────────────────────────────────────────
        let mut steer = Vector3::zeros();
        if any_held(&key_frame, &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')], frame) {
            steer.x -= 1.0;
        }
        if any_held(&key_frame, &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')], frame) {
            steer.x += 1.0;
        }
        if any_held(&key_frame, &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')], frame) {
            steer.y += 1.0;
        }
        if any_held(&key_frame, &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')], frame) {
            steer.y -= 1.0;
        }
        let input = FrameInput::steering(session.player(), steer, STEER_REACH);

        session.tick(FRAME_SECONDS, &input, &mut rng)?;

        if let Some(phase) = announced.take() {
            let text = match phase {
                GamePhase::Ignition => "IGNITION!".to_string(),
                other => other.to_string(),
            };
            banner = Some((text, BANNER_FRAMES));
        }
        banner = banner.and_then(|(text, left)| (left > 0).then(|| (text, left - 1)));

        let (width, height) = terminal::size()?;
        display::render(
            out,
            session,
            Screen { width, height },
            banner.as_ref().map(|(text, _)| text.as_str()),
        )?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            std::thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn load_config() -> AppResult<Option<GameConfig>> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("--print-config") => {
            println!("{}", GameConfig::default().to_toml_string()?);
            Ok(None)
        }
        Some(path) => Ok(Some(GameConfig::load_from_file(path)?)),
        None => Ok(Some(GameConfig::default())),
    }
}

fn main() -> AppResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Configuration errors are fatal before the terminal is touched.
    let Some(config) = load_config()? else {
        return Ok(());
    };
    config.validate()?;

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break; // receiver dropped → program exiting
            }
        }
    });

    let result = run(&mut out, &rx, &config);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    if let Err(e) = &result {
        log::error!("Session aborted: {}", e);
    }
    result
}

fn run<W: Write>(out: &mut W, rx: &mpsc::Receiver<Event>, config: &GameConfig) -> AppResult<()> {
    loop {
        match show_menu(out, rx)? {
            MenuResult::Quit => break,
            MenuResult::Start => {
                let mut session = Session::new(config)?;
                let quit = game_loop(out, &mut session, rx)?;
                log::info!(
                    "Session over after {} frames with {} points",
                    session.frame(),
                    session.player_state().points
                );
                if quit {
                    break;
                }
                // Otherwise loop back to the menu
            }
        }
    }
    Ok(())
}
