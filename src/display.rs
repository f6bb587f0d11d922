/// Rendering layer.  All terminal I/O lives here.
///
/// Each function receives a mutable writer and an immutable view of the
/// session.  No game logic is performed; this module only translates world
/// positions into terminal cells.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use nalgebra::Vector3;

use liftoff::entities::{EntityRole, SpawnedEntity};
use liftoff::session::Session;
use liftoff::state_machine::GamePhase;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_POINTS: Color = Color::Yellow;
const C_HUD_HEALTH: Color = Color::Red;
const C_HUD_PHASE: Color = Color::Cyan;
const C_PLAYER: Color = Color::White;
const C_SCENERY: Color = Color::DarkGreen;
const C_HAZARD: Color = Color::Red;
const C_COLLECTIBLE: Color = Color::Yellow;
const C_LAUNCH_PAD: Color = Color::Grey;
const C_COUNTDOWN: Color = Color::Yellow;
const C_HINT: Color = Color::DarkGrey;

/// World-space half extents shown on screen.
const VIEW_HALF_WIDTH: f32 = 24.0;
const VIEW_HALF_HEIGHT: f32 = 12.0;

/// Terminal dimensions for one frame.
#[derive(Clone, Copy, Debug)]
pub struct Screen {
    pub width: u16,
    pub height: u16,
}

impl Screen {
    /// Map a world position into the bordered play area (rows 2..h-2,
    /// columns 1..w-1).  Anything outside the view is culled.
    fn cell(&self, position: &Vector3<f32>) -> Option<(u16, u16)> {
        let inner_w = self.width.saturating_sub(2) as f32;
        let inner_h = self.height.saturating_sub(4) as f32;
        let u = (position.x + VIEW_HALF_WIDTH) / (2.0 * VIEW_HALF_WIDTH);
        let v = (VIEW_HALF_HEIGHT - position.y) / (2.0 * VIEW_HALF_HEIGHT);
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return None;
        }
        let col = 1 + (u * inner_w) as u16;
        let row = 2 + (v * inner_h) as u16;
        Some((col, row))
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.  `banner` is a short-lived message pushed by
/// the host's own phase subscriber.
pub fn render<W: Write>(
    out: &mut W,
    session: &Session,
    screen: Screen,
    banner: Option<&str>,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, screen)?;
    draw_hud(out, session, screen)?;

    for entity in session.world().values() {
        draw_entity(out, entity, screen)?;
    }
    draw_launch_pad(out, session, screen)?;
    draw_player(out, session, screen)?;
    draw_controls_hint(out, screen)?;

    if let Some(seconds) = session.machine().countdown_display() {
        draw_centered(out, screen, 0, &format!("{seconds}"), C_COUNTDOWN)?;
    }
    if let Some(text) = banner {
        draw_centered(out, screen, -2, text, C_HUD_PHASE)?;
    }
    match session.phase() {
        GamePhase::Pause => draw_centered(out, screen, 0, "PAUSED - P to resume", Color::White)?,
        GamePhase::PlayerDied => draw_mission_lost(out, session, screen)?,
        _ => {}
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, screen.height.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, screen: Screen) -> std::io::Result<()> {
    let w = screen.width as usize;
    let h = screen.height;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(screen.width.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, session: &Session, screen: Screen) -> std::io::Result<()> {
    let player = session.player_state();

    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_POINTS))?;
    out.queue(Print(format!("Points:{:>5}", player.points)))?;

    let phase_str = format!("[ {} ]", session.phase());
    let px = (screen.width / 2).saturating_sub(phase_str.len() as u16 / 2);
    out.queue(cursor::MoveTo(px, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_PHASE))?;
    out.queue(Print(&phase_str))?;

    let hearts: String = "♥".repeat(player.health.max(0) as usize);
    let health_str = format!("Health:{}", hearts);
    let rx = screen
        .width
        .saturating_sub(health_str.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_HEALTH))?;
    out.queue(Print(&health_str))?;

    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn draw_entity<W: Write>(out: &mut W, entity: &SpawnedEntity, screen: Screen) -> std::io::Result<()> {
    let Some((col, row)) = screen.cell(&entity.position) else {
        return Ok(());
    };
    let color = match entity.role {
        EntityRole::Scenery => C_SCENERY,
        EntityRole::Hazard { .. } => C_HAZARD,
        EntityRole::Collectible { .. } => C_COLLECTIBLE,
    };
    // Spinning debris alternates between its glyph and a slash.
    let glyph = if entity.rotator.is_some() && (entity.rotation / 90.0) as i32 % 2 == 1 {
        '/'
    } else {
        entity.glyph
    };
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(glyph))?;
    Ok(())
}

fn draw_launch_pad<W: Write>(out: &mut W, session: &Session, screen: Screen) -> std::io::Result<()> {
    let pad = session.launch_pad();
    if !pad.is_present() {
        return Ok(());
    }
    let Some((col, row)) = screen.cell(&pad.body().position) else {
        return Ok(());
    };
    out.queue(cursor::MoveTo(col.saturating_sub(2).max(1), row))?;
    out.queue(style::SetForegroundColor(C_LAUNCH_PAD))?;
    out.queue(Print("═════"))?;
    Ok(())
}

fn draw_player<W: Write>(out: &mut W, session: &Session, screen: Screen) -> std::io::Result<()> {
    // Rocket sprite (2 rows):
    //   ▲      ← nose
    //  /█\     ← body, with exhaust below once the engine runs
    let player = session.player();
    if !player.is_alive() {
        return Ok(());
    }
    let Some((col, row)) = screen.cell(&player.position()) else {
        return Ok(());
    };
    out.queue(style::SetForegroundColor(C_PLAYER))?;
    out.queue(cursor::MoveTo(col, row.saturating_sub(1).max(2)))?;
    out.queue(Print("▲"))?;
    out.queue(cursor::MoveTo(col.saturating_sub(1).max(1), row))?;
    out.queue(Print("/█\\"))?;

    if player.engine_running() && row + 1 < screen.height.saturating_sub(2) {
        out.queue(cursor::MoveTo(col, row + 1))?;
        out.queue(style::SetForegroundColor(Color::DarkYellow))?;
        out.queue(Print(if session.frame() % 2 == 0 { "∴" } else { "∵" }))?;
    }
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, screen: Screen) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, screen.height.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("←↑↓→ / WASD : Steer   P : Pause   Q : Quit"))?;
    Ok(())
}

// ── Overlays ──────────────────────────────────────────────────────────────────

fn draw_centered<W: Write>(
    out: &mut W,
    screen: Screen,
    row_offset: i32,
    text: &str,
    color: Color,
) -> std::io::Result<()> {
    let row = (screen.height as i32 / 2 + row_offset).max(2) as u16;
    let col = (screen.width / 2).saturating_sub(text.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(text))?;
    Ok(())
}

fn draw_mission_lost<W: Write>(out: &mut W, session: &Session, screen: Screen) -> std::io::Result<()> {
    let lines: &[(&str, Color)] = &[
        ("╔════════════════════╗", Color::Red),
        ("║   MISSION  LOST    ║", Color::Red),
        ("╚════════════════════╝", Color::Red),
    ];
    for (i, (msg, color)) in lines.iter().enumerate() {
        draw_centered(out, screen, i as i32 - 2, msg, *color)?;
    }

    let points_line = format!("Points: {:>5}", session.player_state().points);
    draw_centered(out, screen, 1, &points_line, Color::Yellow)?;

    if session.player().restart_offered() {
        draw_centered(out, screen, 2, "R - Restart  Q - Quit", Color::White)?;
    }
    Ok(())
}
