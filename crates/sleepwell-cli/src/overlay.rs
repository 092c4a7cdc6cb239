//! Draws the colored overlay.
//!
//! In fullscreen the whole alternate screen is painted with the scaled
//! color and the text is centered; otherwise a single status line is
//! rewritten in place.

use std::io::{self, Write};

use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{cursor, queue};
use sleepwell_core::Rgb;

/// What the current screen wants shown.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub color: Rgb,
    /// In `[0, 1]`.
    pub brightness: f64,
    pub headline: String,
    pub detail: String,
    pub hint: String,
}

impl View {
    pub fn background(&self) -> Rgb {
        self.color.scaled(self.brightness)
    }
}

fn term_color(c: Rgb) -> Color {
    Color::Rgb { r: c.r, g: c.g, b: c.b }
}

pub fn draw(out: &mut impl Write, view: &View, fullscreen: bool) -> io::Result<()> {
    if fullscreen {
        draw_fullscreen(out, view)
    } else {
        draw_line(out, view)
    }
}

fn draw_fullscreen(out: &mut impl Write, view: &View) -> io::Result<()> {
    let (cols, rows) = terminal::size()?;
    let bg = view.background();
    let fg = bg.contrast_text();

    queue!(out, SetBackgroundColor(term_color(bg)), Clear(ClearType::All))?;
    queue!(out, SetForegroundColor(term_color(fg)))?;

    let middle = rows / 2;
    let lines = [
        (middle.saturating_sub(1), view.headline.as_str()),
        (middle.saturating_add(1), view.detail.as_str()),
        (rows.saturating_sub(2), view.hint.as_str()),
    ];
    for (row, text) in lines {
        if text.is_empty() {
            continue;
        }
        let width = text.chars().count() as u16;
        let col = cols.saturating_sub(width) / 2;
        queue!(out, cursor::MoveTo(col, row), Print(text))?;
    }
    queue!(out, ResetColor)?;
    out.flush()
}

fn draw_line(out: &mut impl Write, view: &View) -> io::Result<()> {
    queue!(
        out,
        Print("\r"),
        Clear(ClearType::CurrentLine),
        SetBackgroundColor(term_color(view.background())),
        Print("    "),
        ResetColor,
        Print(format!(" {}  {}", view.headline, view.detail)),
    )?;
    out.flush()
}

/// Leave the status line on its own row.
pub fn finish_line(out: &mut impl Write) -> io::Result<()> {
    queue!(out, Print("\r\n"))?;
    out.flush()
}
