use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use keysprint::{
    arcade::{ArcadeSnapshot, ArcadeState, SubmitOutcome},
    clock::Clock,
    rating::{rate_arcade, rate_typing},
    theme::{parse_hex, Palette},
    typing::{CharClass, TypingSnapshot, TypingState},
};

use crate::{App, Mode};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

/// Palette resolved to terminal colors
#[derive(Clone, Copy, Debug)]
struct Colors {
    primary: Color,
    secondary: Color,
    accent: Color,
    success: Color,
    error: Color,
}

impl From<&Palette> for Colors {
    fn from(palette: &Palette) -> Self {
        Self {
            primary: hex_color(&palette.primary),
            secondary: hex_color(&palette.secondary),
            accent: hex_color(&palette.accent),
            success: hex_color(&palette.success),
            error: hex_color(&palette.error),
        }
    }
}

fn hex_color(hex: &str) -> Color {
    parse_hex(hex)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::Reset)
}

fn legend(items: &[&str]) -> String {
    items.iter().join(" / ")
}

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = Colors::from(&self.palette);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        render_header(self.mode, colors, chunks[0], buf);

        match self.mode {
            Mode::Typing => render_typing(&self.typing.snapshot(), colors, chunks[1], buf),
            Mode::Arcade => render_arcade(
                &self.arcade.snapshot(),
                &self.arcade_input,
                self.last_submit.as_ref(),
                colors,
                chunks[1],
                buf,
            ),
        }
    }
}

fn render_header(mode: Mode, colors: Colors, area: Rect, buf: &mut Buffer) {
    let active = Style::default()
        .fg(colors.primary)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let inactive = Style::default().fg(colors.secondary);

    let (typing, arcade) = match mode {
        Mode::Typing => (active, inactive),
        Mode::Arcade => (inactive, active),
    };

    Paragraph::new(Line::from(vec![
        Span::styled("keysprint  ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled("typing", typing),
        Span::raw("  "),
        Span::styled("arcade", arcade),
    ]))
    .alignment(Alignment::Center)
    .render(area, buf);
}

fn render_typing(snapshot: &TypingSnapshot, colors: Colors, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = bold.add_modifier(Modifier::DIM);
    let italic = Style::default().add_modifier(Modifier::ITALIC);

    match snapshot.state {
        TypingState::Idle => {
            let chunks = centered_rows(area, 3);
            Paragraph::new(Span::styled(
                format!(
                    "{} text · {} seconds",
                    snapshot.difficulty, snapshot.duration_secs
                ),
                bold.fg(colors.accent),
            ))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

            Paragraph::new(Span::styled(
                legend(&[
                    "(enter) start",
                    "(←/→) difficulty",
                    "(↑/↓) duration",
                    "(tab) arcade",
                    "(esc) quit",
                ]),
                italic,
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[3], buf);
        }
        TypingState::Running => {
            let max_width = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
            let text_width = snapshot.reference.width() as u16;
            let text_lines = text_width.div_ceil(max_width).max(1);

            let chunks = centered_rows(area, text_lines);

            Paragraph::new(Span::styled(
                format!(
                    "{}s   {} wpm   {}% acc   {} errors   {}%",
                    snapshot.remaining_seconds,
                    snapshot.metrics.wpm,
                    snapshot.metrics.accuracy,
                    snapshot.error_count,
                    snapshot.progress_percent
                ),
                dim,
            ))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

            let spans = snapshot
                .reference
                .chars()
                .zip(snapshot.classes.iter())
                .map(|(expected, class)| match class {
                    CharClass::Correct => Span::styled(expected.to_string(), bold.fg(colors.success)),
                    CharClass::Incorrect => Span::styled(
                        match expected {
                            ' ' => "·".to_owned(),
                            c => c.to_string(),
                        },
                        bold.fg(colors.error),
                    ),
                    CharClass::Current => Span::styled(
                        expected.to_string(),
                        bold.fg(colors.accent).add_modifier(Modifier::UNDERLINED),
                    ),
                    CharClass::Pending => Span::styled(expected.to_string(), dim),
                })
                .collect::<Vec<Span>>();

            Paragraph::new(Line::from(spans))
                .alignment(if text_lines == 1 {
                    Alignment::Center
                } else {
                    Alignment::Left
                })
                .wrap(Wrap { trim: true })
                .render(with_side_margin(chunks[3]), buf);
        }
        TypingState::Finished => {
            let chunks = centered_rows(area, 3);
            let rating = rate_typing(snapshot.metrics.wpm, snapshot.metrics.accuracy);

            Paragraph::new(Span::styled(rating.to_string(), bold.fg(colors.accent)))
                .alignment(Alignment::Center)
                .render(chunks[1], buf);

            Paragraph::new(vec![
                Line::from(Span::styled(
                    format!(
                        "{} wpm   {}% acc   {} errors",
                        snapshot.metrics.wpm, snapshot.metrics.accuracy, snapshot.error_count
                    ),
                    bold,
                )),
                Line::default(),
                Line::from(Span::styled(
                    legend(&["(enter) again", "(tab) arcade", "(esc) quit"]),
                    italic,
                )),
            ])
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
        }
    }
}

fn with_side_margin(area: Rect) -> Rect {
    Layout::default()
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([Constraint::Min(0)])
        .split(area)[0]
}

/// Splits `area` into pad / one status row / gap / `body` rows / pad.
fn centered_rows(area: Rect, body: u16) -> std::rc::Rc<[Rect]> {
    let pad = area.height.saturating_sub(body + 2) / 2;
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(pad),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(body),
            Constraint::Min(0),
        ])
        .split(area)
}

fn render_arcade(
    snapshot: &ArcadeSnapshot,
    input: &str,
    last_submit: Option<&SubmitOutcome>,
    colors: Colors,
    area: Rect,
    buf: &mut Buffer,
) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let italic = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(1), // score / lives / level
            Constraint::Min(3),    // playfield
            Constraint::Length(1), // input
            Constraint::Length(1), // legend
        ])
        .split(area);

    let hearts = (0..snapshot.lives).map(|_| "♥").join("");
    Paragraph::new(Line::from(vec![
        Span::styled(format!("score {}", snapshot.score), bold),
        Span::raw("   "),
        Span::styled(hearts, bold.fg(colors.error)),
        Span::raw("   "),
        Span::styled(format!("level {}", snapshot.level), bold),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.secondary));
    let field = block.inner(chunks[1]);
    block.render(chunks[1], buf);

    match snapshot.state {
        ArcadeState::Running | ArcadeState::Paused => {
            render_words(snapshot, colors, field, buf);
            if snapshot.state == ArcadeState::Paused {
                overlay(
                    vec![Line::from(Span::styled("PAUSED", bold.fg(colors.accent)))],
                    field,
                    buf,
                );
            }
        }
        ArcadeState::Idle => overlay(
            vec![Line::from(Span::styled(
                "type the falling words before they land",
                bold.fg(colors.accent),
            ))],
            field,
            buf,
        ),
        ArcadeState::Over => overlay(
            vec![
                Line::from(Span::styled("Game over", bold.fg(colors.error))),
                Line::from(Span::styled(
                    rate_arcade(snapshot.score).to_string(),
                    bold.fg(colors.accent),
                )),
                Line::from(format!(
                    "score {}   level {}",
                    snapshot.score, snapshot.level
                )),
            ],
            field,
            buf,
        ),
    }

    let mut prompt = vec![
        Span::styled("> ", Style::default().fg(colors.primary)),
        Span::styled(input.to_string(), bold),
    ];
    match last_submit {
        Some(SubmitOutcome::Matched { points, .. }) => prompt.push(Span::styled(
            format!("   +{points}"),
            Style::default().fg(colors.success),
        )),
        Some(SubmitOutcome::NoMatch) => {
            prompt.push(Span::styled("   miss", Style::default().fg(colors.error)))
        }
        Some(SubmitOutcome::Ignored) | None => {}
    }
    Paragraph::new(Line::from(prompt)).render(chunks[2], buf);

    let keys = match snapshot.state {
        ArcadeState::Idle | ArcadeState::Over => {
            legend(&["(enter) play", "(tab) typing", "(esc) quit"])
        }
        ArcadeState::Running | ArcadeState::Paused => legend(&[
            "(enter) submit",
            "(ctrl-p) pause",
            "(ctrl-r) reset",
            "(tab) typing",
        ]),
    };
    Paragraph::new(Span::styled(keys, italic))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
}

/// Draws each word at a height matching how much of its lifetime is used.
fn render_words(snapshot: &ArcadeSnapshot, colors: Colors, field: Rect, buf: &mut Buffer) {
    if field.width == 0 || field.height == 0 {
        return;
    }
    let bold = Style::default().add_modifier(Modifier::BOLD);

    for word in &snapshot.words {
        let width = word.text.width() as u16;
        // spread columns by id so consecutive words do not stack
        let columns = field.width.saturating_sub(width).max(1);
        let x = field.x + (word.id.wrapping_mul(37) % columns as u64) as u16;
        let drop = word.progress(snapshot.now) * (field.height - 1) as f64;
        let y = field.y + drop.round() as u16;

        let style = if word.matched {
            bold.fg(colors.success).add_modifier(Modifier::CROSSED_OUT)
        } else {
            bold.fg(colors.primary)
        };
        buf.set_stringn(x, y, &word.text, (field.right() - x) as usize, style);
    }
}

fn overlay(lines: Vec<Line>, field: Rect, buf: &mut Buffer) {
    let height = (lines.len() as u16).min(field.height);
    let top = field.y + field.height.saturating_sub(height) / 2;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(Rect::new(field.x, top, field.width, height), buf);
}
