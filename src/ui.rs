use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use time_humanize::{Accuracy, HumanTime, Tense};
use unicode_width::UnicodeWidthStr;

use crate::engine::{SessionState, Trainer};
use crate::store::{Record, TIMESTAMP_FORMAT};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &Trainer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state() {
            SessionState::Menu => render_menu(self, area, buf),
            SessionState::AwaitingStart => render_awaiting(self, area, buf),
            SessionState::Active => render_active(self, area, buf),
            SessionState::Finished => render_finished(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn centered_rows(area: Rect, rows: u16) -> Vec<Rect> {
    let pad = area.height.saturating_sub(rows) / 2;
    let mut constraints = vec![Constraint::Length(pad)];
    constraints.extend(std::iter::repeat(Constraint::Length(1)).take(rows as usize));
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(constraints)
        .split(area);

    chunks[1..=rows as usize].to_vec()
}

fn best_line(best: &Record) -> Line<'static> {
    let age = humanized_age(&best.timestamp)
        .map(|age| format!("   {age}"))
        .unwrap_or_default();

    Line::from(vec![
        Span::styled("best: ", italic()),
        Span::styled(
            format!(
                "{} cpm / {:.2}% acc{}",
                best.typing_speed, best.accuracy, age
            ),
            bold().fg(Color::Cyan),
        ),
    ])
}

// "2 days ago" from the record's timestamp; None when it does not parse
// or sits in the future (clock skew).
fn humanized_age(timestamp: &str) -> Option<String> {
    let then = chrono::NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;
    let seconds = (chrono::Local::now().naive_local() - then).num_seconds();
    if seconds < 0 {
        return None;
    }
    let age = HumanTime::from(std::time::Duration::from_secs(seconds as u64));
    Some(age.to_text_en(Accuracy::Rough, Tense::Past))
}

fn render_menu(trainer: &Trainer, area: Rect, buf: &mut Buffer) {
    let rows = centered_rows(area, 5);

    Paragraph::new(Span::styled("klava — typing speed trainer", bold()))
        .alignment(Alignment::Center)
        .render(rows[0], buf);

    if let Some(best) = trainer.best() {
        Paragraph::new(best_line(best))
            .alignment(Alignment::Center)
            .render(rows[2], buf);
    }

    Paragraph::new(Span::styled("(enter) start / (esc) quit", italic()))
        .alignment(Alignment::Center)
        .render(rows[4], buf);
}

fn render_awaiting(trainer: &Trainer, area: Rect, buf: &mut Buffer) {
    let rows = centered_rows(area, 3);

    Paragraph::new(Span::styled(
        format!(
            "{} on the clock — press enter to begin",
            trainer.remaining_formatted()
        ),
        bold(),
    ))
    .alignment(Alignment::Center)
    .render(rows[0], buf);

    Paragraph::new(Span::styled("(esc) back", italic()))
        .alignment(Alignment::Center)
        .render(rows[2], buf);
}

fn render_active(trainer: &Trainer, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2), // timer
            Constraint::Length(4), // target lines
            Constraint::Length(2), // typed echo
            Constraint::Length(1), // live stats
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Span::styled(trainer.remaining_formatted(), dim_bold()))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let visible = trainer.visible_lines();
    let mut text_lines: Vec<Line> = Vec::with_capacity(visible.len());
    if let Some(current) = trainer.current_line() {
        text_lines.push(current_line_spans(trainer, current));
        for line in visible.iter().skip(1) {
            text_lines.push(Line::from(Span::styled(line.clone(), dim_bold())));
        }
    }

    // Short Cyrillic lines read best centered, like a prompt card.
    let widest = visible.iter().map(|l| l.width()).max().unwrap_or(0);
    let alignment = if widest <= area.width.saturating_sub(HORIZONTAL_MARGIN * 2) as usize {
        Alignment::Center
    } else {
        Alignment::Left
    };

    Paragraph::new(text_lines)
        .alignment(alignment)
        .wrap(Wrap { trim: false })
        .render(chunks[1], buf);

    Paragraph::new(Line::from(vec![
        Span::styled("› ", dim_bold()),
        Span::styled(trainer.typed().to_string(), bold()),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    let counter = trainer.counter();
    Paragraph::new(Span::styled(
        format!(
            "right: {}/{}   acc {:.0}%",
            counter.correct(),
            counter.attempted(),
            counter.percent()
        ),
        italic(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);
}

fn current_line_spans<'a>(trainer: &Trainer, current: &'a str) -> Line<'a> {
    let green_bold = bold().fg(Color::Green);
    let underlined_dim_bold = dim_bold().add_modifier(Modifier::UNDERLINED);

    let mut spans = Vec::with_capacity(3);
    if !trainer.correct_prefix().is_empty() {
        spans.push(Span::styled(trainer.correct_prefix().to_string(), green_bold));
    }

    let mut rest = current.chars().skip(trainer.cursor());
    if let Some(expected) = rest.next() {
        spans.push(Span::styled(
            expected.to_string(),
            underlined_dim_bold,
        ));
        spans.push(Span::styled(rest.collect::<String>(), dim_bold()));
    }

    Line::from(spans)
}

fn render_finished(trainer: &Trainer, area: Rect, buf: &mut Buffer) {
    let rows = centered_rows(area, 7);

    Paragraph::new(Span::styled("session over", bold()))
        .alignment(Alignment::Center)
        .render(rows[0], buf);

    if let Some(result) = trainer.result() {
        Paragraph::new(Span::styled(
            format!(
                "{} cpm   {:.2}% acc   {:.2} points",
                result.typing_speed,
                result.accuracy,
                result.score()
            ),
            bold(),
        ))
        .alignment(Alignment::Center)
        .render(rows[2], buf);
    }

    if let Some(best) = trainer.best() {
        Paragraph::new(best_line(best))
            .alignment(Alignment::Center)
            .render(rows[4], buf);
    }

    Paragraph::new(Span::styled("(enter) menu", italic()))
        .alignment(Alignment::Center)
        .render(rows[6], buf);
}
