use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget};

use crate::store::ProgressRecord;
use crate::store::progress::ProgressTotals;
use crate::ui::layout::centered_rect;
use crate::ui::theme::Theme;

/// Per-character statistics, weakest first.
pub struct ProgressTable<'a> {
    rows: Vec<(&'a str, &'a ProgressRecord)>,
    totals: ProgressTotals,
    scroll: usize,
    confirm_reset: bool,
    theme: &'a Theme,
}

impl<'a> ProgressTable<'a> {
    pub fn new(
        rows: Vec<(&'a str, &'a ProgressRecord)>,
        totals: ProgressTotals,
        scroll: usize,
        confirm_reset: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            rows,
            totals,
            scroll,
            confirm_reset,
            theme,
        }
    }

    fn accuracy_color(&self, accuracy: f64) -> ratatui::style::Color {
        let colors = &self.theme.colors;
        if accuracy >= 0.8 {
            colors.correct()
        } else if accuracy >= 0.5 {
            colors.warning()
        } else {
            colors.incorrect()
        }
    }
}

impl Widget for ProgressTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Progress ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let summary = format!(
            " {} characters studied | {} correct | {} incorrect | {:.0}% accuracy",
            self.totals.characters,
            self.totals.correct,
            self.totals.incorrect,
            self.totals.accuracy() * 100.0
        );
        Paragraph::new(Line::from(Span::styled(
            summary,
            Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
        )))
        .render(layout[0], buf);

        let header = format!(
            " {:<24} {:>8} {:>10} {:>9}  {}",
            "Character", "Correct", "Incorrect", "Accuracy", "Last seen"
        );
        Paragraph::new(Line::from(Span::styled(
            header,
            Style::default().fg(colors.text_dim()),
        )))
        .render(layout[1], buf);

        if self.rows.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                " No answers recorded yet.",
                Style::default().fg(colors.text_dim()),
            )))
            .render(layout[2], buf);
        } else {
            let lines: Vec<Line> = self
                .rows
                .iter()
                .skip(self.scroll)
                .take(layout[2].height as usize)
                .map(|(name, record)| {
                    let accuracy = record.accuracy();
                    Line::from(vec![
                        Span::styled(
                            format!(
                                " {:<24} {:>8} {:>10} ",
                                name, record.correct, record.incorrect
                            ),
                            Style::default().fg(colors.fg()),
                        ),
                        Span::styled(
                            format!("{:>8.0}%", accuracy * 100.0),
                            Style::default().fg(self.accuracy_color(accuracy)),
                        ),
                        Span::styled(
                            format!("  {}", record.last_seen.format("%Y-%m-%d")),
                            Style::default().fg(colors.text_dim()),
                        ),
                    ])
                })
                .collect();
            Paragraph::new(lines).render(layout[2], buf);
        }

        if self.confirm_reset {
            let dialog = centered_rect(40, 20, area);
            let dialog = Rect::new(dialog.x, dialog.y, dialog.width, dialog.height.min(5));
            Clear.render(dialog, buf);
            let block = Block::bordered()
                .title(" Reset progress ")
                .border_style(Style::default().fg(colors.incorrect()))
                .style(Style::default().bg(colors.bg()));
            let inner = block.inner(dialog);
            block.render(dialog, buf);
            Paragraph::new(vec![
                Line::from(Span::styled(
                    " Erase all recorded answers?",
                    Style::default().fg(colors.fg()),
                )),
                Line::from(Span::styled(
                    " [y] Yes  [n] No",
                    Style::default().fg(colors.warning()),
                )),
            ])
            .render(inner, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ProgressStore;

    fn render_text(table: ProgressTable<'_>) -> String {
        let area = Rect::new(0, 0, 90, 16);
        let mut buf = Buffer::empty(area);
        table.render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn empty_store_shows_placeholder() {
        let theme = Theme::default();
        let store = ProgressStore::in_memory();
        let text = render_text(ProgressTable::new(
            store.by_weakness(),
            store.totals(),
            0,
            false,
            &theme,
        ));
        assert!(text.contains("No answers recorded yet."));
    }

    #[test]
    fn rows_and_confirm_dialog() {
        let theme = Theme::default();
        let mut store = ProgressStore::in_memory();
        store.record_answer("Baron", false);
        let text = render_text(ProgressTable::new(
            store.by_weakness(),
            store.totals(),
            0,
            true,
            &theme,
        ));
        assert!(text.contains("Baron"));
        assert!(text.contains("Erase all recorded answers?"));
    }
}
