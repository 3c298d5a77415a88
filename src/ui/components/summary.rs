use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::QuizSummary;
use crate::ui::theme::Theme;

/// End-of-run card with score and encouragement.
pub struct SummaryCard<'a> {
    summary: &'a QuizSummary,
    script: &'a str,
    theme: &'a Theme,
}

impl<'a> SummaryCard<'a> {
    pub fn new(summary: &'a QuizSummary, script: &'a str, theme: &'a Theme) -> Self {
        Self {
            summary,
            script,
            theme,
        }
    }
}

impl Widget for SummaryCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Quiz complete ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let score_color = if self.summary.percentage >= 70 {
            colors.correct()
        } else if self.summary.percentage >= 50 {
            colors.warning()
        } else {
            colors.incorrect()
        };

        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                self.script,
                Style::default().fg(colors.text_dim()),
            )),
            Line::from(""),
            Line::from(Span::styled(
                self.summary.message,
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "{} / {} correct",
                    self.summary.score.correct, self.summary.score.total
                ),
                Style::default().fg(colors.fg()),
            )),
            Line::from(Span::styled(
                format!("{}%", self.summary.percentage),
                Style::default()
                    .fg(score_color)
                    .add_modifier(Modifier::BOLD),
            )),
        ];
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(inner, buf);
    }
}
