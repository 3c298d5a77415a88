use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::engine::question::{Question, QuestionKind};
use crate::store::ProgressRecord;
use crate::ui::layout::wrapped_line_count;
use crate::ui::theme::Theme;

/// One question card: prompt, numbered options and, once answered, the
/// verdict with earlier attempts for the character.
pub struct Flashcard<'a> {
    question: &'a Question,
    selected: Option<&'a str>,
    record: Option<&'a ProgressRecord>,
    theme: &'a Theme,
}

impl<'a> Flashcard<'a> {
    pub fn new(
        question: &'a Question,
        selected: Option<&'a str>,
        record: Option<&'a ProgressRecord>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            question,
            selected,
            record,
            theme,
        }
    }

    fn heading(&self) -> &'static str {
        match self.question.kind {
            QuestionKind::AbilityFromName => "What is this character's ability?",
            QuestionKind::NameFromAbility => "Which character has this ability?",
        }
    }

    fn option_style(&self, option: &str) -> Style {
        let colors = &self.theme.colors;
        match self.selected {
            None => Style::default().fg(colors.fg()),
            Some(_) if option == self.question.correct_answer => Style::default()
                .fg(colors.correct())
                .add_modifier(Modifier::BOLD),
            Some(picked) if picked == option => Style::default()
                .fg(colors.incorrect())
                .add_modifier(Modifier::CROSSED_OUT),
            Some(_) => Style::default().fg(colors.text_dim()),
        }
    }
}

impl Widget for Flashcard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let category = self.question.character.category;

        let block = Block::bordered()
            .title(format!(" {} ", category))
            .border_style(Style::default().fg(colors.category(category)))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width < 4 || inner.height < 4 {
            return;
        }
        let width = inner.width as usize;
        let prompt = self.question.prompt();
        let prompt_rows = wrapped_line_count(prompt, width.saturating_sub(4)) as u16;

        let option_rows: u16 = self
            .question
            .options
            .iter()
            .map(|o| wrapped_line_count(o, width.saturating_sub(6)) as u16 + 1)
            .sum();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(prompt_rows + 1),
                Constraint::Length(option_rows),
                Constraint::Min(0),
            ])
            .split(inner);

        Paragraph::new(Line::from(Span::styled(
            self.heading(),
            Style::default().fg(colors.text_dim()),
        )))
        .alignment(Alignment::Center)
        .render(layout[0], buf);

        let prompt_style = match self.question.kind {
            QuestionKind::AbilityFromName => Style::default()
                .fg(colors.category(category))
                .add_modifier(Modifier::BOLD),
            QuestionKind::NameFromAbility => Style::default().fg(colors.fg()),
        };
        Paragraph::new(Line::from(Span::styled(prompt, prompt_style)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(layout[1], buf);

        let mut lines: Vec<Line> = Vec::new();
        for (i, option) in self.question.options.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!(" [{}] ", i + 1),
                    Style::default().fg(colors.accent()),
                ),
                Span::styled(option.as_str(), self.option_style(option)),
            ]));
            lines.push(Line::from(""));
        }
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(layout[2], buf);

        if let Some(picked) = self.selected {
            let (verdict, style) = if self.question.is_correct(picked) {
                ("Correct!", Style::default().fg(colors.correct()))
            } else {
                ("Incorrect", Style::default().fg(colors.incorrect()))
            };
            let mut result_lines = vec![Line::from(Span::styled(
                verdict,
                style.add_modifier(Modifier::BOLD),
            ))];
            if self.question.kind == QuestionKind::NameFromAbility {
                result_lines.push(Line::from(Span::styled(
                    format!("It was the {}.", self.question.character.name),
                    Style::default().fg(colors.fg()),
                )));
            }
            if let Some(record) = self.record {
                result_lines.push(Line::from(Span::styled(
                    format!(
                        "History: {} correct, {} incorrect ({:.0}%)",
                        record.correct,
                        record.incorrect,
                        record.accuracy() * 100.0
                    ),
                    Style::default().fg(colors.text_dim()),
                )));
            }
            Paragraph::new(result_lines)
                .alignment(Alignment::Center)
                .render(layout[3], buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, Character};
    use chrono::Utc;

    fn question() -> Question {
        Question {
            character: Character::new(
                "Imp",
                "Each night*, choose a player: they die.",
                Category::Demon,
                "Trouble Brewing",
            ),
            options: vec![
                "Each night*, choose a player: they die.".to_string(),
                "Each day*, choose a player: they die.".to_string(),
            ],
            correct_answer: "Each night*, choose a player: they die.".to_string(),
            kind: QuestionKind::AbilityFromName,
        }
    }

    fn render_text(card: Flashcard<'_>) -> String {
        let area = Rect::new(0, 0, 70, 20);
        let mut buf = Buffer::empty(area);
        card.render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn unanswered_card_shows_prompt_and_options() {
        let theme = Theme::default();
        let q = question();
        let text = render_text(Flashcard::new(&q, None, None, &theme));
        assert!(text.contains("Imp"));
        assert!(text.contains("[1]"));
        assert!(text.contains("[2]"));
        assert!(!text.contains("Correct!"));
    }

    #[test]
    fn answered_card_shows_verdict_and_history() {
        let theme = Theme::default();
        let q = question();
        let mut record = ProgressRecord::new(Utc::now());
        record.record(false, Utc::now());
        let text = render_text(Flashcard::new(
            &q,
            Some("Each day*, choose a player: they die."),
            Some(&record),
            &theme,
        ));
        assert!(text.contains("Incorrect"));
        assert!(text.contains("0 correct, 1 incorrect"));
    }
}
