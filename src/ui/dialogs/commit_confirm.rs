use crossterm::event::KeyCode;
use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::centered_rect;
use crate::merge::CommitSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitDecision {
    Confirm,
    Back,
}

/// Summary shown before the merged stage list is handed back.
pub struct CommitConfirmDialog {
    pub visible: bool,
    summary: Option<CommitSummary>,
}

impl CommitConfirmDialog {
    pub fn new() -> Self {
        Self {
            visible: false,
            summary: None,
        }
    }

    pub fn show(&mut self, summary: CommitSummary) {
        self.summary = Some(summary);
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.summary = None;
    }

    pub fn handle_key(&mut self, key: KeyCode) -> Option<CommitDecision> {
        let decision = match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => CommitDecision::Confirm,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => CommitDecision::Back,
            _ => return None,
        };
        self.hide();
        Some(decision)
    }

    /// "You have N stage(s). Original count was M."
    pub fn summary_text(&self) -> String {
        match self.summary {
            Some(summary) => format!(
                "You have {} stage{}. Original count was {}.",
                summary.stage_count,
                if summary.stage_count == 1 { "" } else { "s" },
                summary.original_count
            ),
            None => String::new(),
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        if !self.visible {
            return;
        }

        let area = centered_rect(50, 30, frame.area());
        frame.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Save merged stages?",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(self.summary_text()),
            Line::from(""),
            Line::from(vec![
                Span::styled("[Y]", Style::default().fg(Color::Green)),
                Span::raw("es  "),
                Span::styled("[N]", Style::default().fg(Color::Red)),
                Span::raw("o, keep editing"),
            ]),
        ];

        let dialog = Paragraph::new(text)
            .block(
                Block::default()
                    .title(" Save Changes ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });

        frame.render_widget(dialog, area);
    }
}

impl Default for CommitConfirmDialog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_text_pluralizes() {
        let mut dialog = CommitConfirmDialog::new();
        dialog.show(CommitSummary {
            stage_count: 1,
            original_count: 2,
        });
        assert_eq!(dialog.summary_text(), "You have 1 stage. Original count was 2.");

        dialog.show(CommitSummary {
            stage_count: 3,
            original_count: 2,
        });
        assert_eq!(dialog.summary_text(), "You have 3 stages. Original count was 2.");
    }

    #[test]
    fn test_handle_key() {
        let mut dialog = CommitConfirmDialog::new();
        let summary = CommitSummary {
            stage_count: 2,
            original_count: 2,
        };

        dialog.show(summary);
        assert_eq!(dialog.handle_key(KeyCode::Char('x')), None);
        assert!(dialog.visible);
        assert_eq!(dialog.handle_key(KeyCode::Enter), Some(CommitDecision::Confirm));
        assert!(!dialog.visible);

        dialog.show(summary);
        assert_eq!(dialog.handle_key(KeyCode::Esc), Some(CommitDecision::Back));
        assert!(dialog.summary_text().is_empty());
    }
}
