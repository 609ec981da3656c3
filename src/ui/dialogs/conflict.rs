use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::centered_rect;
use crate::merge::{ConflictChoice, PendingConflict};

/// What the user decided in the conflict dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictDecision {
    Resolve(ConflictChoice),
    Cancel,
}

/// Asks whether an incoming description replaces or extends the one
/// already on the target stage.
pub struct ConflictDialog {
    pub visible: bool,
    target_name: String,
    current: String,
    incoming: String,
    separator: String,
}

impl ConflictDialog {
    pub fn new() -> Self {
        Self {
            visible: false,
            target_name: String::new(),
            current: String::new(),
            incoming: String::new(),
            separator: String::new(),
        }
    }

    /// Show the dialog for `conflict`, whose target currently reads `current`.
    pub fn show(
        &mut self,
        conflict: &PendingConflict,
        target_name: &str,
        current: &str,
        separator: &str,
    ) {
        self.target_name = target_name.to_string();
        self.current = current.to_string();
        self.incoming = conflict.incoming_text.clone();
        self.separator = separator.to_string();
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn handle_key(&mut self, key: KeyCode) -> Option<ConflictDecision> {
        let decision = match key {
            KeyCode::Char('r') | KeyCode::Char('R') => {
                ConflictDecision::Resolve(ConflictChoice::Replace)
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                ConflictDecision::Resolve(ConflictChoice::Append)
            }
            KeyCode::Esc => ConflictDecision::Cancel,
            _ => return None,
        };
        self.hide();
        Some(decision)
    }

    fn appended_preview(&self) -> String {
        format!("{}{}{}", self.current, self.separator, self.incoming)
    }

    pub fn render(&self, frame: &mut Frame) {
        if !self.visible {
            return;
        }

        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(format!(" Description conflict on {} ", self.target_name))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(30), // Current
                Constraint::Percentage(30), // Incoming
                Constraint::Min(3),         // Append preview
                Constraint::Length(1),      // Instructions
            ])
            .margin(1)
            .split(inner);

        let section = |title: &'static str, text: &str, color: Color| {
            Paragraph::new(text.to_string())
                .block(
                    Block::default()
                        .title(Span::styled(
                            title,
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        ))
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::DarkGray)),
                )
                .wrap(Wrap { trim: false })
        };

        frame.render_widget(section(" Current ", &self.current, Color::Cyan), chunks[0]);
        frame.render_widget(
            section(" Incoming ", &self.incoming, Color::Green),
            chunks[1],
        );
        frame.render_widget(
            section(" After append ", &self.appended_preview(), Color::Gray),
            chunks[2],
        );

        let instructions = Line::from(vec![
            Span::styled("[R]", Style::default().fg(Color::Yellow)),
            Span::raw("eplace  "),
            Span::styled("[A]", Style::default().fg(Color::Yellow)),
            Span::raw("ppend  "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(" cancel"),
        ]);
        frame.render_widget(
            Paragraph::new(instructions).alignment(Alignment::Center),
            chunks[3],
        );
    }
}

impl Default for ConflictDialog {
    fn default() -> Self {
        Self::new()
    }
}
