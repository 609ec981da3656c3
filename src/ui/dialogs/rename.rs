use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::centered_rect;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameResult {
    Confirmed(String),
    Cancelled,
}

/// Single-line input for renaming the draft stage.
pub struct RenameDialog {
    pub visible: bool,
    pub name: String,
    /// Cursor position in chars, not bytes
    pub cursor_position: usize,
}

impl RenameDialog {
    pub fn new() -> Self {
        Self {
            visible: false,
            name: String::new(),
            cursor_position: 0,
        }
    }

    /// Show the dialog pre-filled with the current name
    pub fn show(&mut self, current: &str) {
        self.name = current.to_string();
        self.cursor_position = self.char_len();
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.name.clear();
        self.cursor_position = 0;
    }

    fn char_len(&self) -> usize {
        self.name.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.name
            .char_indices()
            .nth(char_index)
            .map_or(self.name.len(), |(i, _)| i)
    }

    pub fn handle_key(&mut self, key: KeyCode) -> Option<RenameResult> {
        match key {
            KeyCode::Enter => {
                let result = RenameResult::Confirmed(self.name.clone());
                self.hide();
                return Some(result);
            }
            KeyCode::Esc => {
                self.hide();
                return Some(RenameResult::Cancelled);
            }
            KeyCode::Char(c) => {
                let at = self.byte_index(self.cursor_position);
                self.name.insert(at, c);
                self.cursor_position += 1;
            }
            KeyCode::Backspace if self.cursor_position > 0 => {
                self.cursor_position -= 1;
                let at = self.byte_index(self.cursor_position);
                self.name.remove(at);
            }
            KeyCode::Delete if self.cursor_position < self.char_len() => {
                let at = self.byte_index(self.cursor_position);
                self.name.remove(at);
            }
            KeyCode::Left => self.cursor_position = self.cursor_position.saturating_sub(1),
            KeyCode::Right => self.cursor_position = (self.cursor_position + 1).min(self.char_len()),
            KeyCode::Home => self.cursor_position = 0,
            KeyCode::End => self.cursor_position = self.char_len(),
            _ => {}
        }
        None
    }

    pub fn render(&self, frame: &mut Frame) {
        if !self.visible {
            return;
        }

        let area = centered_rect(50, 20, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(" Rename New Stage ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Text input
                Constraint::Length(1), // Instructions
            ])
            .split(inner);

        let display_text = if self.name.is_empty() {
            Span::styled("Stage name...", Style::default().fg(Color::DarkGray))
        } else {
            Span::styled(&self.name, Style::default().fg(Color::White))
        };

        let input_block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let input_inner = input_block.inner(chunks[0]);
        frame.render_widget(Paragraph::new(display_text).block(input_block), chunks[0]);
        frame.set_cursor_position((input_inner.x + self.cursor_position as u16, input_inner.y));

        let instructions = Line::from(vec![
            Span::styled("Enter", Style::default().fg(Color::Yellow)),
            Span::raw(" to confirm  "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(" to cancel"),
        ]);
        frame.render_widget(
            Paragraph::new(instructions).alignment(Alignment::Center),
            chunks[1],
        );
    }
}

impl Default for RenameDialog {
    fn default() -> Self {
        Self::new()
    }
}
