use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::centered_rect;
use crate::ui::keybindings::{shortcuts_by_category_for_context, ShortcutContext};

pub struct HelpDialog {
    pub visible: bool,
}

impl HelpDialog {
    pub fn new() -> Self {
        Self { visible: false }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    fn lines() -> Vec<Line<'static>> {
        let heading = Style::default()
            .add_modifier(Modifier::BOLD)
            .fg(Color::Cyan);

        let mut help_text = vec![
            Line::from(Span::styled("Keyboard Shortcuts", heading)),
            Line::from(""),
        ];

        for (i, context) in ShortcutContext::all().iter().enumerate() {
            if i > 0 {
                help_text.push(Line::from(""));
            }
            help_text.push(Line::from(Span::styled(
                format!("{}:", context.display_name()),
                heading,
            )));

            for (_, shortcuts) in shortcuts_by_category_for_context(*context) {
                for shortcut in shortcuts {
                    help_text.push(Line::from(vec![
                        Span::styled(
                            format!("  {}", shortcut.key_display_padded()),
                            Style::default().fg(Color::Yellow),
                        ),
                        Span::raw(shortcut.description),
                    ]));
                }
            }
        }

        help_text.push(Line::from(""));
        help_text.push(Line::from(Span::styled(
            "Press any key to close",
            Style::default().fg(Color::Gray),
        )));
        help_text
    }

    pub fn render(&self, frame: &mut Frame) {
        if !self.visible {
            return;
        }

        let area = centered_rect(70, 80, frame.area());
        frame.render_widget(Clear, area);

        let help = Paragraph::new(Self::lines())
            .block(
                Block::default()
                    .title(" Help ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .alignment(Alignment::Left);

        frame.render_widget(help, area);
    }
}

impl Default for HelpDialog {
    fn default() -> Self {
        Self::new()
    }
}
