//! Board view of a merge session: one column per working stage, with the
//! draft stage in its own pane on the right.
//!
//! The keyboard cursor doubles as the pointer: while an item is picked up,
//! the slot under the cursor is the hovered drop target.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::merge::{DragPayload, DragSession, DropTarget, WorkingSet};
use crate::types::Stage;
use crate::ui::keybindings::{shortcuts_for_context, ShortcutContext};

/// Working-stage columns shown at once
const MAX_COLUMNS: usize = 4;

/// A cursor position inside one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Description,
    SubStep(usize),
    /// Past the last sub-step; drops append.
    ListEnd,
}

pub struct MergeView {
    /// Index into `WorkingSet::iter()` order (draft last)
    stage_index: usize,
    slot: Slot,
    /// Transient message for the status line
    pub status_message: Option<String>,
}

impl MergeView {
    pub fn new() -> Self {
        Self {
            stage_index: 0,
            slot: Slot::Description,
            status_message: None,
        }
    }

    pub fn cursor(&self) -> (usize, Slot) {
        (self.stage_index, self.slot)
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    fn current_stage<'a>(&self, ws: &'a WorkingSet) -> Option<&'a Stage> {
        ws.iter().nth(self.stage_index)
    }

    fn slot_count(stage: &Stage) -> usize {
        stage.sub_steps.len() + 2
    }

    fn slot_position(&self) -> usize {
        match self.slot {
            Slot::Description => 0,
            Slot::SubStep(i) => i + 1,
            Slot::ListEnd => usize::MAX,
        }
    }

    fn slot_at(stage: &Stage, position: usize) -> Slot {
        match position {
            0 => Slot::Description,
            p if p <= stage.sub_steps.len() => Slot::SubStep(p - 1),
            _ => Slot::ListEnd,
        }
    }

    /// Keep the cursor on an existing stage and slot after the working set
    /// changed underneath it.
    pub fn clamp(&mut self, ws: &WorkingSet) {
        let total = ws.total_len();
        if total == 0 {
            self.stage_index = 0;
            self.slot = Slot::Description;
            return;
        }
        self.stage_index = self.stage_index.min(total - 1);
        if let (Slot::SubStep(i), Some(stage)) = (self.slot, self.current_stage(ws)) {
            if i >= stage.sub_steps.len() {
                self.slot = Slot::ListEnd;
            }
        }
    }

    pub fn move_down(&mut self, ws: &WorkingSet) {
        if let Some(stage) = self.current_stage(ws) {
            let last = Self::slot_count(stage) - 1;
            let next = self.slot_position().min(last).saturating_add(1).min(last);
            self.slot = Self::slot_at(stage, next);
        }
    }

    pub fn move_up(&mut self, ws: &WorkingSet) {
        if let Some(stage) = self.current_stage(ws) {
            let last = Self::slot_count(stage) - 1;
            let prev = self.slot_position().min(last).saturating_sub(1);
            self.slot = Self::slot_at(stage, prev);
        }
    }

    pub fn next_stage(&mut self, ws: &WorkingSet) {
        if self.stage_index + 1 < ws.total_len() {
            self.stage_index += 1;
            self.carry_slot(ws);
        }
    }

    pub fn prev_stage(&mut self, ws: &WorkingSet) {
        if self.stage_index > 0 {
            self.stage_index -= 1;
            self.carry_slot(ws);
        }
    }

    /// Keep the slot kind when hopping stages so a picked-up item stays
    /// over a compatible target.
    fn carry_slot(&mut self, ws: &WorkingSet) {
        if let Slot::SubStep(_) = self.slot {
            self.slot = Slot::ListEnd;
        }
        self.clamp(ws);
    }

    /// Move the cursor to the draft stage.
    pub fn focus_draft(&mut self, ws: &WorkingSet) {
        if ws.has_draft() {
            self.stage_index = ws.total_len() - 1;
            self.slot = Slot::Description;
        }
    }

    /// The item under the cursor, if it can be picked up.
    pub fn selected_payload(&self, ws: &WorkingSet) -> Option<DragPayload> {
        let stage = self.current_stage(ws)?;
        match self.slot {
            Slot::Description => DragPayload::description_of(stage),
            Slot::SubStep(i) => DragPayload::sub_step_of(stage, i),
            Slot::ListEnd => None,
        }
    }

    /// The drop zone under the cursor.
    pub fn selected_target(&self, ws: &WorkingSet) -> Option<DropTarget> {
        let stage = self.current_stage(ws)?.id.clone();
        Some(match self.slot {
            Slot::Description => DropTarget::StageBody { stage },
            Slot::SubStep(i) => DropTarget::SubStepList {
                stage,
                insert_before: Some(i),
            },
            Slot::ListEnd => DropTarget::SubStepList {
                stage,
                insert_before: None,
            },
        })
    }

    /// First working-stage column to draw so the cursor stays visible.
    fn first_visible_column(&self, working: usize) -> usize {
        if working <= MAX_COLUMNS {
            return 0;
        }
        let focus = self.stage_index.min(working - 1);
        focus.saturating_sub(MAX_COLUMNS - 1).min(working - MAX_COLUMNS)
    }

    pub fn render(&self, frame: &mut Frame, ws: &WorkingSet, drag: &DragSession) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(2)])
            .split(frame.area());

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
            .split(rows[0]);

        self.render_working_stages(frame, panes[0], ws, drag);
        self.render_draft_pane(frame, panes[1], ws, drag);
        self.render_status(frame, rows[1], drag);
    }

    fn render_working_stages(&self, frame: &mut Frame, area: Rect, ws: &WorkingSet, drag: &DragSession) {
        let stages = ws.stages();
        if stages.is_empty() {
            let empty = Paragraph::new("No stages left")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().title(" Stages ").borders(Borders::ALL));
            frame.render_widget(empty, area);
            return;
        }

        let first = self.first_visible_column(stages.len());
        let shown = stages.len().min(MAX_COLUMNS);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, shown as u32); shown])
            .split(area);

        for (offset, column) in columns.iter().enumerate() {
            let index = first + offset;
            self.render_stage(frame, *column, &stages[index], index, drag);
        }
    }

    fn render_draft_pane(&self, frame: &mut Frame, area: Rect, ws: &WorkingSet, drag: &DragSession) {
        match ws.draft() {
            Some(draft) => self.render_stage(frame, area, draft, ws.total_len() - 1, drag),
            None => {
                let hint = Paragraph::new(vec![
                    Line::from(""),
                    Line::from(Span::styled(
                        "Press n to start a new stage",
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .title(" New Stage ")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::DarkGray)),
                );
                frame.render_widget(hint, area);
            }
        }
    }

    fn render_stage(
        &self,
        frame: &mut Frame,
        area: Rect,
        stage: &Stage,
        index: usize,
        drag: &DragSession,
    ) {
        let focused = index == self.stage_index;
        let dragging = drag.payload();

        let cursor_style = |slot: Slot| {
            if focused && self.slot == slot {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            }
        };
        let is_source = |slot: Slot| match dragging {
            Some(DragPayload::Description { source_stage, .. }) => {
                *source_stage == stage.id && slot == Slot::Description
            }
            Some(DragPayload::SubStep {
                source_stage,
                source_index,
                ..
            }) => *source_stage == stage.id && slot == Slot::SubStep(*source_index),
            None => false,
        };
        let dim = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC);

        let mut lines = vec![Line::from(Span::styled(
            "Description",
            Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
        ))];

        let description = if stage.has_description() {
            stage.description.as_str()
        } else {
            "(none)"
        };
        let mut style = cursor_style(Slot::Description);
        if is_source(Slot::Description) || !stage.has_description() {
            style = style.patch(dim);
        }
        for text in description.lines() {
            lines.push(Line::from(Span::styled(text.to_string(), style)));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Sub-steps ({})", stage.sub_steps.len()),
            Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
        )));
        for (i, text) in stage.sub_steps.iter().enumerate() {
            let mut style = cursor_style(Slot::SubStep(i));
            if is_source(Slot::SubStep(i)) {
                style = style.patch(dim);
            }
            lines.push(Line::from(Span::styled(format!("• {}", text), style)));
        }
        lines.push(Line::from(Span::styled(
            "  + end of list",
            cursor_style(Slot::ListEnd).patch(Style::default().fg(Color::DarkGray)),
        )));

        let border_style = match (focused, drag.is_dragging()) {
            (true, true) if drag.hover_accepts_payload() => Style::default().fg(Color::Green),
            (true, true) => Style::default().fg(Color::Red),
            (true, false) => Style::default().fg(Color::Cyan),
            (false, _) => Style::default().fg(Color::Gray),
        };

        let mut title = vec![Span::styled(
            format!(" {} ", stage.display_name(index)),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        if stage.is_draft {
            title.push(Span::styled("[new] ", Style::default().fg(Color::Yellow)));
        } else {
            title.push(Span::styled(
                format!("[{}] ", stage.origin.label()),
                Style::default().fg(Color::DarkGray),
            ));
        }

        let widget = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .title(Line::from(title))
                .borders(Borders::ALL)
                .border_style(border_style),
        );
        frame.render_widget(widget, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, drag: &DragSession) {
        let mut spans = Vec::new();

        match drag.payload() {
            Some(payload) => {
                let kind = match payload {
                    DragPayload::Description { .. } => "description",
                    DragPayload::SubStep { .. } => "sub-step",
                };
                spans.push(Span::styled(
                    format!(" Moving {} ", kind),
                    Style::default().fg(Color::Black).bg(Color::Yellow),
                ));
                spans.push(Span::raw(format!(" {}", truncate(payload.text(), 40))));
            }
            None => spans.push(Span::styled(
                " EDITING ",
                Style::default().fg(Color::Black).bg(Color::Cyan),
            )),
        }

        if let Some(message) = &self.status_message {
            spans.push(Span::styled(
                format!("  {}", message),
                Style::default().fg(Color::Yellow),
            ));
        }

        let context = if drag.is_dragging() {
            ShortcutContext::Dragging
        } else {
            ShortcutContext::Editing
        };
        let hints: Vec<String> = shortcuts_for_context(context)
            .map(|s| format!("[{}] {}", s.key_display(), s.description))
            .collect();

        let content = vec![
            Line::from(spans),
            Line::from(Span::styled(
                hints.join("  "),
                Style::default().fg(Color::DarkGray),
            )),
        ];
        frame.render_widget(Paragraph::new(content), area);
    }
}

impl Default for MergeView {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.chars().count() > max_chars {
        let cut: String = first_line.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        first_line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn working_set() -> WorkingSet {
        WorkingSet::new(&[
            Stage::new("a", "A")
                .with_description("Plan")
                .with_sub_steps(["one", "two"]),
            Stage::new("b", "B"),
        ])
    }

    #[test]
    fn test_vertical_navigation_walks_slots() {
        let ws = working_set();
        let mut view = MergeView::new();

        view.move_up(&ws);
        assert_eq!(view.cursor(), (0, Slot::Description));

        view.move_down(&ws);
        assert_eq!(view.cursor(), (0, Slot::SubStep(0)));
        view.move_down(&ws);
        view.move_down(&ws);
        assert_eq!(view.cursor(), (0, Slot::ListEnd));
        view.move_down(&ws);
        assert_eq!(view.cursor(), (0, Slot::ListEnd));

        view.move_up(&ws);
        assert_eq!(view.cursor(), (0, Slot::SubStep(1)));
    }

    #[test]
    fn test_stage_hops_keep_slot_kind() {
        let ws = working_set();
        let mut view = MergeView::new();

        view.move_down(&ws);
        view.next_stage(&ws);
        assert_eq!(view.cursor(), (1, Slot::ListEnd));

        view.next_stage(&ws);
        assert_eq!(view.cursor().0, 1);

        view.move_up(&ws);
        view.prev_stage(&ws);
        assert_eq!(view.cursor(), (0, Slot::Description));
    }

    #[test]
    fn test_payload_and_target_under_cursor() {
        let ws = working_set();
        let mut view = MergeView::new();

        assert_eq!(
            view.selected_payload(&ws).map(|p| p.text().to_string()),
            Some("Plan".to_string())
        );
        assert_eq!(
            view.selected_target(&ws),
            Some(DropTarget::StageBody { stage: "a".into() })
        );

        view.move_down(&ws);
        view.move_down(&ws);
        assert_eq!(
            view.selected_payload(&ws),
            Some(DragPayload::SubStep {
                text: "two".to_string(),
                source_stage: "a".into(),
                source_index: 1,
            })
        );
        assert_eq!(
            view.selected_target(&ws),
            Some(DropTarget::SubStepList {
                stage: "a".into(),
                insert_before: Some(1)
            })
        );

        view.next_stage(&ws);
        assert_eq!(view.selected_payload(&ws), None);
        assert_eq!(
            view.selected_target(&ws),
            Some(DropTarget::SubStepList {
                stage: "b".into(),
                insert_before: None
            })
        );
    }

    #[test]
    fn test_blank_description_cannot_be_picked_up() {
        let ws = working_set();
        let mut view = MergeView::new();
        view.next_stage(&ws);
        assert_eq!(view.selected_payload(&ws), None);
    }

    #[test]
    fn test_clamp_after_stage_removed() {
        let mut ws = working_set();
        let mut view = MergeView::new();
        view.next_stage(&ws);

        ws = WorkingSet::new(&ws.stages()[..1]);
        view.clamp(&ws);
        assert_eq!(view.cursor().0, 0);
    }

    #[test]
    fn test_focus_draft() {
        let mut ws = working_set();
        let mut view = MergeView::new();

        view.focus_draft(&ws);
        assert_eq!(view.cursor().0, 0);

        ws.create_draft_stage("New Framework").unwrap();
        view.focus_draft(&ws);
        assert_eq!(view.cursor(), (2, Slot::Description));
    }

    #[test]
    fn test_visible_columns_follow_cursor() {
        let mut view = MergeView::new();
        assert_eq!(view.first_visible_column(3), 0);

        view.stage_index = 5;
        assert_eq!(view.first_visible_column(8), 2);

        view.stage_index = 9;
        assert_eq!(view.first_visible_column(8), 4);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer line", 10), "a much ...");
        assert_eq!(truncate("first\nsecond", 10), "first");
    }
}
