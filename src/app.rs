use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

use crate::config::Config;
use crate::merge::{CollectingHost, IgnoreReason, MergeOptions, MergeSession, MoveOutcome};
use crate::types::{Stage, StageId};
use crate::ui::dialogs::{
    CommitConfirmDialog, CommitDecision, ConflictDecision, ConflictDialog, HelpDialog,
    RenameDialog, RenameResult,
};
use crate::ui::terminal_guard::{install_panic_hook, TerminalGuard};
use crate::ui::MergeView;

/// Interactive merge editor.
pub struct App {
    session: MergeSession<CollectingHost>,
    view: MergeView,
    help_dialog: HelpDialog,
    conflict_dialog: ConflictDialog,
    commit_dialog: CommitConfirmDialog,
    rename_dialog: RenameDialog,
    refresh_rate: Duration,
}

impl App {
    pub fn new(stages: &[Stage], config: &Config) -> Self {
        Self::with_session(
            MergeSession::new(
                stages,
                MergeOptions::from(&config.merge),
                CollectingHost::default(),
            ),
            Duration::from_millis(config.ui.refresh_rate_ms),
        )
    }

    fn with_session(session: MergeSession<CollectingHost>, refresh_rate: Duration) -> Self {
        Self {
            session,
            view: MergeView::new(),
            help_dialog: HelpDialog::new(),
            conflict_dialog: ConflictDialog::new(),
            commit_dialog: CommitConfirmDialog::new(),
            rename_dialog: RenameDialog::new(),
            refresh_rate,
        }
    }

    /// Run until the user commits or leaves. Returns what the session
    /// handed back.
    pub fn run(mut self) -> Result<CollectingHost> {
        install_panic_hook();
        let guard = TerminalGuard::new()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

        while self.session.is_active() {
            terminal.draw(|f| {
                self.view
                    .render(f, self.session.working_set(), self.session.drag());
                self.conflict_dialog.render(f);
                self.commit_dialog.render(f);
                self.rename_dialog.render(f);
                self.help_dialog.render(f);
            })?;

            if event::poll(self.refresh_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }

            self.tick();
        }

        guard.release();
        Ok(self.session.into_host())
    }

    /// Run due prune checks and keep the cursor on a live stage.
    fn tick(&mut self) {
        let pruned = self.session.tick();
        if !pruned.is_empty() {
            self.view.clamp(self.session.working_set());
            self.view.set_status(format!(
                "Removed {} empty stage{}",
                pruned.len(),
                if pruned.len() == 1 { "" } else { "s" }
            ));
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        if self.rename_dialog.visible {
            if let Some(RenameResult::Confirmed(name)) = self.rename_dialog.handle_key(key) {
                if let Err(e) = self.session.rename_draft_stage(&name) {
                    self.view.set_status(e.to_string());
                }
            }
            return;
        }

        if self.commit_dialog.visible {
            match self.commit_dialog.handle_key(key) {
                Some(CommitDecision::Confirm) => {
                    if let Err(e) = self.session.confirm_commit() {
                        self.view.set_status(e.to_string());
                    }
                }
                Some(CommitDecision::Back) => self.session.cancel_commit_request(),
                None => {}
            }
            return;
        }

        if self.conflict_dialog.visible {
            match self.conflict_dialog.handle_key(key) {
                Some(ConflictDecision::Resolve(choice)) => {
                    let outcome = self.session.resolve_conflict(choice);
                    self.apply_outcome(outcome);
                }
                Some(ConflictDecision::Cancel) => {
                    self.session.cancel_conflict();
                    self.view.set_status("Drop cancelled");
                }
                None => {}
            }
            return;
        }

        if self.help_dialog.visible {
            self.help_dialog.visible = false;
            return;
        }

        if self.session.drag().is_dragging() {
            self.handle_dragging_key(key);
        } else {
            self.handle_editing_key(key);
        }
    }

    /// Cursor movement shared by both modes. Returns whether the key moved it.
    fn handle_navigation(&mut self, key: KeyCode) -> bool {
        let ws = self.session.working_set();
        match key {
            KeyCode::Down | KeyCode::Char('j') => self.view.move_down(ws),
            KeyCode::Up | KeyCode::Char('k') => self.view.move_up(ws),
            KeyCode::Tab | KeyCode::Right => self.view.next_stage(ws),
            KeyCode::BackTab | KeyCode::Left => self.view.prev_stage(ws),
            _ => return false,
        }
        true
    }

    fn handle_dragging_key(&mut self, key: KeyCode) {
        if self.handle_navigation(key) {
            let target = self.view.selected_target(self.session.working_set());
            self.session.drag_over(target);
            return;
        }

        match key {
            KeyCode::Char(' ') | KeyCode::Enter => {
                let outcome = self.session.end_drag_at_hover();
                self.apply_outcome(outcome);
            }
            KeyCode::Esc => {
                self.session.cancel_drag();
                self.view.set_status("Put back");
            }
            KeyCode::Char('q') => self.exit(),
            _ => {}
        }
    }

    fn handle_editing_key(&mut self, key: KeyCode) {
        if self.handle_navigation(key) {
            return;
        }

        match key {
            KeyCode::Char(' ') | KeyCode::Enter => {
                let ws = self.session.working_set();
                let Some(payload) = self.view.selected_payload(ws) else {
                    self.view.set_status("Nothing to pick up here");
                    return;
                };
                let target = self.view.selected_target(ws);
                if self.session.begin_drag(payload) {
                    self.session.drag_over(target);
                    self.view.status_message = None;
                }
            }
            KeyCode::Char('n') => match self.session.create_draft_stage() {
                Ok(_) => self.view.focus_draft(self.session.working_set()),
                Err(e) => self.view.set_status(e.to_string()),
            },
            KeyCode::Char('r') => match self.session.working_set().draft() {
                Some(draft) => self.rename_dialog.show(&draft.name),
                None => self.view.set_status("No new stage to rename"),
            },
            KeyCode::Char('x') => match self.session.delete_draft_stage() {
                Ok(_) => {
                    self.view.clamp(self.session.working_set());
                    self.view.set_status("New stage deleted");
                }
                Err(e) => self.view.set_status(e.to_string()),
            },
            KeyCode::Char('s') => match self.session.request_commit() {
                Ok(summary) => {
                    self.view.clamp(self.session.working_set());
                    self.commit_dialog.show(summary);
                }
                Err(e) => self.view.set_status(e.to_string()),
            },
            KeyCode::Char('?') => self.help_dialog.toggle(),
            KeyCode::Char('q') => self.exit(),
            _ => {}
        }
    }

    fn exit(&mut self) {
        if let Err(e) = self.session.exit_without_saving() {
            tracing::warn!(error = %e, "Exit refused");
        }
    }

    fn stage_label(&self, id: &StageId) -> String {
        let ws = self.session.working_set();
        ws.iter()
            .position(|s| &s.id == id)
            .and_then(|i| ws.iter().nth(i).map(|s| s.display_name(i)))
            .unwrap_or_else(|| id.to_string())
    }

    fn apply_outcome(&mut self, outcome: MoveOutcome) {
        tracing::debug!(?outcome, "Drop resolved");
        match &outcome {
            MoveOutcome::Conflict(conflict) => {
                let current = self
                    .session
                    .working_set()
                    .get(&conflict.target_stage)
                    .map(|s| s.description.clone())
                    .unwrap_or_default();
                let label = self.stage_label(&conflict.target_stage);
                self.conflict_dialog.show(
                    conflict,
                    &label,
                    &current,
                    &self.session.options().append_separator,
                );
            }
            MoveOutcome::Reordered { .. } => self.view.set_status("Reordered"),
            MoveOutcome::DescriptionMoved { to, .. } => {
                let label = self.stage_label(to);
                self.view.set_status(format!("Description moved to {}", label));
            }
            MoveOutcome::SubStepMoved { to, .. } => {
                let label = self.stage_label(to);
                self.view.set_status(format!("Sub-step moved to {}", label));
            }
            MoveOutcome::Ignored(reason) => self.view.set_status(ignore_message(reason)),
        }
        self.view.clamp(self.session.working_set());
    }

    #[cfg(test)]
    fn press(&mut self, keys: &[KeyCode]) {
        for key in keys {
            self.handle_key(*key);
        }
    }
}

fn ignore_message(reason: &IgnoreReason) -> String {
    match reason {
        IgnoreReason::NoTarget => "Dropped outside any stage".to_string(),
        IgnoreReason::KindMismatch => "That item can't be dropped there".to_string(),
        IgnoreReason::SameStage => "Already on this stage".to_string(),
        IgnoreReason::UnknownStage(id) => format!("Stage '{}' no longer exists", id),
        IgnoreReason::StalePayload => "Item changed while it was being moved".to_string(),
        IgnoreReason::NoPendingConflict => "No conflict to resolve".to_string(),
        IgnoreReason::Blocked => "Finish the open dialog first".to_string(),
    }
}
