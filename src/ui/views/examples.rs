use crate::api::{ApiError, Example, ExampleDraft};
use crate::query::QueryStatus;
use crate::ui::components::{ExampleForm, FormEvent, KeyResult};
use crate::ui::renderfns::{format_date, format_value, truncate};
use crate::ui::StatusMessage;
use crate::viewmodel::{ExampleViewModel, PendingCreate};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

/// What the view asks the app to do after a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
  None,
  Quit,
}

/// List of examples with a detail panel and a creation form
pub struct ExampleView {
  vm: ExampleViewModel,
  list_state: ListState,
  form: ExampleForm,
  /// Creates started from the form, watched for their outcome
  pending: Vec<PendingCreate>,
  status: Option<StatusMessage>,
}

impl ExampleView {
  pub fn new(vm: ExampleViewModel) -> Self {
    Self {
      vm,
      list_state: ListState::default(),
      form: ExampleForm::new(),
      pending: Vec::new(),
      status: None,
    }
  }

  /// Seed from the store and start loading
  pub fn activate(&mut self) {
    self.vm.activate();
  }

  pub fn refresh(&mut self) {
    self.vm.refresh();
    self.set_status(StatusMessage::info("Refreshing..."));
  }

  pub fn open_form(&mut self) {
    self.form.show();
  }

  /// Whether keys are going into the form's text fields
  pub fn is_editing(&self) -> bool {
    self.form.is_active()
  }

  pub fn status(&self) -> Option<&StatusMessage> {
    self.status.as_ref()
  }

  pub fn set_status(&mut self, status: StatusMessage) {
    self.status = Some(status);
  }

  /// Apply async results and expire old messages.
  ///
  /// Returns `true` if anything visible changed.
  pub fn tick(&mut self) -> bool {
    let mut changed = self.vm.poll();
    self.form.set_submitting(self.vm.is_creating());

    let mut messages = Vec::new();
    self.pending.retain_mut(|pending| match pending.try_outcome() {
      Some(Ok(example)) => {
        messages.push(StatusMessage::info(format!("Created '{}'", example.name)));
        false
      }
      Some(Err(e)) => {
        messages.push(StatusMessage::error(format!("Create failed: {}", e)));
        false
      }
      None => true,
    });
    if let Some(last) = messages.pop() {
      self.status = Some(last);
      changed = true;
    }

    if self.status.as_ref().is_some_and(StatusMessage::is_expired) {
      self.status = None;
      changed = true;
    }

    changed
  }

  fn submit(&mut self, draft: ExampleDraft) {
    match self.vm.create_example(draft) {
      Ok(pending) => {
        self.pending.push(pending);
        self.form.reset();
        self.form.set_submitting(true);
      }
      Err(ApiError::Validation(invalid)) => self.form.set_violations(invalid.violations()),
      Err(e) => self.form.set_error(e.to_string()),
    }
  }

  fn selected_in_list(&self) -> Option<Example> {
    let idx = self.list_state.selected()?;
    self.vm.examples().get(idx).cloned()
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submitted(draft)) => {
        self.submit(draft);
        return ViewAction::None;
      }
      KeyResult::Event(FormEvent::Cancelled) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Enter => {
        let picked = self.selected_in_list();
        self.vm.select_example(picked);
      }
      KeyCode::Esc => self.vm.select_example(None),
      KeyCode::Char('n') => self.open_form(),
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Char('q') => return ViewAction::Quit,
      _ => {}
    }
    ViewAction::None
  }

  pub fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
      .split(area);

    self.render_list(frame, chunks[0]);
    self.render_detail(frame, chunks[1]);
    self.form.render_overlay(frame, area);
  }

  fn list_title(&self) -> String {
    let count = self.vm.examples().len();
    let mut title = format!(" Examples ({}) ", count);
    match self.vm.list_status() {
      QueryStatus::Fetching => title.push_str("(loading...) "),
      QueryStatus::Failure => {
        if let Some(e) = self.vm.error() {
          title.push_str(&format!("(error: {}) ", truncate(&e.to_string(), 40)));
        }
      }
      QueryStatus::Idle | QueryStatus::Success => {}
    }
    if self.vm.is_creating() {
      title.push_str("(creating...) ");
    }
    title
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.vm.examples().len();
    match self.list_state.selected() {
      Some(idx) if idx >= len => self.list_state.select(len.checked_sub(1)),
      None if len > 0 => self.list_state.select(Some(0)),
      _ => {}
    }

    let border_color = if self.vm.error().is_some() {
      Color::Red
    } else {
      Color::Blue
    };
    let block = Block::default()
      .title(self.list_title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border_color));

    if len == 0 {
      let content = if self.vm.is_loading() {
        "Loading...".to_string()
      } else if let Some(e) = self.vm.error() {
        match e.status() {
          Some(status) => format!("Failed to load examples (HTTP {}). Press 'r' to retry.", status),
          None => "Failed to load examples. Press 'r' to retry.".to_string(),
        }
      } else {
        "No examples yet. Press 'n' to add one.".to_string()
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let selected_id = self.vm.selected_example().map(|e| e.id);

    let examples = self.vm.examples();
    let items: Vec<ListItem> = examples
      .iter()
      .map(|example| {
        let marker = if selected_id.as_deref() == Some(example.id.as_str()) {
          Span::styled("* ", Style::default().fg(Color::Yellow))
        } else {
          Span::raw("  ")
        };
        let line = Line::from(vec![
          marker,
          Span::styled(
            format!("{:<24}", truncate(&example.name, 24)),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:>10}", format_value(example.value)),
            Style::default().fg(Color::White),
          ),
          Span::raw("  "),
          Span::styled(
            format_date(&example.created_at),
            Style::default().fg(Color::DarkGray),
          ),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_detail(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Selected ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(example) = self.vm.selected_example() else {
      let paragraph = Paragraph::new("Nothing selected. Press Enter on an example.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    };

    let label = |s: &'static str| Span::styled(format!("{:<9}", s), Style::default().fg(Color::DarkGray));
    let lines = vec![
      Line::from(vec![label("Name"), Span::styled(example.name.clone(), Style::default().bold())]),
      Line::from(vec![label("Value"), Span::raw(format_value(example.value))]),
      Line::from(vec![label("Created"), Span::raw(format_date(&example.created_at))]),
      Line::from(vec![label("Id"), Span::styled(example.id.clone(), Style::default().fg(Color::DarkGray))]),
    ];

    let paragraph = Paragraph::new(lines)
      .block(block)
      .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }
}
