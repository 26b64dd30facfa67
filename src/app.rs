use crate::api::ApiClient;
use crate::commands::{CommandKind, ParsedCommand};
use crate::config::Config;
use crate::credentials::Credentials;
use crate::event::{Event, EventHandler};
use crate::store::ExampleStore;
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::views::{ExampleView, ViewAction};
use crate::ui::StatusMessage;
use crate::viewmodel::ExampleViewModel;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::info;

/// Main application state
pub struct App {
  title: String,
  credentials: Credentials,
  view: ExampleView,
  command: CommandInput,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, credentials: Credentials) -> Result<Self> {
    let api = ApiClient::new(&config.api, credentials.clone())?;
    info!(base_url = %api.base_url(), "connecting to examples API");

    // One store per session, shared by everything that needs it
    let store = ExampleStore::new();
    let vm = ExampleViewModel::new(api, store);

    Ok(Self {
      title: config.display_title(),
      credentials,
      view: ExampleView::new(vm),
      command: CommandInput::new(),
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Restore the terminal even if the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(100));
    self.view.activate();

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => {
          self.view.tick();
        }
        Some(Event::Resize) => {}
        None => break,
      }
    }

    Ok(())
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // The form owns ':' while it is open
    let routed = if self.view.is_editing() && !self.command.is_active() {
      KeyResult::NotHandled
    } else {
      self.command.handle_key(key)
    };

    match routed {
      KeyResult::Event(CommandEvent::Submitted(cmd)) => {
        self.execute_command(cmd);
        return;
      }
      KeyResult::Event(CommandEvent::Rejected(e)) => {
        self.view.set_status(StatusMessage::error(e.to_string()));
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    if self.view.handle_key(key) == ViewAction::Quit {
      self.should_quit = true;
    }
  }

  fn execute_command(&mut self, cmd: ParsedCommand) {
    match cmd.kind {
      CommandKind::Refresh => self.view.refresh(),
      CommandKind::New => self.view.open_form(),
      CommandKind::Login => {
        self.credentials.set_token(cmd.argument);
        info!("bearer token set");
        self
          .view
          .set_status(StatusMessage::info("Token set for subsequent requests"));
      }
      CommandKind::Logout => {
        self.credentials.clear();
        info!("bearer token cleared");
        self
          .view
          .set_status(StatusMessage::info("Token cleared; requests are anonymous"));
      }
      CommandKind::Quit => self.should_quit = true,
    }
  }

  // Accessors for UI rendering
  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn is_authenticated(&self) -> bool {
    self.credentials.is_authenticated()
  }

  pub fn view_mut(&mut self) -> &mut ExampleView {
    &mut self.view
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command
  }

  pub fn status(&self) -> Option<&StatusMessage> {
    self.view.status()
  }
}
