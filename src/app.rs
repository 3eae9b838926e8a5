use crate::auth::{AuthGate, GateDecision};
use crate::commands::{self, CommandAction};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::resources::Gym;
use crate::toast::{Toast, ToastQueue};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{LoginView, Route, Screen};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{debug, info};

/// Main application state
pub struct App {
  gym: Gym,

  /// Checked before every protected route is built
  gate: AuthGate,

  toasts: ToastQueue,

  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// `:` prompt
  command_input: CommandInput,

  title: String,

  tick_rate: Duration,

  should_quit: bool,
}

impl App {
  pub fn new(gym: Gym, toasts: ToastQueue, config: &Config, initial: Route) -> Self {
    let gate = AuthGate::new(gym.credentials().clone());
    let mut app = Self {
      gym,
      gate,
      toasts,
      view_stack: Vec::new(),
      command_input: CommandInput::new(),
      title: config.title().to_string(),
      tick_rate: config.tick_rate(),
      should_quit: false,
    };
    app.open(initial, true);
    app
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(self.tick_rate);
    let result = self.main_loop(&mut terminal, &mut events).await;

    // Cleanup terminal, even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn main_loop<B: Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        None => break,
      }
    }
    Ok(())
  }

  /// Poll every view, run navigation they asked for, expire toasts and
  /// drop cache entries nobody has looked at for a while.
  pub fn tick(&mut self) {
    for view in self.view_stack.iter_mut() {
      view.tick();
    }
    let action = match self.view_stack.last_mut() {
      Some(view) => view.take_action(),
      None => ViewAction::None,
    };
    self.execute(action);

    self.toasts.poll();
    self.gym.queries.collect_garbage();
  }

  pub fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let capturing = self
      .view_stack
      .last()
      .map(|v| v.is_capturing_input())
      .unwrap_or(false);

    // The prompt only opens when the view isn't taking text
    if self.command_input.is_active() || !capturing {
      match self.command_input.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(name)) => {
          self.execute_command(&name);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.execute(action);
  }

  fn execute_command(&mut self, name: &str) {
    let Some(command) = commands::find(name) else {
      debug!(command = name, "unknown command");
      self.gym.toasts.error(format!("Comando desconhecido: {}", name));
      return;
    };

    match command.action {
      CommandAction::Open(screen) => self.open(screen.into(), true),
      CommandAction::Logout => self.execute(ViewAction::Logout),
      CommandAction::Quit => self.should_quit = true,
    }
  }

  fn execute(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(route) => self.open(route, false),
      ViewAction::Replace(route) => self.open(route, true),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::Logout => {
        self.gym.logout();
        self.show_login(None, Screen::Dashboard.into());
      }
    }
  }

  /// Open `route`, or the login screen when the session doesn't allow it.
  ///
  /// The gate runs before the view is built, so a rejected route never
  /// issues a request.
  fn open(&mut self, route: Route, replace: bool) {
    match self.gate.check_now() {
      GateDecision::Allowed => {
        info!(?route, replace, "opening view");
        let view = route.build(&self.gym);
        if replace {
          self.view_stack.clear();
        }
        self.view_stack.push(view);
      }
      GateDecision::Redirect(reason) => {
        self.show_login(Some(reason.message()), route);
      }
    }
  }

  fn show_login(&mut self, message: Option<&str>, target: Route) {
    self.view_stack.clear();
    self
      .view_stack
      .push(Box::new(LoginView::new(self.gym.clone(), message, target)));
  }

  // Accessors for UI rendering
  pub fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|v| v.as_ref())
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command_input
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn backend_url(&self) -> &str {
    self.gym.api.base_url()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }

  pub fn toast(&self) -> Option<&Toast> {
    self.toasts.current()
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::auth::tests::jwt;
  use crate::resources::testing;
  use ratatui::backend::TestBackend;
  use serde_json::json;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_command(app: &mut App, name: &str) {
    app.handle_key(key(KeyCode::Char(':')));
    for c in name.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
    app.handle_key(key(KeyCode::Enter));
  }

  fn screen_text(app: &mut App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
    terminal.draw(|frame| ui::draw(frame, app)).unwrap();
    terminal
      .backend()
      .buffer()
      .content()
      .iter()
      .map(|c| c.symbol())
      .collect()
  }

  #[tokio::test]
  async fn test_expired_session_goes_to_login_without_requests() {
    let mut server = mockito::Server::new_async().await;
    let any = server
      .mock("GET", mockito::Matcher::Any)
      .expect(0)
      .create_async()
      .await;

    let (gym, toasts) = testing::gym(&server.url());
    gym.credentials().set_token(&jwt(r#"{"id":"u1","exp":1}"#));
    let mut app = App::new(gym, toasts, &Config::default(), Screen::Students.into());

    assert_eq!(app.breadcrumb(), vec!["Login".to_string()]);
    assert!(screen_text(&mut app).contains("Sessão expirada"));
    tokio::time::sleep(Duration::from_millis(50)).await;
    any.assert_async().await;
  }

  #[tokio::test]
  async fn test_commands_switch_screens_and_logout() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/students")
      .with_body(json!({"students": []}).to_string())
      .create_async()
      .await;

    let (gym, toasts) = testing::gym(&server.url());
    let creds = gym.credentials().clone();
    creds.set_token(&jwt(r#"{"id":"u1"}"#));
    let mut app = App::new(gym, toasts, &Config::default(), Screen::Dashboard.into());
    assert_eq!(app.breadcrumb(), vec!["Painel".to_string()]);

    type_command(&mut app, "alunos");
    assert_eq!(app.breadcrumb(), vec!["Alunos".to_string()]);

    type_command(&mut app, "logout");
    assert_eq!(app.breadcrumb(), vec!["Login".to_string()]);
    assert!(creds.token().is_none());
  }

  #[tokio::test]
  async fn test_pop_at_root_quits() {
    let (gym, toasts) = testing::gym("http://localhost:1");
    gym.credentials().clear();
    let mut app = App::new(gym, toasts, &Config::default(), Screen::Dashboard.into());

    // Esc on the login form leaves the app
    app.handle_key(key(KeyCode::Esc));
    assert!(app.should_quit());
  }

  #[tokio::test]
  async fn test_ctrl_c_quits_from_any_view() {
    let (gym, toasts) = testing::gym("http://localhost:1");
    gym.credentials().clear();
    let mut app = App::new(gym, toasts, &Config::default(), Screen::Dashboard.into());

    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit());
  }

  #[tokio::test]
  async fn test_colon_is_text_while_the_login_form_is_open() {
    let (gym, toasts) = testing::gym("http://localhost:1");
    gym.credentials().clear();
    let mut app = App::new(gym, toasts, &Config::default(), Screen::Dashboard.into());

    app.handle_key(key(KeyCode::Char(':')));
    assert!(!app.command_input().is_active());
    assert!(screen_text(&mut app).contains("Faça login para continuar"));
  }
}
