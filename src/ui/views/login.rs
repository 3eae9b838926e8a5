use crate::api::types::{Credentials, LoginResponse};
use crate::query::Mutation;
use crate::resources::Gym;
use crate::ui::components::{Field, Form, FormEvent, KeyResult};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::Route;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use tracing::info;

/// Email/password sign-in; on success the stack is replaced by `target`
pub struct LoginView {
  form: Form,
  message: Option<String>,
  target: Route,
  login: Mutation<Credentials, LoginResponse>,
  done: bool,
}

fn login_fields() -> Vec<Field> {
  vec![Field::text("email", "Email"), Field::secret("password", "Senha")]
}

impl LoginView {
  pub fn new(gym: Gym, message: Option<&str>, target: Route) -> Self {
    let mut form = Form::new();
    form.open("Entrar", login_fields());
    Self {
      form,
      message: message.map(str::to_string),
      target,
      login: gym.login(),
      done: false,
    }
  }

  pub fn target(&self) -> &Route {
    &self.target
  }

  fn submit(&mut self) {
    let email = self.form.value("email").trim().to_string();
    let password = self.form.value("password");
    if email.is_empty() || password.is_empty() {
      self.form.fail_with("Informe email e senha");
      return;
    }
    self.form.set_busy();
    self.login.mutate(Credentials { email, password });
  }
}

impl View for LoginView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submitted) => self.submit(),
      // Esc leaves the app from here; there is nothing behind the login
      KeyResult::Event(FormEvent::Cancelled) => return ViewAction::Pop,
      KeyResult::Handled | KeyResult::NotHandled => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" GymCRM ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let mut lines = vec![
      Line::raw(""),
      Line::styled("Sistema de gestão da academia", Style::default().bold()),
    ];
    if let Some(message) = &self.message {
      lines.push(Line::raw(""));
      lines.push(Line::styled(message.clone(), Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(
      Paragraph::new(lines).block(block).alignment(Alignment::Center),
      area,
    );
    self.form.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Login".to_string()
  }

  fn tick(&mut self) {
    match self.login.poll() {
      Some(Ok(response)) => {
        info!(user = ?response.user.as_ref().map(|u| &u.email), "signed in");
        self.form.close();
        self.done = true;
      }
      Some(Err(error)) => self
        .form
        .fail_with(error.user_message("Email ou senha incorretos")),
      None => {}
    }
  }

  fn take_action(&mut self) -> ViewAction {
    if std::mem::take(&mut self.done) {
      return ViewAction::Replace(self.target.clone());
    }
    ViewAction::None
  }

  fn is_capturing_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("tab", "próximo campo").with_priority(10),
      ShortcutInfo::new("enter", "entrar").with_priority(20),
      ShortcutInfo::new("esc", "sair").with_priority(30),
    ]
  }
}
