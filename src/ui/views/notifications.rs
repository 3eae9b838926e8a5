use crate::api::types::{Notification, NotificationStats};
use crate::query::{Mutation, Query};
use crate::resources::notifications::{Generator, NotificationFilters};
use crate::resources::Gym;
use crate::ui::components::{Choice, Confirm, KeyResult, Picker, PickerEvent};
use crate::ui::renderfns::utils::truncate;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{short_date, ListPanel};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row};
use serde_json::Value;

/// Inbox of server-generated notifications
pub struct NotificationsView {
  list: ListPanel<Notification>,
  stats: Query<NotificationStats>,
  confirm: Confirm<String>,
  generator_picker: Picker,
  mark_read: Mutation<String, Value>,
  mark_all_read: Mutation<(), Value>,
  delete: Mutation<String, Value>,
  generate: Mutation<Generator, Value>,
}

fn generator_choices() -> Vec<Choice> {
  Generator::ALL
    .iter()
    .enumerate()
    .map(|(i, g)| Choice::new(i.to_string(), g.label()))
    .collect()
}

fn row_style(n: &Notification) -> Style {
  let style = if n.kind.is_urgent() {
    Style::default().fg(Color::Red)
  } else {
    Style::default()
  };
  if n.is_read {
    style.add_modifier(Modifier::DIM)
  } else {
    style.add_modifier(Modifier::BOLD)
  }
}

impl NotificationsView {
  pub fn new(gym: Gym) -> Self {
    let mut stats = gym.notification_stats();
    stats.fetch();

    Self {
      list: ListPanel::new("Notificações", gym.notifications(NotificationFilters::default())),
      stats,
      confirm: Confirm::new(),
      generator_picker: Picker::new(),
      mark_read: gym.mark_notification_read(),
      mark_all_read: gym.mark_all_notifications_read(),
      delete: gym.delete_notification(),
      generate: gym.generate_notifications(),
    }
  }

  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.generator_picker.handle_key(key) {
      KeyResult::Event(PickerEvent::Selected(value)) => {
        let generator = value.parse::<usize>().ok().and_then(|i| Generator::ALL.get(i));
        if let Some(generator) = generator {
          self.generate.mutate(*generator);
        }
        return Some(ViewAction::None);
      }
      KeyResult::Event(PickerEvent::Cancelled) | KeyResult::Handled => {
        return Some(ViewAction::None)
      }
      KeyResult::NotHandled => {}
    }

    match self.confirm.handle_key(key) {
      KeyResult::Event(id) => {
        self.delete.mutate(id);
        Some(ViewAction::None)
      }
      KeyResult::Handled => Some(ViewAction::None),
      KeyResult::NotHandled => None,
    }
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('m') | KeyCode::Enter => {
        let notification = self.list.selected()?;
        if !notification.is_read {
          let id = notification.id.clone();
          self.mark_read.mutate(id);
        }
        Some(ViewAction::None)
      }
      KeyCode::Char('M') => {
        self.mark_all_read.mutate(());
        Some(ViewAction::None)
      }
      KeyCode::Char('d') => {
        let notification = self.list.selected()?;
        let question = format!("Excluir a notificação \"{}\"?", notification.title);
        let id = notification.id.clone();
        self.confirm.ask(question, id);
        Some(ViewAction::None)
      }
      KeyCode::Char('g') if !self.generate.is_pending() => {
        self
          .generator_picker
          .show("Gerar notificações", generator_choices());
        Some(ViewAction::None)
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }

  fn render_stats(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Resumo ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let line = match self.stats.data() {
      Some(stats) => Line::from(vec![
        Span::styled("Total: ", Style::default().fg(Color::DarkGray)),
        Span::raw(stats.total.to_string()),
        Span::raw("   "),
        Span::styled("Não lidas: ", Style::default().fg(Color::DarkGray)),
        Span::styled(stats.unread.to_string(), Style::default().fg(Color::Yellow).bold()),
        Span::raw("   "),
        Span::styled("Urgentes: ", Style::default().fg(Color::DarkGray)),
        Span::styled(stats.urgent.to_string(), Style::default().fg(Color::Red).bold()),
      ]),
      None => Line::styled("Carregando...", Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(Paragraph::new(line).block(block), area);
  }
}

impl View for NotificationsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    // 'g' generates here, so jump-to-top is left to Home
    if key.code == KeyCode::Char('g') && !self.is_capturing_input() {
      return self.handle_actions(key).unwrap_or(ViewAction::None);
    }
    if key.code == KeyCode::Char('r') && !self.is_capturing_input() {
      self.stats.refetch();
    }
    self
      .handle_overlays(key)
      .or_else(|| self.list.handle_key(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(3), Constraint::Min(3)])
      .split(area);

    self.render_stats(frame, chunks[0]);
    self.list.render(
      frame,
      chunks[1],
      &["", "Data", "Tipo", "Título", "Mensagem"],
      &[
        Constraint::Length(1),
        Constraint::Length(11),
        Constraint::Length(16),
        Constraint::Fill(1),
        Constraint::Fill(2),
      ],
      |n| {
        let marker = if n.is_read { " " } else { "●" };
        Row::new(vec![
          Cell::from(marker),
          Cell::from(short_date(&n.created_at)),
          Cell::from(n.kind.label()),
          Cell::from(truncate(&n.title, 40)),
          Cell::from(truncate(&n.message, 80)),
        ])
        .style(row_style(n))
      },
    );
    self.generator_picker.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Notificações".to_string()
  }

  fn tick(&mut self) {
    self.list.tick();
    self.stats.poll();
    // Outcomes are toasted by the mutations
    let _ = self.mark_read.poll();
    let _ = self.mark_all_read.poll();
    let _ = self.delete.poll();
    let _ = self.generate.poll();
  }

  fn is_capturing_input(&self) -> bool {
    self.generator_picker.is_active() || self.confirm.is_active() || self.list.is_searching()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("m", "marcar lida").with_priority(10),
      ShortcutInfo::new("M", "marcar todas").with_priority(20),
      ShortcutInfo::new("d", "excluir").with_priority(30),
      ShortcutInfo::new("g", "gerar").with_priority(40),
      ShortcutInfo::new("s", "lidas/não lidas").with_priority(50),
      ShortcutInfo::new("q", "voltar").with_priority(60),
    ]
  }
}
