use crate::api::types::{DashboardOverview, RecentActivity, UpcomingPayment};
use crate::query::Query;
use crate::resources::dashboard::PANEL_LIMIT;
use crate::resources::Gym;
use crate::ui::renderfns::utils::truncate;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{money, short_date, Screen};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

/// Landing screen: headline numbers, recent activity, payments coming due
pub struct DashboardView {
  overview: Query<DashboardOverview>,
  activities: Query<Vec<RecentActivity>>,
  upcoming: Query<Vec<UpcomingPayment>>,
}

fn card(frame: &mut Frame, area: Rect, title: &str, value: String, detail: String, color: Color) {
  let block = Block::default()
    .title(format!(" {} ", title))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));
  let lines = vec![
    Line::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
    Line::styled(detail, Style::default().fg(Color::DarkGray)),
  ];
  frame.render_widget(Paragraph::new(lines).block(block).alignment(Alignment::Center), area);
}

/// Placeholder text for a panel that has no rows to show
fn panel_message<T: Send + Sync + 'static>(
  query: &Query<Vec<T>>,
  fallback: &str,
  empty: &str,
) -> Option<String> {
  if query.is_loading() {
    return Some("Carregando...".to_string());
  }
  match (query.data(), query.error()) {
    (Some(rows), _) if !rows.is_empty() => None,
    (None, Some(error)) => Some(error.user_message(fallback)),
    _ => Some(empty.to_string()),
  }
}

impl DashboardView {
  pub fn new(gym: Gym) -> Self {
    let mut overview = gym.dashboard_overview();
    let mut activities = gym.recent_activities(PANEL_LIMIT);
    let mut upcoming = gym.upcoming_payments(PANEL_LIMIT);
    overview.fetch();
    activities.fetch();
    upcoming.fetch();

    Self {
      overview,
      activities,
      upcoming,
    }
  }

  fn render_cards(&self, frame: &mut Frame, area: Rect) {
    let cards = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Ratio(1, 4); 4])
      .split(area);

    let Some(overview) = self.overview.data() else {
      let text = match self.overview.error() {
        Some(error) => error.user_message("Erro ao carregar painel"),
        None => "Carregando...".to_string(),
      };
      frame.render_widget(
        Paragraph::new(text)
          .block(Block::default().borders(Borders::ALL).title(" Visão geral "))
          .style(Style::default().fg(Color::DarkGray)),
        area,
      );
      return;
    };

    card(
      frame,
      cards[0],
      "Alunos",
      overview.students.total.to_string(),
      format!("{} ativos", overview.students.active),
      Color::Cyan,
    );
    card(
      frame,
      cards[1],
      "Receita",
      money(overview.revenue.total),
      "recebido no período".to_string(),
      Color::Green,
    );
    card(
      frame,
      cards[2],
      "Agendamentos",
      overview.appointments.this_week.to_string(),
      "nesta semana".to_string(),
      Color::Yellow,
    );
    card(
      frame,
      cards[3],
      "Aulas por aluno",
      format!("{:.1}", overview.classes_per_student()),
      "média semanal".to_string(),
      Color::Magenta,
    );
  }

  fn render_activities(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Atividades recentes ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if let Some(text) = panel_message(
      &self.activities,
      "Erro ao carregar atividades",
      "Nenhuma atividade recente",
    ) {
      frame.render_widget(Paragraph::new(text).block(block), area);
      return;
    }

    let items: Vec<ListItem> = self
      .activities
      .data()
      .map(|list| list.as_slice())
      .unwrap_or(&[])
      .iter()
      .map(|a| {
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{} ", short_date(&a.created_at)),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw(truncate(&a.description, 60)),
          Span::styled(format!(" [{}]", a.status), Style::default().fg(Color::Cyan)),
        ]))
      })
      .collect();
    frame.render_widget(List::new(items).block(block), area);
  }

  fn render_upcoming(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Próximos vencimentos ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if let Some(text) = panel_message(
      &self.upcoming,
      "Erro ao carregar vencimentos",
      "Nenhum vencimento próximo",
    ) {
      frame.render_widget(Paragraph::new(text).block(block), area);
      return;
    }

    let items: Vec<ListItem> = self
      .upcoming
      .data()
      .map(|list| list.as_slice())
      .unwrap_or(&[])
      .iter()
      .map(|p| {
        ListItem::new(Line::from(vec![
          Span::raw(truncate(&p.student, 30)),
          Span::raw("  "),
          Span::styled(money(p.amount), Style::default().fg(Color::Green)),
          Span::styled(format!("  {}", p.due_date_text), Style::default().fg(Color::Yellow)),
        ]))
      })
      .collect();
    frame.render_widget(List::new(items).block(block), area);
  }
}

impl View for DashboardView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => {
        self.overview.refetch();
        self.activities.refetch();
        self.upcoming.refetch();
        ViewAction::None
      }
      KeyCode::Char('a') => ViewAction::Push(Screen::Students.into()),
      KeyCode::Char('p') => ViewAction::Push(Screen::Payments.into()),
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let rows = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(4), Constraint::Min(5)])
      .split(area);
    let panels = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
      .split(rows[1]);

    self.render_cards(frame, rows[0]);
    self.render_activities(frame, panels[0]);
    self.render_upcoming(frame, panels[1]);
  }

  fn breadcrumb_label(&self) -> String {
    "Painel".to_string()
  }

  fn tick(&mut self) {
    self.overview.poll();
    self.activities.poll();
    self.upcoming.poll();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("a", "alunos").with_priority(10),
      ShortcutInfo::new("p", "pagamentos").with_priority(20),
      ShortcutInfo::new("r", "atualizar").with_priority(30),
      ShortcutInfo::new(":", "comando").with_priority(40),
      ShortcutInfo::new("q", "sair").with_priority(50),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::testing;
  use ratatui::backend::TestBackend;
  use serde_json::json;
  use std::time::Duration;

  #[tokio::test]
  async fn test_panel_message_for_unfetched_panel() {
    let (gym, _toasts) = testing::gym("http://localhost:1");
    let activities = gym.recent_activities(PANEL_LIMIT);
    assert_eq!(
      panel_message(&activities, "Erro", "Nenhuma atividade recente"),
      Some("Nenhuma atividade recente".to_string())
    );
  }

  #[tokio::test]
  async fn test_renders_cards_and_panels() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/dashboard/overview")
      .with_body(
        json!({"students": {"total": 40, "active": 20}, "revenue": {"total": 1500.0}, "appointments": {"thisWeek": 30}})
          .to_string(),
      )
      .create_async()
      .await;
    server
      .mock("GET", "/dashboard/recent-activities")
      .match_query(mockito::Matcher::UrlEncoded("limit".into(), "5".into()))
      .with_body("[]")
      .create_async()
      .await;
    server
      .mock("GET", "/dashboard/upcoming-payments")
      .match_query(mockito::Matcher::Any)
      .with_body(json!([{"student": "Ana", "amount": 150.0, "dueDateText": "amanhã"}]).to_string())
      .create_async()
      .await;

    let (gym, _toasts) = testing::gym(&server.url());
    let mut view = DashboardView::new(gym);
    for _ in 0..100 {
      view.tick();
      if view.overview.data().is_some() && view.activities.data().is_some() && view.upcoming.data().is_some() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let mut terminal = Terminal::new(TestBackend::new(120, 14)).unwrap();
    terminal.draw(|frame| view.render(frame, frame.area())).unwrap();
    let text: String = terminal
      .backend()
      .buffer()
      .content()
      .iter()
      .map(|c| c.symbol())
      .collect();
    assert!(text.contains("R$ 1.500,00"));
    assert!(text.contains("1.5"));
    assert!(text.contains("Nenhuma atividade recente"));
    assert!(text.contains("amanhã"));
  }
}
