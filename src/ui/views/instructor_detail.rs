use crate::api::types::{Instructor, InstructorStats};
use crate::query::Query;
use crate::resources::Gym;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::short_date;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

/// One instructor and their workload counters
pub struct InstructorDetailView {
  id: String,
  instructor: Query<Instructor>,
  stats: Query<InstructorStats>,
}

impl InstructorDetailView {
  pub fn new(gym: Gym, id: &str) -> Self {
    let mut instructor = gym.instructor(id);
    let mut stats = gym.instructor_stats(id);
    instructor.fetch();
    stats.fetch();

    Self {
      id: id.to_string(),
      instructor,
      stats,
    }
  }

  fn render_info(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Instrutor ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let lines = match (self.instructor.data(), self.instructor.error()) {
      (Some(i), _) => vec![
        Line::from(Span::styled(i.name.clone(), Style::default().bold())),
        Line::raw(""),
        Line::from(vec![
          Span::styled("Email: ", Style::default().fg(Color::DarkGray)),
          Span::raw(i.email.clone()),
        ]),
        Line::from(vec![
          Span::styled("Função: ", Style::default().fg(Color::DarkGray)),
          Span::raw(i.role.label()),
        ]),
        Line::from(vec![
          Span::styled("Desde: ", Style::default().fg(Color::DarkGray)),
          Span::raw(i.created_at.as_deref().map(short_date).unwrap_or_else(|| "-".to_string())),
        ]),
      ],
      (None, Some(error)) => vec![
        Line::styled(
          error.user_message("Erro ao carregar instrutor"),
          Style::default().fg(Color::Red),
        ),
        Line::raw(""),
        Line::raw("Pressione 'r' para tentar novamente."),
      ],
      (None, None) => vec![Line::styled("Carregando...", Style::default().fg(Color::DarkGray))],
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn render_stats(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Estatísticas ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(stats) = self.stats.data() else {
      let text = match self.stats.error() {
        Some(error) => error.user_message("Erro ao carregar estatísticas"),
        None => "Carregando...".to_string(),
      };
      frame.render_widget(
        Paragraph::new(text)
          .block(block)
          .style(Style::default().fg(Color::DarkGray)),
        area,
      );
      return;
    };

    let entry = |label: &str, value: u64, color: Color| {
      ListItem::new(Line::from(vec![
        Span::styled(format!("{:<28}", label), Style::default().fg(Color::Gray)),
        Span::styled(value.to_string(), Style::default().fg(color).bold()),
      ]))
    };

    let overdue_color = if stats.overdue_payments > 0 {
      Color::Red
    } else {
      Color::Green
    };
    let items = vec![
      entry("Alunos", stats.students_count, Color::Cyan),
      entry("Agendamentos", stats.appointments_count, Color::Cyan),
      entry("Planos de treino", stats.workout_plans_count, Color::Cyan),
      entry("Alunos com pagamento em dia", stats.students_with_active_payments, Color::Green),
      entry("Pagamentos em atraso", stats.overdue_payments, overdue_color),
    ];

    frame.render_widget(List::new(items).block(block), area);
  }
}

impl View for InstructorDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => {
        self.instructor.refetch();
        self.stats.refetch();
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
      .split(area);

    self.render_info(frame, chunks[0]);
    self.render_stats(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    self
      .instructor
      .data()
      .map(|i| i.name.clone())
      .unwrap_or_else(|| self.id.clone())
  }

  fn tick(&mut self) {
    self.instructor.poll();
    self.stats.poll();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![ShortcutInfo::new("r", "atualizar"), ShortcutInfo::new("q", "voltar")]
  }
}
