use crate::api::types::{Gender, ProgressRecord, Student};
use crate::query::Query;
use crate::resources::Gym;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::utils::student_status_color;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::short_date;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};

/// Student profile with the progress history beside it
pub struct StudentDetailView {
  gym: Gym,
  id: String,
  student: Query<Student>,
  history: Query<Vec<ProgressRecord>>,
  state: TableState,
}

fn measure(value: Option<f64>, unit: &str) -> String {
  value.map(|v| format!("{:.1}{}", v, unit)).unwrap_or_else(|| "-".to_string())
}

fn gender_label(gender: Gender) -> &'static str {
  match gender {
    Gender::Male => "Masculino",
    Gender::Female => "Feminino",
    Gender::Other => "Outro",
  }
}

impl StudentDetailView {
  pub fn new(gym: Gym, id: &str) -> Self {
    let mut student = gym.student(id);
    let mut history = gym.student_history(id);

    // Start fetching immediately
    student.fetch();
    history.fetch();

    Self {
      gym,
      id: id.to_string(),
      student,
      history,
      state: TableState::default(),
    }
  }

  fn render_profile(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Perfil ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.student.is_loading() {
      let paragraph = Paragraph::new("Carregando...")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let student = match (self.student.data(), self.student.error()) {
      (Some(student), _) => student,
      (None, Some(error)) => {
        let paragraph = Paragraph::new(format!(
          "{}\n\nPressione 'r' para tentar novamente.",
          error.user_message("Erro ao carregar informações do aluno")
        ))
        .block(block)
        .style(Style::default().fg(Color::Red));
        frame.render_widget(paragraph, area);
        return;
      }
      (None, None) => return,
    };

    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::DarkGray));
    let opt = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    let lines = vec![
      Line::from(Span::styled(student.name.clone(), Style::default().bold())),
      Line::from(vec![
        label("Status: "),
        Span::styled(
          student.status.label(),
          Style::default().fg(student_status_color(student.status)),
        ),
      ]),
      Line::raw(""),
      Line::from(vec![label("Email: "), Span::raw(student.email.clone())]),
      Line::from(vec![label("Telefone: "), Span::raw(opt(&student.phone))]),
      Line::from(vec![
        label("Nascimento: "),
        Span::raw(student.date_of_birth.as_deref().map(short_date).unwrap_or_else(|| "-".to_string())),
      ]),
      Line::from(vec![
        label("Gênero: "),
        Span::raw(student.gender.map(gender_label).unwrap_or("-")),
      ]),
      Line::from(vec![label("Endereço: "), Span::raw(opt(&student.address))]),
      Line::raw(""),
      Line::from(vec![
        label("Emergência: "),
        Span::raw(format!(
          "{} {}",
          opt(&student.emergency_contact),
          student.emergency_phone.as_deref().unwrap_or("")
        )),
      ]),
      Line::from(vec![label("Restrições: "), Span::raw(opt(&student.medical_restrictions))]),
      Line::from(vec![label("Objetivos: "), Span::raw(opt(&student.objectives))]),
    ];

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
  }

  fn render_history(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Evolução ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.history.is_loading() {
      frame.render_widget(
        Paragraph::new("Carregando...")
          .block(block)
          .style(Style::default().fg(Color::DarkGray)),
        area,
      );
      return;
    }

    let records = self.history.data().map(|v| v.as_slice()).unwrap_or(&[]);
    if records.is_empty() {
      let content = match self.history.error() {
        Some(error) => error.user_message("Erro ao carregar histórico"),
        None => "Nenhum registro de evolução.".to_string(),
      };
      frame.render_widget(
        Paragraph::new(content)
          .block(block)
          .style(Style::default().fg(Color::DarkGray)),
        area,
      );
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(3), Constraint::Length(3)])
      .split(block.inner(area));
    frame.render_widget(block, area);

    let rows: Vec<Row> = records
      .iter()
      .map(|r| {
        Row::new(vec![
          Cell::from(short_date(&r.record_date)),
          Cell::from(measure(r.weight, " kg")),
          Cell::from(measure(r.body_fat, "%")),
          Cell::from(measure(r.muscle_mass, " kg")),
          Cell::from(measure(r.waist, " cm")),
          Cell::from(r.photos.len().to_string()),
        ])
      })
      .collect();
    let len = rows.len();

    // Photo links of the selected record
    ensure_valid_selection(&mut self.state, len);
    let photos: Vec<Line> = self
      .state
      .selected()
      .and_then(|i| records.get(i))
      .map(|r| {
        r.photos
          .iter()
          .filter_map(|p| {
            if p.starts_with("data:") {
              Some("(foto embutida)".to_string())
            } else {
              self.gym.api.file_url(p)
            }
          })
          .map(|url| Line::styled(url, Style::default().fg(Color::Cyan)))
          .collect()
      })
      .unwrap_or_default();

    let table = Table::new(
      rows,
      [
        Constraint::Length(11),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(6),
      ],
    )
    .header(
      Row::new(["Data", "Peso", "Gordura", "Massa magra", "Cintura", "Fotos"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
    )
    .row_highlight_style(Style::default().bg(Color::DarkGray))
    .highlight_symbol("> ");

    frame.render_stateful_widget(table, chunks[0], &mut self.state);
    frame.render_widget(Paragraph::new(photos), chunks[1]);
  }
}

impl View for StudentDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => {
        self.student.refetch();
        self.history.refetch();
        ViewAction::None
      }
      KeyCode::Char('j') | KeyCode::Down => {
        self.state.select_next();
        ViewAction::None
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.state.select_previous();
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
      .split(area);

    self.render_profile(frame, chunks[0]);
    self.render_history(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    self
      .student
      .data()
      .map(|s| s.name.clone())
      .unwrap_or_else(|| self.id.clone())
  }

  fn tick(&mut self) {
    self.student.poll();
    self.history.poll();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("j/k", "registro"),
      ShortcutInfo::new("r", "atualizar"),
      ShortcutInfo::new("q", "voltar"),
    ]
  }
}
