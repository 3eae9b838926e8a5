use crate::api::types::{
  CreatePayment, OverdueCount, Payment, PaymentEnvelope, PaymentMethod, PaymentStats, PaymentStatus,
  PaymentType, Student, UpdatePayment,
};
use crate::forms::PaymentDraft;
use crate::query::{Mutation, Query};
use crate::resources::payments::{self, PaymentFilters, StatsRange};
use crate::resources::Gym;
use crate::toast::Toasts;
use crate::ui::components::{Choice, Confirm, Field, Form, FormEvent, KeyResult, Picker, PickerEvent};
use crate::ui::renderfns::utils::{payment_status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{enum_choices, money, parse_wire, short_date, student_choices, wire_name, ListPanel};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row};
use serde_json::Value;

/// Charges, their totals, and recording a payment as received
pub struct PaymentsView {
  list: ListPanel<Payment>,
  stats: Query<PaymentStats>,
  students: Query<Vec<Student>>,
  toasts: Toasts,
  form: Form,
  method_picker: Picker,
  /// Payment being marked as paid while the method picker is open
  paying: Option<String>,
  confirm: Confirm<String>,
  create: Mutation<CreatePayment, PaymentEnvelope>,
  update: Mutation<(String, UpdatePayment), Value>,
  delete: Mutation<String, Value>,
  mark_overdue: Mutation<(), OverdueCount>,
}

impl PaymentsView {
  pub fn new(gym: Gym) -> Self {
    let mut stats = gym.payment_stats(StatsRange::default());
    let mut students = gym.students();
    stats.fetch();
    students.fetch();

    Self {
      list: ListPanel::new("Pagamentos", gym.payments(PaymentFilters::default())),
      stats,
      students,
      toasts: gym.toasts.clone(),
      form: Form::new(),
      method_picker: Picker::new(),
      paying: None,
      confirm: Confirm::new(),
      create: gym.create_payment(),
      update: gym.update_payment(),
      delete: gym.delete_payment(),
      mark_overdue: gym.mark_overdue(),
    }
  }

  fn fields(&self) -> Vec<Field> {
    let mut students = student_choices(self.students.data());
    students.insert(0, Choice::new("", "(selecione)"));
    vec![
      Field::select("studentId", "Aluno", students),
      Field::text("amount", "Valor (R$)"),
      Field::text("dueDate", "Vencimento (AAAA-MM-DD)"),
      Field::text("description", "Descrição"),
      Field::select("type", "Tipo", enum_choices(&PaymentType::ALL, PaymentType::label, None))
        .with_value(&wire_name(PaymentType::Monthly)),
    ]
  }

  fn submit(&mut self) {
    let draft = PaymentDraft {
      student_id: self.form.value("studentId"),
      amount: self.form.value("amount"),
      due_date: self.form.value("dueDate"),
      description: self.form.value("description"),
      kind: parse_wire(&self.form.value("type")).unwrap_or_default(),
    };
    match draft.validate() {
      Ok(input) => {
        self.form.set_busy();
        self.create.mutate(input);
      }
      Err(error) => self.form.fail(&error),
    }
  }

  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.method_picker.handle_key(key) {
      KeyResult::Event(PickerEvent::Selected(value)) => {
        let method: Option<PaymentMethod> = parse_wire(&value);
        if let (Some(id), Some(method)) = (self.paying.take(), method) {
          self.update.mutate((id, payments::mark_paid(method)));
        }
        return Some(ViewAction::None);
      }
      KeyResult::Event(PickerEvent::Cancelled) => {
        self.paying = None;
        return Some(ViewAction::None);
      }
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::NotHandled => {}
    }

    match self.confirm.handle_key(key) {
      KeyResult::Event(id) => {
        self.delete.mutate(id);
        return Some(ViewAction::None);
      }
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::NotHandled => {}
    }

    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submitted) => self.submit(),
      KeyResult::Event(FormEvent::Cancelled) | KeyResult::Handled => {}
      KeyResult::NotHandled => return None,
    }
    Some(ViewAction::None)
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('n') => {
        let fields = self.fields();
        self.form.open("Novo pagamento", fields);
        Some(ViewAction::None)
      }
      KeyCode::Char('p') => {
        let payment = self.list.selected()?;
        if payment.status == PaymentStatus::Paid {
          self.toasts.info("Pagamento já registrado");
          return Some(ViewAction::None);
        }
        self.paying = Some(payment.id.clone());
        self.method_picker.show(
          "Forma de pagamento",
          enum_choices(&PaymentMethod::ALL, PaymentMethod::label, None),
        );
        Some(ViewAction::None)
      }
      KeyCode::Char('d') => {
        let payment = self.list.selected()?;
        let question = format!(
          "Excluir o pagamento de {} ({})?",
          payment.student.name,
          money(payment.amount)
        );
        let id = payment.id.clone();
        self.confirm.ask(question, id);
        Some(ViewAction::None)
      }
      KeyCode::Char('o') => {
        if !self.mark_overdue.is_pending() {
          self.mark_overdue.mutate(());
        }
        Some(ViewAction::None)
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }

  fn settle_mutations(&mut self) {
    match self.create.poll() {
      Some(Ok(_)) => self.form.close(),
      Some(Err(error)) => self.form.fail_with(error.user_message("Erro ao criar pagamento")),
      None => {}
    }
    if let Some(Ok(OverdueCount { count })) = self.mark_overdue.poll() {
      self
        .toasts
        .info(format!("{} pagamento(s) marcado(s) como atrasado(s)", count));
    }
    let _ = self.update.poll();
    let _ = self.delete.poll();
  }

  fn render_stats(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Resumo ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let line = match self.stats.data() {
      Some(stats) => Line::from(vec![
        Span::styled("Recebido: ", Style::default().fg(Color::DarkGray)),
        Span::styled(money(stats.revenue.total), Style::default().fg(Color::Green).bold()),
        Span::raw("   "),
        Span::styled("Pendente: ", Style::default().fg(Color::DarkGray)),
        Span::styled(money(stats.revenue.pending), Style::default().fg(Color::Yellow)),
        Span::raw("   "),
        Span::styled("Atrasado: ", Style::default().fg(Color::DarkGray)),
        Span::styled(money(stats.revenue.overdue), Style::default().fg(Color::Red)),
        Span::raw("   "),
        Span::styled(
          format!(
            "{} pagos / {} pendentes / {} atrasados",
            stats.payments.paid, stats.payments.pending, stats.payments.overdue
          ),
          Style::default().fg(Color::Gray),
        ),
      ]),
      None => match self.stats.error() {
        Some(error) => Line::styled(
          error.user_message("Erro ao carregar resumo"),
          Style::default().fg(Color::Red),
        ),
        None => Line::styled("Carregando...", Style::default().fg(Color::DarkGray)),
      },
    };

    frame.render_widget(Paragraph::new(line).block(block), area);
  }
}

impl View for PaymentsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
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
      &["Aluno", "Valor", "Vencimento", "Descrição", "Forma", "Status"],
      &[
        Constraint::Fill(2),
        Constraint::Length(14),
        Constraint::Length(11),
        Constraint::Fill(2),
        Constraint::Length(18),
        Constraint::Length(10),
      ],
      |p| {
        Row::new(vec![
          Cell::from(truncate(&p.student.name, 40)),
          Cell::from(money(p.amount)),
          Cell::from(short_date(&p.due_date)),
          Cell::from(truncate(p.description.as_deref().unwrap_or(""), 40)),
          Cell::from(p.method.map(PaymentMethod::label).unwrap_or("-")),
          Cell::from(p.status.label()).style(Style::default().fg(payment_status_color(p.status))),
        ])
      },
    );
    self.form.render_overlay(frame, area);
    self.method_picker.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Pagamentos".to_string()
  }

  fn tick(&mut self) {
    self.list.tick();
    self.stats.poll();
    self.students.poll();
    self.settle_mutations();
  }

  fn is_capturing_input(&self) -> bool {
    self.form.is_active()
      || self.method_picker.is_active()
      || self.confirm.is_active()
      || self.list.is_searching()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("n", "novo").with_priority(10),
      ShortcutInfo::new("p", "registrar pagamento").with_priority(20),
      ShortcutInfo::new("d", "excluir").with_priority(30),
      ShortcutInfo::new("o", "marcar atrasados").with_priority(40),
      ShortcutInfo::new("s", "status").with_priority(50),
      ShortcutInfo::new("/", "buscar").with_priority(60),
      ShortcutInfo::new("q", "voltar").with_priority(70),
    ]
  }
}
