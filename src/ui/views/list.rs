use std::any::Any;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState};

use crate::filter::{HasStatus, ListFilter, Searchable};
use crate::query::Query;
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::view::ViewAction;

/// Table over one list query, with `/` search and `s` status cycling.
///
/// Filtering only narrows what the query already holds; it never fetches.
pub struct ListPanel<T: HasStatus> {
  title: &'static str,
  query: Query<Vec<T>>,
  state: TableState,
  search: SearchInput,
  filter: ListFilter<T::Status>,
}

impl<T> ListPanel<T>
where
  T: Searchable + HasStatus + Any + Send + Sync,
{
  /// Takes an unstarted query and starts it
  pub fn new(title: &'static str, mut query: Query<Vec<T>>) -> Self {
    query.fetch();
    Self {
      title,
      query,
      state: TableState::default(),
      search: SearchInput::new(),
      filter: ListFilter::default(),
    }
  }

  pub fn query(&self) -> &Query<Vec<T>> {
    &self.query
  }

  pub fn items(&self) -> &[T] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  /// Rows left after search and status filter, in server order
  pub fn visible(&self) -> Vec<&T> {
    self.filter.apply(self.items())
  }

  pub fn selected(&self) -> Option<&T> {
    let index = self.state.selected()?;
    self.visible().into_iter().nth(index)
  }

  pub fn filter(&self) -> &ListFilter<T::Status> {
    &self.filter
  }

  pub fn is_searching(&self) -> bool {
    self.search.is_active()
  }

  pub fn refetch(&mut self) {
    self.query.refetch();
  }

  /// Returns true if the query state changed
  pub fn tick(&mut self) -> bool {
    let changed = self.query.poll();
    if changed {
      let shown = self.visible().len();
      ensure_valid_selection(&mut self.state, shown);
    }
    changed
  }

  /// Search, filter, refresh and movement keys.
  pub fn handle_key(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.search.handle_key(key) {
      KeyResult::Handled | KeyResult::Event(SearchEvent::Submitted) => {
        return Some(ViewAction::None)
      }
      KeyResult::Event(SearchEvent::Changed(text)) => {
        self.filter.search = text;
        self.state.select(Some(0));
        return Some(ViewAction::None);
      }
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('s') => {
        self.filter.cycle_status(T::STATUSES);
        self.state.select(Some(0));
        Some(ViewAction::None)
      }
      KeyCode::Char('r') => {
        self.query.refetch();
        Some(ViewAction::None)
      }
      KeyCode::Char('j') | KeyCode::Down => {
        self.state.select_next();
        Some(ViewAction::None)
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.state.select_previous();
        Some(ViewAction::None)
      }
      KeyCode::Char('g') | KeyCode::Home => {
        self.state.select_first();
        Some(ViewAction::None)
      }
      KeyCode::Char('G') | KeyCode::End => {
        self.state.select_last();
        Some(ViewAction::None)
      }
      _ => None,
    }
  }

  fn title(&self, shown: usize) -> String {
    let mut title = format!(" {} ({}/{})", self.title, shown, self.items().len());
    if let Some(status) = self.filter.status {
      title.push_str(&format!(" [{}]", T::status_label(status)));
    }
    if !self.filter.search.trim().is_empty() {
      title.push_str(&format!(" /{}", self.filter.search.trim()));
    }
    if self.query.is_fetching() {
      title.push_str(" (atualizando...)");
    }
    title.push(' ');
    title
  }

  /// Draw the table, or the loading and error placeholders.
  pub fn render<F>(&mut self, frame: &mut Frame, area: Rect, header: &[&'static str], widths: &[Constraint], row: F)
  where
    F: Fn(&T) -> Row<'static>,
  {
    let block = Block::default()
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.query.is_loading() {
      let paragraph = Paragraph::new("Carregando...")
        .block(block.title(format!(" {} ", self.title)))
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    if self.query.data().is_none() {
      let content = match self.query.error() {
        Some(error) => format!(
          "{}\n\nPressione 'r' para tentar novamente.",
          error.user_message("Erro ao carregar dados")
        ),
        None => "Nenhum dado carregado. Pressione 'r' para atualizar.".to_string(),
      };
      let paragraph = Paragraph::new(content)
        .block(block.title(format!(" {} ", self.title)))
        .style(Style::default().fg(Color::Red));
      frame.render_widget(paragraph, area);
      return;
    }

    // Collect rows first to avoid borrow conflicts with the table state
    let items = self.query.data().map(|v| v.as_slice()).unwrap_or(&[]);
    let rows: Vec<Row> = self.filter.apply(items).into_iter().map(&row).collect();
    let shown = rows.len();
    let block = block.title(self.title(shown));

    if shown == 0 {
      let content = if self.filter.is_active() {
        "Nenhum registro corresponde ao filtro."
      } else {
        "Nenhum registro encontrado."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      self.search.render_overlay(frame, area);
      return;
    }

    ensure_valid_selection(&mut self.state, shown);

    let header = Row::new(header.iter().copied())
      .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let table = Table::new(rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.state);
    self.search.render_overlay(frame, area);
  }
}
