use crossterm::event::KeyEvent;
use ratatui::prelude::*;

use super::views::Route;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Actions that a view can request in response to user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
  /// No action needed
  None,
  /// Open a route on top of the stack
  Push(Route),
  /// Replace the whole stack with a route
  Replace(Route),
  /// Pop current view from stack (go back)
  Pop,
  /// Drop the session and return to the login screen
  Logout,
}

/// Trait for view behavior
///
/// Views handle their own input modes (search, forms, dialogs) and return
/// actions for the App to execute. This creates a clean delegation chain:
/// App → View → Components
///
/// Views that load data asynchronously should use Query<T> internally and
/// poll it in the tick() method. Routes are checked against the session
/// before their view is built, so constructors may fetch right away.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to allow views to poll async queries
  fn tick(&mut self) {}

  /// Navigation requested by background work (a finished login), taken once
  fn take_action(&mut self) -> ViewAction {
    ViewAction::None
  }

  /// True while a search box, form or dialog owns the keyboard, so `:`
  /// and `q` go to the view instead of the app
  fn is_capturing_input(&self) -> bool {
    false
  }

  /// Get keyboard shortcuts to display in the header
  /// Override this to provide view-specific shortcuts
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "comando").with_priority(10),
      ShortcutInfo::new("/", "buscar").with_priority(20),
      ShortcutInfo::new("q", "voltar").with_priority(30),
    ]
  }
}
