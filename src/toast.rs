//! Transient status messages shown at the bottom of the screen.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

/// How long a toast stays on screen
pub const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
  Success,
  Error,
  Info,
}

#[derive(Debug, Clone)]
pub struct Toast {
  pub level: ToastLevel,
  pub message: String,
  pub created: Instant,
}

/// Sending half, handed to mutations. Cheap to clone.
#[derive(Clone)]
pub struct Toasts {
  tx: mpsc::UnboundedSender<Toast>,
}

impl Toasts {
  pub fn channel() -> (Self, ToastQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
      Self { tx },
      ToastQueue {
        rx,
        visible: VecDeque::new(),
      },
    )
  }

  pub fn push(&self, level: ToastLevel, message: impl Into<String>) {
    // The queue is gone only while shutting down
    let _ = self.tx.send(Toast {
      level,
      message: message.into(),
      created: Instant::now(),
    });
  }

  pub fn success(&self, message: impl Into<String>) {
    self.push(ToastLevel::Success, message);
  }

  pub fn error(&self, message: impl Into<String>) {
    self.push(ToastLevel::Error, message);
  }

  pub fn info(&self, message: impl Into<String>) {
    self.push(ToastLevel::Info, message);
  }
}

/// Receiving half, owned by the app.
pub struct ToastQueue {
  rx: mpsc::UnboundedReceiver<Toast>,
  visible: VecDeque<Toast>,
}

impl ToastQueue {
  /// Pull new toasts and expire old ones. Returns true if anything changed.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;
    while let Ok(toast) = self.rx.try_recv() {
      self.visible.push_back(toast);
      changed = true;
    }

    let before = self.visible.len();
    self.visible.retain(|t| t.created.elapsed() < TOAST_TTL);
    changed || before != self.visible.len()
  }

  /// Most recent toast still on screen
  pub fn current(&self) -> Option<&Toast> {
    self.visible.back()
  }

  /// Drain everything received so far (tests and logging)
  pub fn drain(&mut self) -> Vec<Toast> {
    self.poll();
    self.visible.drain(..).collect()
  }
}
