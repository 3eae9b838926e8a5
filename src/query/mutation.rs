//! Writes against the backend and the cache keys they make stale.

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::client::QueryClient;
use super::key::QueryKey;
use crate::api::ApiError;
use crate::toast::Toasts;

/// What a write is called, which reads it affects, and what to tell the user.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationDescriptor {
  pub name: &'static str,
  invalidates: Vec<QueryKey>,
  pub success: Option<String>,
  /// Shown when the server gives no message of its own
  pub failure: String,
}

impl MutationDescriptor {
  pub fn new(name: &'static str, failure: impl Into<String>) -> Self {
    Self {
      name,
      invalidates: Vec::new(),
      success: None,
      failure: failure.into(),
    }
  }

  /// Declare dependent keys. Duplicates are dropped so each key is
  /// invalidated once per success.
  pub fn invalidating(mut self, keys: impl IntoIterator<Item = QueryKey>) -> Self {
    for key in keys {
      if !self.invalidates.contains(&key) {
        self.invalidates.push(key);
      }
    }
    self
  }

  pub fn with_success(mut self, message: impl Into<String>) -> Self {
    self.success = Some(message.into());
    self
  }

  pub fn invalidates(&self) -> &[QueryKey] {
    &self.invalidates
  }
}

type MutateFn<I, O> = Arc<dyn Fn(I) -> BoxFuture<'static, Result<O, ApiError>> + Send + Sync>;

/// A write bound to its descriptor.
///
/// On success every declared key is invalidated and the success toast is
/// shown. On failure an error toast is shown and the cache is left alone.
pub struct Mutation<I, O> {
  descriptor: Arc<MutationDescriptor>,
  client: QueryClient,
  toasts: Toasts,
  mutate_fn: MutateFn<I, O>,
  receiver: Option<mpsc::UnboundedReceiver<Result<O, ApiError>>>,
}

impl<I, O> Mutation<I, O>
where
  I: Send + 'static,
  O: Send + 'static,
{
  pub fn new<F, Fut>(
    client: QueryClient,
    toasts: Toasts,
    descriptor: MutationDescriptor,
    mutate_fn: F,
  ) -> Self
  where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, ApiError>> + Send + 'static,
  {
    Self {
      descriptor: Arc::new(descriptor),
      client,
      toasts,
      mutate_fn: Arc::new(move |input| mutate_fn(input).boxed()),
      receiver: None,
    }
  }

  pub fn descriptor(&self) -> &MutationDescriptor {
    &self.descriptor
  }

  /// Run the write and wait for it.
  pub async fn mutate_async(&self, input: I) -> Result<O, ApiError> {
    let request = (self.mutate_fn)(input);
    settle(&self.descriptor, &self.client, &self.toasts, request.await)
  }

  /// Run the write in the background; collect the outcome with [`Mutation::poll`].
  pub fn mutate(&mut self, input: I) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);

    let request = (self.mutate_fn)(input);
    let descriptor = self.descriptor.clone();
    let client = self.client.clone();
    let toasts = self.toasts.clone();
    tokio::spawn(async move {
      let result = settle(&descriptor, &client, &toasts, request.await);
      let _ = tx.send(result);
    });
  }

  pub fn is_pending(&self) -> bool {
    self.receiver.is_some()
  }

  /// Outcome of the last background write, once.
  pub fn poll(&mut self) -> Option<Result<O, ApiError>> {
    let receiver = self.receiver.as_mut()?;
    match receiver.try_recv() {
      Ok(result) => {
        self.receiver = None;
        Some(result)
      }
      Err(mpsc::error::TryRecvError::Empty) => None,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.receiver = None;
        Some(Err(ApiError::Transport("mutation was cancelled".to_string())))
      }
    }
  }
}

fn settle<O>(
  descriptor: &MutationDescriptor,
  client: &QueryClient,
  toasts: &Toasts,
  result: Result<O, ApiError>,
) -> Result<O, ApiError> {
  match &result {
    Ok(_) => {
      info!(mutation = descriptor.name, "mutation succeeded");
      for key in descriptor.invalidates() {
        client.invalidate(key);
      }
      if let Some(message) = &descriptor.success {
        toasts.success(message.clone());
      }
    }
    Err(e) => {
      warn!(mutation = descriptor.name, error = %e, "mutation failed");
      toasts.error(e.user_message(&descriptor.failure));
    }
  }
  result
}
