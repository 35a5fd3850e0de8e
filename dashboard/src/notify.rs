//! Application-wide toast notifications.
//!
//! A [`Notifier`] is created once by the application and handed to every
//! facade that needs to report something to the user.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum ToastType {
    Error,
    Success,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: Uuid,
    pub message: String,
    pub toast_type: ToastType,
    /// None for no auto-dismiss
    pub duration: Option<Duration>,
}

impl Toast {
    pub fn new(message: String, toast_type: ToastType) -> Self {
        Self {
            id: Uuid::new_v4(),
            message,
            toast_type,
            duration: Some(Duration::from_secs(5)),
        }
    }

    pub fn error(message: String) -> Self {
        Self::new(message, ToastType::Error)
    }

    pub fn success(message: String) -> Self {
        Self::new(message, ToastType::Success)
    }

    pub fn info(message: String) -> Self {
        Self::new(message, ToastType::Info)
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn no_auto_dismiss(mut self) -> Self {
        self.duration = None;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToastState {
    /// Oldest first.
    pub toasts: Vec<Toast>,
}

pub enum ToastAction {
    Add(Toast),
    Remove(Uuid),
    Clear,
}

impl ToastState {
    pub fn reduce(&mut self, action: ToastAction) {
        match action {
            ToastAction::Add(toast) => {
                self.toasts.retain(|t| t.id != toast.id);
                self.toasts.push(toast);
            }
            ToastAction::Remove(id) => {
                self.toasts.retain(|t| t.id != id);
            }
            ToastAction::Clear => {
                self.toasts.clear();
            }
        }
    }
}

/// Handle to the shared toast list. Clones share the same list.
///
/// Auto-dismiss timers are spawned on the current tokio runtime.
#[derive(Clone)]
pub struct Notifier {
    state: Arc<Mutex<ToastState>>,
    updates: Arc<watch::Sender<ToastState>>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (updates, _) = watch::channel(ToastState::default());
        Self {
            state: Arc::default(),
            updates: Arc::new(updates),
        }
    }

    fn dispatch(&self, action: ToastAction) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.reduce(action);
        self.updates.send_replace(state.clone());
    }

    pub fn add(&self, toast: Toast) {
        let toast_id = toast.id;
        let duration = toast.duration;

        match toast.toast_type {
            ToastType::Error => tracing::warn!("Toast: {}", toast.message),
            _ => tracing::info!("Toast: {}", toast.message),
        }
        self.dispatch(ToastAction::Add(toast));

        if let Some(duration) = duration {
            let notifier = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                notifier.remove(toast_id);
            });
        }
    }

    pub fn error(&self, message: impl Into<String>) {
        self.add(Toast::error(message.into()));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.add(Toast::success(message.into()));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.add(Toast::info(message.into()));
    }

    pub fn remove(&self, id: Uuid) {
        self.dispatch(ToastAction::Remove(id));
    }

    pub fn clear(&self) {
        self.dispatch(ToastAction::Clear);
    }

    /// Current toasts, oldest first.
    pub fn toasts(&self) -> Vec<Toast> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .toasts
            .clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ToastState> {
        self.updates.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn toasts_auto_dismiss() {
        let notifier = Notifier::new();
        notifier.error("Falha ao carregar fretes");
        notifier.add(Toast::info("Fixado".into()).no_auto_dismiss());
        assert_eq!(notifier.toasts().len(), 2);

        tokio::time::sleep(Duration::from_secs(6)).await;
        let remaining = notifier.toasts();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].message, "Fixado");
    }

    #[tokio::test]
    async fn toasts_are_listed_oldest_first() {
        let notifier = Notifier::new();
        notifier.info("primeiro");
        notifier.error("segundo");
        notifier.success("terceiro");
        let first = notifier.toasts()[0].id;
        notifier.remove(first);
        notifier.info("quarto");

        let messages: Vec<_> =
            notifier.toasts().into_iter().map(|t| t.message).collect();
        assert_eq!(messages, vec!["segundo", "terceiro", "quarto"]);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let notifier = Notifier::new();
        let mut updates = notifier.subscribe();
        notifier.success("Salvo");
        notifier.clear();

        assert!(notifier.toasts().is_empty());
        assert!(updates.borrow_and_update().toasts.is_empty());
    }
}
