use att_core::Notification;

/// Surfaces notifications to the employee.
///
/// Called from the tracker task, so implementations must return promptly.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, notification: &Notification);
}
