use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

pub const MAX_LIVE_NOTIFICATIONS: usize = 3;
pub const DEFAULT_DURATION: Duration = Duration::from_millis(5000);
/// Time the exit transition gets before the notification leaves the container.
pub const EXIT_TRANSITION: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Loading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub kind: NotificationKind,
    dismiss_at: Option<Instant>,
}

impl Notification {
    /// Loading notifications can only be dismissed by whoever holds the id.
    pub fn closable(&self) -> bool {
        self.kind != NotificationKind::Loading
    }

    pub fn auto_dismisses(&self) -> bool {
        self.dismiss_at.is_some()
    }
}

/// Bounded set of on-screen notifications.
///
/// Live notifications are kept in insertion order. Hiding one starts its exit
/// transition; it stays in the container, no longer live, until
/// [`EXIT_TRANSITION`] has elapsed and [`NotificationCenter::sweep`] runs.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    live: VecDeque<Notification>,
    leaving: Vec<(Notification, Instant)>,
    next_id: u64,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a notification with the default duration.
    pub fn notify(&mut self, message: impl Into<String>, kind: NotificationKind) -> NotificationId {
        self.show(message, kind, Some(DEFAULT_DURATION))
    }

    /// Show a notification. `None` or a zero duration disables auto-dismiss;
    /// loading notifications never auto-dismiss.
    pub fn show(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        duration: Option<Duration>,
    ) -> NotificationId {
        let now = Instant::now();
        self.sweep_at(now);

        while self.live.len() >= MAX_LIVE_NOTIFICATIONS {
            if let Some(oldest) = self.live.pop_front() {
                self.leaving.push((oldest, now + EXIT_TRANSITION));
            }
        }

        self.next_id += 1;
        let id = NotificationId(self.next_id);
        let dismiss_at = match (kind, duration) {
            (NotificationKind::Loading, _) => None,
            (_, Some(duration)) if !duration.is_zero() => Some(now + duration),
            _ => None,
        };

        self.live.push_back(Notification {
            id,
            message: message.into(),
            kind,
            dismiss_at,
        });
        id
    }

    /// Start the exit transition. Returns `false` if the id is not live.
    pub fn hide(&mut self, id: NotificationId) -> bool {
        let Some(position) = self.live.iter().position(|n| n.id == id) else {
            return false;
        };

        if let Some(notification) = self.live.remove(position) {
            self.leaving
                .push((notification, Instant::now() + EXIT_TRANSITION));
        }
        true
    }

    /// Expire timed notifications and drop finished exit transitions.
    pub fn sweep(&mut self) {
        self.sweep_at(Instant::now());
    }

    fn sweep_at(&mut self, now: Instant) {
        self.leaving.retain(|(_, remove_at)| *remove_at > now);

        while let Some(position) = self
            .live
            .iter()
            .position(|n| n.dismiss_at.is_some_and(|at| at <= now))
        {
            if let Some(expired) = self.live.remove(position) {
                self.leaving.push((expired, now + EXIT_TRANSITION));
            }
        }
    }

    pub fn live(&self) -> impl Iterator<Item = &Notification> {
        self.live.iter()
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.live.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Notifications still in their exit transition.
    pub fn leaving(&self) -> usize {
        self.leaving.len()
    }
}
