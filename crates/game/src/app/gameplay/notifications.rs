use serde::Serialize;

use super::events::GameEvent;
use super::{LONG_NOTIFICATION_MS, SHORT_NOTIFICATION_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NotificationId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Reward,
    Achievement,
    Warning,
    Victory,
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub message: String,
    pub duration_ms: u32,
}

#[derive(Debug, Clone, PartialEq)]
struct ScheduledRemoval {
    id: NotificationId,
    due_at_seconds: f64,
}

/// Insertion-ordered HUD queue. Every entry carries a scheduled removal;
/// explicit removal cancels it, so an expiry never touches a reused slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationQueue {
    next_id: u64,
    items: Vec<Notification>,
    schedule: Vec<ScheduledRemoval>,
}

impl NotificationQueue {
    pub fn push(
        &mut self,
        kind: NotificationKind,
        message: impl Into<String>,
        duration_ms: u32,
        now_seconds: f64,
    ) -> NotificationId {
        let id = NotificationId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.items.push(Notification {
            id,
            kind,
            message: message.into(),
            duration_ms,
        });
        self.schedule.push(ScheduledRemoval {
            id,
            due_at_seconds: now_seconds + f64::from(duration_ms) / 1000.0,
        });
        id
    }

    /// Returns false when `id` was already gone.
    pub fn remove(&mut self, id: NotificationId) -> bool {
        self.schedule.retain(|entry| entry.id != id);
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub fn expire_due(&mut self, now_seconds: f64) -> Vec<NotificationId> {
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.schedule)
            .into_iter()
            .partition(|entry| entry.due_at_seconds <= now_seconds);
        self.schedule = pending;
        due.into_iter()
            .map(|entry| entry.id)
            .filter(|id| {
                let before = self.items.len();
                self.items.retain(|item| item.id != *id);
                self.items.len() != before
            })
            .collect()
    }

    /// Drops every entry but keeps the id sequence moving forward.
    pub fn clear(&mut self) {
        self.items.clear();
        self.schedule.clear();
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn scheduled_count(&self) -> usize {
        self.schedule.len()
    }
}

/// HUD message for events the player should see, if any.
pub fn notification_for(event: &GameEvent) -> Option<(NotificationKind, String, u32)> {
    match event {
        GameEvent::Collected { value, .. } => Some((
            NotificationKind::Reward,
            format!("+{value} gem"),
            SHORT_NOTIFICATION_MS,
        )),
        GameEvent::EnemyDefeated { reward, .. } => Some((
            NotificationKind::Reward,
            format!("Enemy defeated +{reward}"),
            SHORT_NOTIFICATION_MS,
        )),
        GameEvent::LevelUp { level } => Some((
            NotificationKind::Achievement,
            format!("Level {level}!"),
            LONG_NOTIFICATION_MS,
        )),
        GameEvent::LifeLost { lives_remaining } => Some((
            NotificationKind::Warning,
            format!("Life lost, {lives_remaining} remaining"),
            LONG_NOTIFICATION_MS,
        )),
        GameEvent::Victory { score, .. } => Some((
            NotificationKind::Victory,
            format!("Victory! Final score {score}"),
            LONG_NOTIFICATION_MS,
        )),
        GameEvent::GameOver { final_score } => Some((
            NotificationKind::GameOver,
            format!("Game over. Final score {final_score}"),
            LONG_NOTIFICATION_MS,
        )),
        GameEvent::HighScoreBeaten { score, .. } => Some((
            NotificationKind::Achievement,
            format!("New high score: {score}"),
            LONG_NOTIFICATION_MS,
        )),
        _ => None,
    }
}
