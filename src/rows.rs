use chrono::Local;

use crate::config::ReminderSettings;
use crate::scheduler::Scheduler;
use crate::structs::{DataDocument, UrlEntry};

/// One row of the secure area: the persisted entry plus view-only state.
#[derive(Debug, Clone)]
pub struct UrlRow {
    pub entry: UrlEntry,
    password_visible: bool,
}

impl UrlRow {
    pub fn new() -> Self {
        Self::from_entry(UrlEntry::new())
    }

    pub fn from_entry(entry: UrlEntry) -> Self {
        Self {
            entry,
            password_visible: false,
        }
    }

    /// Scheduler key for this row's reminder. Derived from the persisted row
    /// id, so it stays the same across restarts.
    pub fn job_id(&self) -> String {
        format!("notification_{}", self.entry.id)
    }

    pub fn reminder_message(&self) -> String {
        format!("Reminder: Check URL {}", self.entry.url)
    }

    pub fn toggle_done(&mut self) {
        self.entry.done = !self.entry.done;
    }

    pub fn done_label(&self) -> &'static str {
        if self.entry.done { "Done" } else { "Not Done" }
    }

    /// Off to on schedules a reminder `reminder.delay` from now; on to off
    /// cancels it.
    pub fn toggle_notification(&mut self, scheduler: &Scheduler, reminder: &ReminderSettings) {
        self.entry.notification_enabled = !self.entry.notification_enabled;
        if self.entry.notification_enabled {
            self.schedule_reminder(scheduler, reminder);
        } else {
            scheduler.cancel(&self.job_id());
        }
    }

    fn schedule_reminder(&self, scheduler: &Scheduler, reminder: &ReminderSettings) {
        let fire_at = Local::now() + reminder.delay;
        scheduler.schedule(Some(self.job_id().as_str()), fire_at, &reminder.title, &self.reminder_message());
    }

    pub fn notify_label(&self) -> &'static str {
        if self.entry.notification_enabled { "Notify On" } else { "Notify Off" }
    }

    pub fn is_password_visible(&self) -> bool {
        self.password_visible
    }

    pub fn password_button_label(&self) -> &'static str {
        if self.password_visible { "Hide" } else { "Show" }
    }

    /// Flips password masking if `entered_pin` matches the stored PIN.
    /// Returns false, leaving the row untouched, on a wrong PIN.
    pub fn toggle_password_visibility(&mut self, doc: &DataDocument, entered_pin: &str) -> bool {
        if !crate::master::verify_pin(doc, entered_pin) {
            return false;
        }
        self.password_visible = !self.password_visible;
        true
    }
}

impl Default for UrlRow {
    fn default() -> Self {
        Self::new()
    }
}

/// The rows currently shown, in display order. This is what gets saved.
#[derive(Debug, Clone, Default)]
pub struct RowList {
    rows: Vec<UrlRow>,
}

impl RowList {
    pub fn from_entries(entries: Vec<UrlEntry>) -> Self {
        Self {
            rows: entries.into_iter().map(UrlRow::from_entry).collect(),
        }
    }

    /// Appends an empty row and returns its index.
    pub fn add(&mut self) -> usize {
        self.rows.push(UrlRow::new());
        self.rows.len() - 1
    }

    /// Cancels any reminder the row has, then removes it. Nothing is written
    /// to disk until the list is saved.
    pub fn delete(&mut self, index: usize, scheduler: &Scheduler) -> Option<UrlRow> {
        if index >= self.rows.len() {
            return None;
        }
        let row = self.rows.remove(index);
        scheduler.cancel(&row.job_id());
        Some(row)
    }

    /// Schedules a fresh reminder for every row saved with notifications on,
    /// so the toggle state shown matches what is pending. Returns how many.
    pub fn rearm_reminders(&self, scheduler: &Scheduler, reminder: &ReminderSettings) -> usize {
        let mut armed = 0;
        for row in self.rows.iter().filter(|row| row.entry.notification_enabled) {
            row.schedule_reminder(scheduler, reminder);
            armed += 1;
        }
        armed
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut UrlRow> {
        self.rows.get_mut(index)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut UrlRow> {
        self.rows.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn entries(&self) -> Vec<UrlEntry> {
        self.rows.iter().map(|row| row.entry.clone()).collect()
    }
}
