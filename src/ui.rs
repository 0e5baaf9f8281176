use eframe::{egui, App};
use egui::{Align, Align2, Button, CentralPanel, Color32, RichText, ScrollArea, SelectableLabel, TextEdit, Ui};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::rows::{RowList, UrlRow};
use crate::scheduler::{parse_fire_time, Scheduler};
use crate::structs::DataDocument;
use crate::{master, vault};

const NOTIFY_FILL: Color32 = Color32::from_rgb(0, 128, 128);
const DONE_FILL: Color32 = Color32::from_rgb(0, 160, 0);
const NOT_DONE_FILL: Color32 = Color32::from_rgb(190, 0, 0);

#[derive(Default)]
struct CredentialsForm {
    username: String,
    password: String,
    pin: String,
}

#[derive(Default)]
struct NotificationForm {
    date: String,
    time: String,
    message: String,
}

struct PinPrompt {
    row: usize,
    pin: String,
}

struct ErrorDialog {
    title: &'static str,
    message: &'static str,
}

/// Row buttons that need more than the row itself.
enum RowAction {
    ToggleNotification(usize),
    PromptPin(usize),
    Delete(usize),
}

pub struct TrackerApp {
    config: AppConfig,
    scheduler: Arc<Scheduler>,
    logged_in: bool,
    rows: RowList,

    login_form: Option<CredentialsForm>,
    register_form: Option<CredentialsForm>,
    notification_form: Option<NotificationForm>,
    pin_prompt: Option<PinPrompt>,
    error_dialog: Option<ErrorDialog>,

    scroll_to_bottom: bool,
}

impl TrackerApp {
    pub fn new(config: AppConfig, scheduler: Arc<Scheduler>) -> Self {
        Self {
            config,
            scheduler,
            logged_in: false,
            rows: RowList::default(),

            login_form: None,
            register_form: None,
            notification_form: None,
            pin_prompt: None,
            error_dialog: None,

            scroll_to_bottom: false,
        }
    }

    fn show_error(&mut self, title: &'static str, message: &'static str) {
        self.error_dialog = Some(ErrorDialog { title, message });
    }

    fn load_document(&self) -> Option<DataDocument> {
        match vault::load_document(&self.config.data_file) {
            Ok(doc) => Some(doc),
            Err(e) => {
                log::error!("Could not load {}: {}", self.config.data_file.display(), e);
                None
            }
        }
    }

    fn submit_login(&mut self) {
        let Some(doc) = self.load_document() else {
            return;
        };
        let Some(form) = &self.login_form else {
            return;
        };

        if master::verify_login(&doc, &form.username, &form.password, &form.pin) {
            log::info!("User {} logged in", form.username);
            self.logged_in = true;
            self.login_form = None;
            self.enter_secure_area();
        } else {
            log::info!("Rejected login attempt");
            self.show_error("Login Error", "Invalid credentials");
        }
    }

    fn submit_registration(&mut self) {
        let Some(form) = &self.register_form else {
            return;
        };
        let credentials = match master::validate_registration(&form.username, &form.password, &form.pin) {
            Ok(credentials) => credentials,
            Err(e) => {
                log::info!("Registration refused: {}", e);
                self.show_error("Error", "All fields are required");
                return;
            }
        };

        match master::register(credentials, &self.config.data_file) {
            Ok(()) => self.register_form = None,
            Err(e) => log::error!("Registration failed: {}", e),
        }
    }

    /// Rebuilds the row list from disk. Unsaved edits are dropped.
    fn enter_secure_area(&mut self) {
        if let Some(doc) = self.load_document() {
            log::info!("Loaded {} row(s)", doc.urls.len());
            self.rows = RowList::from_entries(doc.urls);
            let armed = self.rows.rearm_reminders(&self.scheduler, &self.config.reminder);
            if armed > 0 {
                log::info!("Re-armed {} reminder(s)", armed);
            }
        }
    }

    fn save_rows(&self) {
        if let Err(e) = vault::save_rows(&self.config.data_file, &self.rows.entries()) {
            log::error!("Saving rows failed: {}", e);
        }
    }

    fn submit_notification(&mut self) {
        let Some(form) = &self.notification_form else {
            return;
        };
        let fire_at = match parse_fire_time(&form.date, &form.time, self.config.notification_tz) {
            Ok(fire_at) => fire_at,
            Err(e) => {
                log::info!("{}", e);
                self.show_error("Error", "Invalid date/time format.");
                return;
            }
        };

        self.scheduler
            .schedule(None, fire_at, &self.config.scheduled_title, &form.message);
        self.notification_form = None;
    }

    fn confirm_pin(&mut self) {
        let Some(doc) = self.load_document() else {
            return;
        };
        let Some(prompt) = &self.pin_prompt else {
            return;
        };
        let Some(row) = self.rows.get_mut(prompt.row) else {
            self.pin_prompt = None;
            return;
        };

        if row.toggle_password_visibility(&doc, &prompt.pin) {
            self.pin_prompt = None;
        } else {
            self.show_error("Error", "Invalid PIN");
        }
    }

    fn apply_row_action(&mut self, action: RowAction) {
        match action {
            RowAction::ToggleNotification(index) => {
                if let Some(row) = self.rows.get_mut(index) {
                    row.toggle_notification(&self.scheduler, &self.config.reminder);
                }
            }
            RowAction::PromptPin(index) => {
                self.pin_prompt = Some(PinPrompt {
                    row: index,
                    pin: String::new(),
                });
            }
            RowAction::Delete(index) => {
                self.rows.delete(index, &self.scheduler);
                // Prompt indices refer to positions, which just shifted.
                self.pin_prompt = None;
            }
        }
    }

    fn logged_out_ui(&mut self, ui: &mut Ui) {
        ui.heading(self.config.app_name.as_str());
        ui.add_space(20.0);
        ui.horizontal(|ui| {
            if ui.add_sized([100.0, 50.0], Button::new("Login")).clicked() {
                self.login_form = Some(CredentialsForm::default());
            }
            if ui.add_sized([100.0, 50.0], Button::new("Register")).clicked() {
                self.register_form = Some(CredentialsForm::default());
            }
        });
    }

    fn secure_area_ui(&mut self, ui: &mut Ui) {
        let full_width = ui.available_width();
        if ui.add_sized([full_width, 40.0], Button::new("Set Notification")).clicked() {
            self.notification_form = Some(NotificationForm::default());
        }

        ui.label(format!(
            "{} row(s), {} notification(s) pending",
            self.rows.len(),
            self.scheduler.pending_jobs()
        ));

        let mut actions = Vec::new();
        let scroll_to_bottom = std::mem::take(&mut self.scroll_to_bottom);
        ScrollArea::vertical()
            .max_height(300.0)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if self.rows.is_empty() {
                    ui.weak("No rows yet. Use \"Add URL Row\" below.");
                }
                for (index, row) in self.rows.iter_mut().enumerate() {
                    let pending = self.scheduler.is_scheduled(&row.job_id());
                    row_ui(ui, index, row, pending, &mut actions);
                }
                if scroll_to_bottom {
                    ui.scroll_to_cursor(Some(Align::BOTTOM));
                }
            });

        if ui.add_sized([full_width, 40.0], Button::new("Add URL Row")).clicked() {
            self.rows.add();
            self.scroll_to_bottom = true;
        }
        if ui.add_sized([full_width, 40.0], Button::new("Save Data")).clicked() {
            self.save_rows();
        }

        for action in actions {
            self.apply_row_action(action);
        }
    }

    fn login_window(&mut self, ctx: &egui::Context) {
        let Some(form) = self.login_form.as_mut() else {
            return;
        };
        let mut open = true;
        let mut submit = false;
        popup("Login", &mut open).show(ctx, |ui| {
            let entered = credentials_fields(ui, form, "login", ["Username", "Password", "PIN"]);
            submit = ui.button("Login").clicked() || entered;
        });

        if !open {
            self.login_form = None;
        } else if submit {
            self.submit_login();
        }
    }

    fn register_window(&mut self, ctx: &egui::Context) {
        let Some(form) = self.register_form.as_mut() else {
            return;
        };
        let mut open = true;
        let mut submit = false;
        popup("Register", &mut open).show(ctx, |ui| {
            let entered = credentials_fields(ui, form, "register", ["New Username", "New Password", "New PIN"]);
            submit = ui.button("Register").clicked() || entered;
        });

        if !open {
            self.register_form = None;
        } else if submit {
            self.submit_registration();
        }
    }

    fn notification_window(&mut self, ctx: &egui::Context) {
        let Some(form) = self.notification_form.as_mut() else {
            return;
        };
        let mut open = true;
        let mut submit = false;
        popup("Set Notification", &mut open).show(ctx, |ui| {
            ui.add(TextEdit::singleline(&mut form.date).hint_text("Enter date (YYYY-MM-DD)"));
            ui.add(TextEdit::singleline(&mut form.time).hint_text("Enter time (HH:MM)"));
            let message = ui.add(TextEdit::singleline(&mut form.message).hint_text("Message (URL)"));
            let entered = submitted_with_enter(ui, &message);
            submit = ui.button("Schedule Notification").clicked() || entered;
        });

        if !open {
            self.notification_form = None;
        } else if submit {
            self.submit_notification();
        }
    }

    fn pin_window(&mut self, ctx: &egui::Context) {
        let Some(prompt) = self.pin_prompt.as_mut() else {
            return;
        };
        let mut open = true;
        let mut submit = false;
        popup("Enter PIN to Show Password", &mut open).show(ctx, |ui| {
            let pin = ui.add(
                TextEdit::singleline(&mut prompt.pin)
                    .id(pin_field_id("reveal"))
                    .hint_text("Enter PIN")
                    .password(true),
            );
            let entered = submitted_with_enter(ui, &pin);
            submit = ui.button("Confirm").clicked() || entered;
        });

        if !open {
            self.pin_prompt = None;
        } else if submit {
            self.confirm_pin();
        }
    }

    fn error_window(&mut self, ctx: &egui::Context) {
        let Some(dialog) = &self.error_dialog else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new(dialog.title)
            .id(egui::Id::new("error_dialog"))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.colored_label(Color32::RED, dialog.message);
                dismissed = ui.button("OK").clicked();
            });

        if dismissed {
            self.error_dialog = None;
        }
    }
}

fn popup<'a>(title: &'static str, open: &'a mut bool) -> egui::Window<'a> {
    egui::Window::new(title)
        .open(open)
        .collapsible(false)
        .resizable(false)
        .default_width(320.0)
        .anchor(Align2::CENTER_TOP, [0.0, 80.0])
}

fn pin_field_id(form: &'static str) -> egui::Id {
    egui::Id::new((form, "pin"))
}

/// Enter pressed while editing the field, the way a text box is "submitted".
fn submitted_with_enter(ui: &Ui, response: &egui::Response) -> bool {
    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter))
}

/// Username, password and PIN fields. Returns true when Enter was pressed in
/// the password or PIN field.
fn credentials_fields(ui: &mut Ui, form: &mut CredentialsForm, form_name: &'static str, hints: [&str; 3]) -> bool {
    let [user_hint, pass_hint, pin_hint] = hints;
    ui.add(TextEdit::singleline(&mut form.username).hint_text(user_hint));
    let password = ui.add(TextEdit::singleline(&mut form.password).hint_text(pass_hint).password(true));
    let pin = ui.add(
        TextEdit::singleline(&mut form.pin)
            .id(pin_field_id(form_name))
            .hint_text(pin_hint)
            .password(true),
    );
    submitted_with_enter(ui, &password) || submitted_with_enter(ui, &pin)
}

fn row_ui(ui: &mut Ui, index: usize, row: &mut UrlRow, reminder_pending: bool, actions: &mut Vec<RowAction>) {
    let fill = if row.entry.notification_enabled {
        NOTIFY_FILL
    } else {
        Color32::TRANSPARENT
    };
    let masked = !row.is_password_visible();

    egui::Frame::none().fill(fill).inner_margin(4.0).show(ui, |ui| {
        ui.horizontal(|ui| {
            ui.add(TextEdit::singleline(&mut row.entry.url).hint_text("URL").desired_width(220.0));
            ui.add(TextEdit::singleline(&mut row.entry.email).hint_text("Email").desired_width(140.0));
            ui.add(
                TextEdit::singleline(&mut row.entry.password)
                    .hint_text("Password")
                    .password(masked)
                    .desired_width(110.0),
            );
            if ui.add_sized([70.0, 20.0], Button::new(row.password_button_label())).clicked() {
                actions.push(RowAction::PromptPin(index));
            }
            ui.add(TextEdit::singleline(&mut row.entry.invested).hint_text("Investment").desired_width(90.0));
            ui.add(TextEdit::singleline(&mut row.entry.gain).hint_text("Daily Gain").desired_width(80.0));
            ui.add(TextEdit::singleline(&mut row.entry.date).hint_text("Date").desired_width(90.0));

            let done_fill = if row.entry.done { DONE_FILL } else { NOT_DONE_FILL };
            let done = Button::new(RichText::new(row.done_label()).color(Color32::WHITE)).fill(done_fill);
            if ui.add_sized([80.0, 20.0], done).clicked() {
                row.toggle_done();
            }

            let notify = SelectableLabel::new(row.entry.notification_enabled, row.notify_label());
            let hover = if reminder_pending { "Reminder pending" } else { "No reminder pending" };
            if ui.add_sized([100.0, 20.0], notify).on_hover_text(hover).clicked() {
                actions.push(RowAction::ToggleNotification(index));
            }
            if ui.add_sized([80.0, 20.0], Button::new("Delete")).clicked() {
                actions.push(RowAction::Delete(index));
            }
        });
    });
}

impl App for TrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        CentralPanel::default().show(ctx, |ui| {
            if self.logged_in {
                self.secure_area_ui(ui);
            } else {
                self.logged_out_ui(ui);
            }
        });

        self.login_window(ctx);
        self.register_window(ctx);
        self.notification_window(ctx);
        self.pin_window(ctx);
        self.error_window(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::tests::RecordingNotifier;
    use crate::structs::UrlEntry;
    use std::path::Path;
    use tempfile::tempdir;

    fn test_app(dir: &Path) -> TrackerApp {
        let config = AppConfig {
            data_file: dir.join("secure_data.json"),
            ..AppConfig::default()
        };
        let scheduler = Scheduler::new(Arc::new(RecordingNotifier::default()));
        TrackerApp::new(config, Arc::new(scheduler))
    }

    fn register_alice(app: &TrackerApp, rows: &[UrlEntry]) {
        let credentials = master::validate_registration("alice", "pw", "1234").unwrap();
        master::register(credentials, &app.config.data_file).unwrap();
        vault::save_rows(&app.config.data_file, rows).unwrap();
    }

    fn credentials(username: &str, password: &str, pin: &str) -> Option<CredentialsForm> {
        Some(CredentialsForm {
            username: username.to_owned(),
            password: password.to_owned(),
            pin: pin.to_owned(),
        })
    }

    fn row_with_url(url: &str) -> UrlEntry {
        UrlEntry {
            url: url.to_owned(),
            ..UrlEntry::new()
        }
    }

    #[test]
    fn wrong_credentials_stay_logged_out() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        register_alice(&app, &[]);

        app.login_form = credentials("alice", "pw", "1235");
        app.submit_login();

        assert!(!app.logged_in);
        assert!(app.login_form.is_some());
        let dialog = app.error_dialog.as_ref().unwrap();
        assert_eq!(dialog.title, "Login Error");
        assert_eq!(dialog.message, "Invalid credentials");
    }

    #[test]
    fn correct_credentials_load_saved_rows() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        let mut reminded = row_with_url("https://two.example");
        reminded.notification_enabled = true;
        let saved = vec![row_with_url("https://one.example"), reminded];
        register_alice(&app, &saved);

        app.login_form = credentials("alice", "pw", "1234");
        app.submit_login();

        assert!(app.logged_in);
        assert!(app.login_form.is_none());
        assert!(app.error_dialog.is_none());
        assert_eq!(app.rows.entries(), saved);
        assert_eq!(app.scheduler.pending_jobs(), 1);
        assert!(app.scheduler.is_scheduled(&UrlRow::from_entry(saved[1].clone()).job_id()));
    }

    #[test]
    fn registration_closes_form_without_logging_in() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        vault::save_rows(&app.config.data_file, &[UrlEntry::new()]).unwrap();

        app.register_form = credentials("bob", "secret", "9999");
        app.submit_registration();

        assert!(app.register_form.is_none());
        assert!(!app.logged_in);
        let doc = vault::load_document(&app.config.data_file).unwrap();
        assert_eq!(doc.username.as_deref(), Some("bob"));
        assert!(doc.urls.is_empty());
    }

    #[test]
    fn empty_registration_field_shows_dialog() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());

        app.register_form = credentials("bob", "secret", "");
        app.submit_registration();

        assert!(app.register_form.is_some());
        assert_eq!(app.error_dialog.as_ref().unwrap().message, "All fields are required");
        assert!(!app.config.data_file.exists());
    }

    #[test]
    fn malformed_date_schedules_nothing_and_keeps_popup_open() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());

        app.notification_form = Some(NotificationForm {
            date: "2025-13-99".to_owned(),
            time: "09:00".to_owned(),
            message: "https://one.example".to_owned(),
        });
        app.submit_notification();

        assert_eq!(app.scheduler.pending_jobs(), 0);
        assert!(app.notification_form.is_some());
        assert_eq!(app.error_dialog.as_ref().unwrap().message, "Invalid date/time format.");
    }

    #[test]
    fn valid_date_schedules_one_job_and_closes_popup() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());

        app.notification_form = Some(NotificationForm {
            date: "2099-01-01".to_owned(),
            time: "09:00".to_owned(),
            message: "https://one.example".to_owned(),
        });
        app.submit_notification();

        assert_eq!(app.scheduler.pending_jobs(), 1);
        assert!(app.notification_form.is_none());
        assert!(app.error_dialog.is_none());
    }

    #[test]
    fn wrong_pin_keeps_prompt_open_and_password_masked() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        register_alice(&app, &[]);
        app.rows = RowList::from_entries(vec![row_with_url("https://one.example")]);

        app.apply_row_action(RowAction::PromptPin(0));
        app.pin_prompt.as_mut().unwrap().pin = "0000".to_owned();
        app.confirm_pin();

        assert!(app.pin_prompt.is_some());
        assert_eq!(app.error_dialog.as_ref().unwrap().message, "Invalid PIN");
        assert!(!app.rows.get_mut(0).unwrap().is_password_visible());

        app.pin_prompt.as_mut().unwrap().pin = "1234".to_owned();
        app.confirm_pin();
        assert!(app.pin_prompt.is_none());
        assert!(app.rows.get_mut(0).unwrap().is_password_visible());
    }

    #[test]
    fn deleting_a_row_cancels_its_job_without_saving() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        let saved = vec![row_with_url("https://one.example")];
        register_alice(&app, &saved);
        app.rows = RowList::from_entries(saved);

        app.apply_row_action(RowAction::ToggleNotification(0));
        let job_id = app.rows.get_mut(0).unwrap().job_id();
        assert!(app.scheduler.is_scheduled(&job_id));

        app.apply_row_action(RowAction::Delete(0));

        assert!(app.rows.is_empty());
        assert!(!app.scheduler.is_scheduled(&job_id));
        assert_eq!(vault::load_document(&app.config.data_file).unwrap().urls.len(), 1);
    }

    #[test]
    fn enter_in_pin_field_submits_login() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        register_alice(&app, &[]);
        app.login_form = credentials("alice", "pw", "1234");

        let ctx = egui::Context::default();
        for _ in 0..3 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| app.login_window(ctx));
        }
        assert!(!app.logged_in);

        ctx.memory_mut(|mem| mem.request_focus(pin_field_id("login")));
        let enter = egui::RawInput {
            events: vec![egui::Event::Key {
                key: egui::Key::Enter,
                physical_key: None,
                pressed: true,
                repeat: false,
                modifiers: egui::Modifiers::NONE,
            }],
            ..Default::default()
        };
        let _ = ctx.run(enter, |ctx| app.login_window(ctx));

        assert!(app.logged_in);
        assert!(app.login_form.is_none());
    }
}
