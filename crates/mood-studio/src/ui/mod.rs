pub mod about;
pub mod auth_forms;
pub mod header;
pub mod history;
pub mod home;
pub mod player;
pub mod profile;
pub mod studio;

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use eframe::egui::{self, Color32};

use crate::task::Spawner;

pub(crate) const ERROR_COLOR: Color32 = Color32::from_rgb(0xF8, 0x71, 0x71);
pub(crate) const NOTICE_COLOR: Color32 = Color32::from_rgb(0x19, 0xE3, 0xA8);

/// Slot a spawned task fills with its outcome; the view takes it on a later
/// frame.
pub struct Pending<T> {
    slot: Rc<RefCell<Option<T>>>,
    waiting: bool,
}

impl<T> Default for Pending<T> {
    fn default() -> Self {
        Self {
            slot: Rc::new(RefCell::new(None)),
            waiting: false,
        }
    }
}

impl<T: 'static> Pending<T> {
    pub fn start(&mut self, spawner: &Spawner, task: impl Future<Output = T> + 'static) {
        self.waiting = true;
        let slot = Rc::clone(&self.slot);
        spawner.spawn(async move {
            let outcome = task.await;
            *slot.borrow_mut() = Some(outcome);
        });
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// The outcome, once. Clears the waiting flag whatever it holds.
    pub fn take(&mut self) -> Option<T> {
        let outcome = self.slot.borrow_mut().take();
        if outcome.is_some() {
            self.waiting = false;
        }
        outcome
    }
}

pub(crate) fn error_label(ui: &mut egui::Ui, error: Option<&str>) {
    if let Some(message) = error {
        ui.colored_label(ERROR_COLOR, message);
    }
}

pub(crate) fn notice_label(ui: &mut egui::Ui, notice: Option<&str>) {
    if let Some(message) = notice {
        ui.colored_label(NOTICE_COLOR, message);
    }
}
