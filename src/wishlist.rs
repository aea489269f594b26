use parking_lot::Mutex;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::backend::Backend;
use crate::config::Config;
use crate::data_models::{ButtonState, ButtonView, Toast, ToastKind, UiEvent, WishlistReply};
use crate::error::{ClientError, Result};

pub const BUTTON_SELECTOR: &str = ".add-to-wishlist";

pub const MISSING_DATA_MESSAGE: &str = "Missing bike data.";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Try again.";
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Updated wishlist.";
pub const DEFAULT_FAILURE_MESSAGE: &str = "Action failed.";

/// A wishlist button as found on the page.
#[derive(Debug)]
pub struct WishlistButton {
    make: Option<String>,
    model: Option<String>,
    pending: AtomicBool,
    view: Mutex<ButtonView>,
}

impl WishlistButton {
    pub fn new(make: Option<&str>, model: Option<&str>, view: ButtonView) -> WishlistButton {
        WishlistButton {
            make: make.map(str::to_string),
            model: model.map(str::to_string),
            pending: AtomicBool::new(false),
            view: Mutex::new(view),
        }
    }

    pub fn make(&self) -> Option<&str> {
        self.make.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn view(&self) -> ButtonView {
        self.view.lock().clone()
    }

    pub fn state(&self) -> ButtonState {
        self.view.lock().state()
    }

    /// Both data attributes, when present and non-empty.
    fn bike(&self) -> Option<(&str, &str)> {
        let make = self.make().filter(|m| !m.is_empty())?;
        let model = self.model().filter(|m| !m.is_empty())?;
        Some((make, model))
    }

    fn try_begin(&self) -> Option<PendingGuard<'_>> {
        self.pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PendingGuard { flag: &self.pending })
    }
}

/// Clears the pending flag however the click handler exits.
struct PendingGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Finds every wishlist button in a server-rendered page.
pub fn scan_wishlist_buttons(html: &str) -> Vec<WishlistButton> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse(BUTTON_SELECTOR) {
        Ok(selector) => selector,
        Err(e) => {
            log::error!("bad wishlist button selector: {e}");
            return Vec::new();
        }
    };

    document
        .select(&selector)
        .map(|element| {
            let value = element.value();
            let label = element.text().collect::<String>().trim().to_string();
            let classes: Vec<&str> = value.classes().collect();
            WishlistButton::new(
                value.attr("data-make"),
                value.attr("data-model"),
                ButtonView::new(label, &classes),
            )
        })
        .collect()
}

/// Result of one click on a wishlist button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// A request for this button was already in flight.
    Ignored,
    MissingData,
    /// The server confirmed the change.
    Updated(ButtonState),
    /// The server answered with `success: false`.
    Rejected,
    /// The server answered with a page, so the host must reload.
    Reloaded,
    NetworkError,
}

pub struct WishlistToggle<B> {
    backend: Arc<B>,
    events: mpsc::UnboundedSender<UiEvent>,
    toast_duration: Duration,
}

impl<B: Backend> WishlistToggle<B> {
    pub fn new(
        backend: Arc<B>,
        config: &Config,
    ) -> (WishlistToggle<B>, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let toggle = WishlistToggle {
            backend,
            events: tx,
            toast_duration: config.toast_duration,
        };
        (toggle, rx)
    }

    pub async fn handle_click(&self, button: &WishlistButton) -> ToggleOutcome {
        let Some(_guard) = button.try_begin() else {
            log::debug!("wishlist click ignored, request already pending");
            return ToggleOutcome::Ignored;
        };

        match self.submit(button).await {
            Ok(outcome) => outcome,
            Err(ClientError::MissingBikeData) => {
                self.toast(MISSING_DATA_MESSAGE, ToastKind::Danger);
                ToggleOutcome::MissingData
            }
            Err(e) => {
                log::error!("Wishlist network error: {e}");
                self.toast(NETWORK_ERROR_MESSAGE, ToastKind::Danger);
                ToggleOutcome::NetworkError
            }
        }
    }

    async fn submit(&self, button: &WishlistButton) -> Result<ToggleOutcome> {
        let (make, model) = button.bike().ok_or(ClientError::MissingBikeData)?;
        let body = self.backend.toggle_wishlist(make, model).await?;

        let Some(reply) = WishlistReply::classify(&body) else {
            log::debug!("wishlist answered with a page, reloading");
            self.emit(UiEvent::Reload);
            return Ok(ToggleOutcome::Reloaded);
        };

        if !reply.success {
            let message = reply.message_or(DEFAULT_FAILURE_MESSAGE);
            self.toast(message, ToastKind::Danger);
            return Ok(ToggleOutcome::Rejected);
        }

        let state = {
            let mut view = button.view.lock();
            if let Some(action) = reply.action {
                view.apply(action);
            }
            view.state()
        };
        let message = reply.message_or(DEFAULT_SUCCESS_MESSAGE);
        self.toast(message, ToastKind::Success);
        Ok(ToggleOutcome::Updated(state))
    }

    fn toast(&self, message: &str, kind: ToastKind) {
        self.emit(UiEvent::Toast(Toast::new(message, kind, self.toast_duration)));
    }

    fn emit(&self, event: UiEvent) {
        if self.events.send(event).is_err() {
            log::warn!("ui event dropped, nobody is listening");
        }
    }
}
