use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::backend::{Backend, HttpBackend};
use crate::config::{CONFIG, Config};
use crate::data_models::UiEvent;
use crate::suggestions::SuggestionClient;
use crate::wishlist::{ToggleOutcome, WishlistButton, WishlistToggle, scan_wishlist_buttons};

/// Global page instance
static PAGE: OnceCell<Page<HttpBackend>> = OnceCell::new();

/// What a click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    SearchInput,
    /// The dropdown itself, or the suggestion link at this index.
    Dropdown(Option<usize>),
    /// The wishlist button at this index in the page's button list.
    WishlistButton(usize),
    Elsewhere,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickResult {
    Ignored,
    Navigate(String),
    DropdownHidden,
    Wishlist(ToggleOutcome),
}

/// Both components wired to one backend, plus the page's wishlist buttons.
pub struct Page<B> {
    suggestions: SuggestionClient<B>,
    wishlist: WishlistToggle<B>,
    buttons: Mutex<Vec<Arc<WishlistButton>>>,
    events: Mutex<Option<mpsc::UnboundedReceiver<UiEvent>>>,
}

impl Page<HttpBackend> {
    /// Attaches the handlers the first time it runs; later calls return the
    /// page that is already attached.
    pub fn init_global() -> Result<&'static Page<HttpBackend>> {
        let mut attached_now = false;
        let page = PAGE.get_or_try_init(|| {
            attached_now = true;
            Self::from_config(&CONFIG)
        })?;
        if !attached_now {
            log::debug!("page handlers already attached");
        }
        Ok(page)
    }

    pub fn from_config(config: &Config) -> Result<Page<HttpBackend>> {
        let backend = HttpBackend::from_config(config).context("Failed to build HTTP client")?;
        log::info!("page attached to backend {}", backend.base_url());
        Ok(Page::new(Arc::new(backend), config))
    }
}

impl<B: Backend> Page<B> {
    pub fn new(backend: Arc<B>, config: &Config) -> Page<B> {
        let suggestions = SuggestionClient::new(backend.clone(), config);
        let (wishlist, events) = WishlistToggle::new(backend, config);
        Page {
            suggestions,
            wishlist,
            buttons: Mutex::new(Vec::new()),
            events: Mutex::new(Some(events)),
        }
    }

    pub fn suggestions(&self) -> &SuggestionClient<B> {
        &self.suggestions
    }

    pub fn wishlist(&self) -> &WishlistToggle<B> {
        &self.wishlist
    }

    /// Replaces the known wishlist buttons with the ones found in `html`.
    /// Returns how many were found.
    pub fn load_buttons(&self, html: &str) -> usize {
        let found: Vec<Arc<WishlistButton>> =
            scan_wishlist_buttons(html).into_iter().map(Arc::new).collect();
        let count = found.len();
        *self.buttons.lock() = found;
        count
    }

    pub fn add_button(&self, button: WishlistButton) -> usize {
        let mut buttons = self.buttons.lock();
        buttons.push(Arc::new(button));
        buttons.len() - 1
    }

    pub fn button(&self, index: usize) -> Option<Arc<WishlistButton>> {
        self.buttons.lock().get(index).cloned()
    }

    /// Hands out the UI event stream. Only the first caller gets it.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<UiEvent>> {
        self.events.lock().take()
    }

    /// Document-level click handling.
    pub async fn dispatch_click(&self, target: ClickTarget) -> ClickResult {
        match target {
            ClickTarget::SearchInput | ClickTarget::Dropdown(None) => ClickResult::Ignored,
            ClickTarget::Dropdown(Some(index)) => match self.suggestions.select(index) {
                Some(href) => ClickResult::Navigate(href),
                None => ClickResult::Ignored,
            },
            // Wishlist clicks stop propagation, so the dropdown stays as is.
            ClickTarget::WishlistButton(index) => match self.button(index) {
                Some(button) => ClickResult::Wishlist(self.wishlist.handle_click(&button).await),
                None => {
                    log::warn!("click on unknown wishlist button {index}");
                    ClickResult::Ignored
                }
            },
            ClickTarget::Elsewhere => {
                self.suggestions.on_outside_click();
                ClickResult::DropdownHidden
            }
        }
    }
}
