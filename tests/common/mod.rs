#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use bikefinder::backend::Backend;
use bikefinder::config::Config;
use bikefinder::error::{ClientError, Result};

#[derive(Clone)]
pub enum SuggestionScript {
    Items(Vec<String>),
    Malformed,
}

#[derive(Clone)]
struct ScriptedQuery {
    delay: Duration,
    reply: SuggestionScript,
}

#[derive(Clone)]
pub enum WishlistScript {
    Body(String),
    NetworkError,
}

/// In-memory backend whose answers and latencies are set per test.
pub struct ScriptedBackend {
    queries: Mutex<HashMap<String, ScriptedQuery>>,
    honor_cancel: bool,
    suggestion_calls: Mutex<Vec<String>>,
    wishlist_script: Mutex<WishlistScript>,
    wishlist_calls: AtomicUsize,
    wishlist_gate: Option<Arc<Notify>>,
}

impl ScriptedBackend {
    pub fn new() -> ScriptedBackend {
        ScriptedBackend {
            queries: Mutex::new(HashMap::new()),
            honor_cancel: true,
            suggestion_calls: Mutex::new(Vec::new()),
            wishlist_script: Mutex::new(WishlistScript::Body(
                r#"{"success": true, "action": "added", "message": "Added!"}"#.to_string(),
            )),
            wishlist_calls: AtomicUsize::new(0),
            wishlist_gate: None,
        }
    }

    /// Keeps answering even after the abort signal fired, so only the
    /// query-identity check can drop late responses.
    pub fn ignoring_cancellation(mut self) -> ScriptedBackend {
        self.honor_cancel = false;
        self
    }

    /// Holds every wishlist request until the gate is notified.
    pub fn with_wishlist_gate(mut self, gate: Arc<Notify>) -> ScriptedBackend {
        self.wishlist_gate = Some(gate);
        self
    }

    pub fn suggest(self, query: &str, delay_ms: u64, items: &[&str]) -> ScriptedBackend {
        self.queries.lock().insert(
            query.to_string(),
            ScriptedQuery {
                delay: Duration::from_millis(delay_ms),
                reply: SuggestionScript::Items(items.iter().map(|s| s.to_string()).collect()),
            },
        );
        self
    }

    pub fn suggest_malformed(self, query: &str) -> ScriptedBackend {
        self.queries.lock().insert(
            query.to_string(),
            ScriptedQuery {
                delay: Duration::from_millis(10),
                reply: SuggestionScript::Malformed,
            },
        );
        self
    }

    pub fn wishlist_replies(self, script: WishlistScript) -> ScriptedBackend {
        *self.wishlist_script.lock() = script;
        self
    }

    pub fn set_wishlist_reply(&self, script: WishlistScript) {
        *self.wishlist_script.lock() = script;
    }

    pub fn suggestion_calls(&self) -> Vec<String> {
        self.suggestion_calls.lock().clone()
    }

    pub fn wishlist_calls(&self) -> usize {
        self.wishlist_calls.load(Ordering::SeqCst)
    }
}

impl Backend for ScriptedBackend {
    async fn fetch_suggestions(&self, query: &str, cancel: CancellationToken) -> Result<Vec<String>> {
        self.suggestion_calls.lock().push(query.to_string());
        let scripted = self.queries.lock().get(query).cloned().unwrap_or(ScriptedQuery {
            delay: Duration::from_millis(10),
            reply: SuggestionScript::Items(Vec::new()),
        });

        if self.honor_cancel {
            tokio::select! {
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep(scripted.delay) => {}
            }
        } else {
            tokio::time::sleep(scripted.delay).await;
        }

        match scripted.reply {
            SuggestionScript::Items(items) => Ok(items),
            SuggestionScript::Malformed => {
                Err(serde_json::from_str::<Vec<String>>("{\"not\": \"a list\"}").unwrap_err().into())
            }
        }
    }

    async fn toggle_wishlist(&self, _make: &str, _model: &str) -> Result<String> {
        self.wishlist_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.wishlist_gate {
            gate.notified().await;
        }
        let script = self.wishlist_script.lock().clone();
        match script {
            WishlistScript::Body(body) => Ok(body),
            WishlistScript::NetworkError => Err(transport_error()),
        }
    }
}

/// A genuine reqwest error, without touching the network.
pub fn transport_error() -> ClientError {
    let err = reqwest::Client::new()
        .get("not a url")
        .build()
        .unwrap_err();
    ClientError::Transport(err)
}

pub fn test_config() -> Config {
    Config {
        debounce: Duration::from_millis(250),
        ..Config::default()
    }
}
