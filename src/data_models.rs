use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Characters `encodeURIComponent` leaves untouched besides ASCII alphanumerics.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// The trimmed value of the search input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    pub fn new(raw: &str) -> Query {
        Query(raw.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// Whether the query is long enough to be worth a network round trip.
    pub fn is_searchable(&self, min_len: usize) -> bool {
        self.char_len() >= min_len
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionLink {
    pub label: String,
    pub href: String,
}

impl SuggestionLink {
    pub fn new(label: impl Into<String>) -> SuggestionLink {
        let label = label.into();
        let href = format!("/search?query={}", encode_component(&label));
        SuggestionLink { label, href }
    }
}

pub const SUGGESTION_ITEM_CLASSES: &str = "list-group-item list-group-item-action";

/// Contents and visibility of the suggestions box under the search input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dropdown {
    pub links: Vec<SuggestionLink>,
    pub visible: bool,
}

impl Dropdown {
    pub fn clear(&mut self) {
        self.links.clear();
        self.visible = false;
    }

    /// Replaces the links. An empty list hides the box, anything else shows it.
    pub fn render<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links = items.into_iter().map(SuggestionLink::new).collect();
        self.visible = !self.links.is_empty();
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn hrefs(&self) -> Vec<&str> {
        self.links.iter().map(|l| l.href.as_str()).collect()
    }

    pub fn to_html(&self) -> String {
        self.links
            .iter()
            .map(|link| {
                format!(
                    r#"<a href="{}" class="{}">{}</a>"#,
                    escape_html(&link.href),
                    SUGGESTION_ITEM_CLASSES,
                    escape_html(&link.label)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistAction {
    Added,
    Removed,
}

impl WishlistAction {
    fn from_json(value: &Value) -> Option<WishlistAction> {
        match value.as_str()? {
            "added" => Some(WishlistAction::Added),
            "removed" => Some(WishlistAction::Removed),
            _ => None,
        }
    }
}

/// JSON body the wishlist endpoint returns to asynchronous requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishlistReply {
    pub success: bool,
    pub action: Option<WishlistAction>,
    pub message: Option<String>,
}

impl WishlistReply {
    /// Returns `None` when the body is not JSON or carries no `success`
    /// field, which means the server answered with a page instead.
    ///
    /// `success` follows JavaScript truthiness, and `action`/`message` are
    /// only taken when they have the expected shape.
    pub fn classify(body: &str) -> Option<WishlistReply> {
        let value: Value = serde_json::from_str(body).ok()?;
        let success = value.get("success")?;
        Some(WishlistReply {
            success: is_truthy(success),
            action: value.get("action").and_then(WishlistAction::from_json),
            message: value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    /// The server message, unless it is missing or blank.
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.message
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    NotWishlisted,
    Wishlisted,
}

pub const ADDED_LABEL: &str = "✔ Added";
pub const ADD_LABEL: &str = "♥ Add to Wishlist";
pub const ADDED_CLASS: &str = "btn-success";
pub const ADD_CLASS: &str = "btn-outline-danger";

/// What the wishlist button currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub label: String,
    pub classes: Vec<String>,
}

impl ButtonView {
    pub fn new(label: impl Into<String>, classes: &[&str]) -> ButtonView {
        ButtonView {
            label: label.into(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn state(&self) -> ButtonState {
        if self.has_class(ADDED_CLASS) {
            ButtonState::Wishlisted
        } else {
            ButtonState::NotWishlisted
        }
    }

    pub fn apply(&mut self, action: WishlistAction) {
        match action {
            WishlistAction::Added => {
                self.label = ADDED_LABEL.to_string();
                self.remove_class(ADD_CLASS);
                self.add_class(ADDED_CLASS);
            }
            WishlistAction::Removed => {
                self.label = ADD_LABEL.to_string();
                self.remove_class(ADDED_CLASS);
                self.add_class(ADD_CLASS);
            }
        }
    }

    fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Danger,
    Warning,
    Info,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Danger => "danger",
            ToastKind::Warning => "warning",
            ToastKind::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub duration: Duration,
}

impl Toast {
    pub fn new(message: impl Into<String>, kind: ToastKind, duration: Duration) -> Toast {
        Toast {
            message: message.into(),
            kind,
            duration,
        }
    }

    pub fn css_class(&self) -> String {
        format!(
            "alert alert-{} position-fixed bottom-0 end-0 m-3",
            self.kind.as_str()
        )
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Whether the host should suppress the browser's default handling of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    Default,
    PreventDefault,
}

/// Effects the host page has to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Toast(Toast),
    Reload,
}
