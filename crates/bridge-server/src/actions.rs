//! UI actions and the fallback text scanner.
//!
//! A [`UiAction`] is a frontend side effect requested by the agent. The
//! primary channel for these is structured tool output
//! ([`ToolOutput::UiAction`](crate::backends::tools::ToolOutput)); the
//! scanner in this module is a best-effort compatibility shim for models
//! that describe the action in prose instead of invoking the tool. It is
//! advisory only; its pattern set is fixed and deliberately small.

use bridge_core::JsonValue;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// Discriminated UI side effect.
///
/// Serialized to the wire as the original `{action, args}` shape via
/// [`UiAction::name`] and [`UiAction::args`]; internally the discriminant is
/// the enum variant, so no colon-delimited string parsing anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UiAction {
    ChangeBackgroundColor { color: String },
    ChangeTheme { theme: Theme },
    ShowNotification { message: String, level: NotificationLevel },
    ResetUi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    /// Parse a level, defaulting to `Info` for anything unrecognized.
    pub fn parse_lenient(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "warning" => Self::Warning,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl UiAction {
    /// Wire name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChangeBackgroundColor { .. } => "changeBackgroundColor",
            Self::ChangeTheme { .. } => "changeTheme",
            Self::ShowNotification { .. } => "showNotification",
            Self::ResetUi => "resetUI",
        }
    }

    /// Wire args of the action.
    pub fn args(&self) -> JsonValue {
        match self {
            Self::ChangeBackgroundColor { color } => json!({ "color": color }),
            Self::ChangeTheme { theme } => json!({ "theme": theme.as_str() }),
            Self::ShowNotification { message, level } => {
                json!({ "message": message, "type": level.as_str() })
            }
            Self::ResetUi => json!({}),
        }
    }

    /// Human-readable confirmation, used as the tool-call result text.
    pub fn confirmation(&self) -> String {
        match self {
            Self::ChangeBackgroundColor { color } => {
                format!("Changed background color to {color}")
            }
            Self::ChangeTheme { theme } => format!("Switched to {} theme", theme.as_str()),
            Self::ShowNotification { message, .. } => format!("Showed notification: {message}"),
            Self::ResetUi => "Reset the UI to its default state".to_string(),
        }
    }
}

/// Colors the scanner will accept for a background change.
const KNOWN_COLORS: &[&str] = &[
    "blue", "red", "green", "yellow", "purple", "pink", "orange", "black", "white", "gray",
    "cyan", "magenta",
];

/// Phrases that mark the surrounding text as hypothetical (help text,
/// greetings, suggestions). Any hit suppresses the whole scan.
const HEDGE_MARKERS: &[&str] = &["try:", "example:", "examples:", "such as", "e.g.", "for instance"];

static COLOR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"change.*background.*(?:to|color)\s*["']?(\w+)["']?"#,
        r#"change_background_color\s*\(\s*["']?(\w+)["']?\s*\)"#,
        r#"background.*(?:to|=)\s*["']?(\w+)["']?"#,
        r#"(?:set|make).*background\s+(\w+)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("color pattern is valid"))
    .collect()
});

static NOTIFY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)show_notification\s*\(\s*["'](.+?)["']"#,
        r#"(?i)notification.*saying\s+["']?(.+?)["']?\s*$"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("notify pattern is valid"))
    .collect()
});

/// Scan free text for imperative UI-action phrasing.
///
/// Returns at most one action per category. Text containing a hedge marker
/// yields nothing: "Try: 'change background to blue'" is help text, not a
/// command.
pub fn scan(text: &str) -> Vec<UiAction> {
    let lower = text.to_lowercase();

    if HEDGE_MARKERS.iter().any(|m| lower.contains(m)) {
        return Vec::new();
    }

    let mut actions = Vec::new();

    for pattern in COLOR_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&lower) {
            let color = &caps[1];
            if KNOWN_COLORS.contains(&color) {
                actions.push(UiAction::ChangeBackgroundColor {
                    color: color.to_string(),
                });
                break;
            }
        }
    }

    if lower.contains("light theme")
        || lower.contains("light mode")
        || lower.contains("change_theme('light')")
        || lower.contains("change_theme(\"light\")")
    {
        actions.push(UiAction::ChangeTheme { theme: Theme::Light });
    } else if lower.contains("dark theme")
        || lower.contains("dark mode")
        || lower.contains("change_theme('dark')")
        || lower.contains("change_theme(\"dark\")")
    {
        actions.push(UiAction::ChangeTheme { theme: Theme::Dark });
    }

    for pattern in NOTIFY_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            actions.push(UiAction::ShowNotification {
                message: caps[1].to_string(),
                level: NotificationLevel::Success,
            });
            break;
        }
    }

    if lower.contains("reset_ui") || (lower.contains("reset") && lower.contains("ui")) {
        actions.push(UiAction::ResetUi);
    }

    actions
}
