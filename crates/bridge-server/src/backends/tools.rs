//! Built-in tools advertised to the model.
//!
//! Tool invocations return a tagged [`ToolOutput`] rather than encoding
//! their kind into the result string, so UI actions and renderable
//! components are matched structurally instead of parsed back out of text.

use crate::actions::{NotificationLevel, Theme, UiAction};
use crate::error::ToolError;
use crate::llm::ToolSpec;
use bridge_core::JsonValue;
use serde_json::json;

/// What a tool produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Plain text for the model to read.
    Text(String),
    /// A frontend action; the model sees a confirmation string.
    UiAction(UiAction),
    /// Rich data the frontend renders as a named component.
    Component { name: &'static str, data: JsonValue },
}

impl ToolOutput {
    /// Text representation fed back to the model and reported as the tool
    /// call result. Components serialize as tagged JSON so a frontend can
    /// detect them without string-prefix conventions.
    pub fn result_text(&self) -> String {
        match self {
            ToolOutput::Text(text) => text.clone(),
            ToolOutput::UiAction(action) => action.confirmation(),
            ToolOutput::Component { name, data } => {
                json!({"component": name, "data": data}).to_string()
            }
        }
    }
}

/// Registry of the built-in tool set.
pub struct ToolRegistry {
    specs: Vec<ToolSpec>,
}

impl ToolRegistry {
    /// The full built-in set: utility tools plus the UI control tools.
    pub fn builtin() -> Self {
        let string_arg = |name: &str, description: &str| {
            json!({
                "type": "object",
                "properties": {name: {"type": "string", "description": description}},
                "required": [name]
            })
        };

        let specs = vec![
            ToolSpec::function(
                "calculator",
                "Evaluate a mathematical expression. Examples: \"2 + 2\", \"10 * 5\", \"100 / 4\"",
                string_arg("expression", "Arithmetic expression to evaluate"),
            ),
            ToolSpec::function(
                "web_search",
                "Search the web for information (simulated).",
                string_arg("query", "Search query"),
            ),
            ToolSpec::function(
                "get_current_time",
                "Get the current date and time.",
                json!({"type": "object", "properties": {}}),
            ),
            ToolSpec::function(
                "get_weather",
                "Get current weather for a location, rendered as a weather card.",
                string_arg("location", "City name, e.g. \"New York\", \"Mumbai\", \"London\""),
            ),
            ToolSpec::function(
                "change_background_color",
                "Change the background color of the application UI.",
                string_arg("color", "Color name like 'blue', 'red', 'green'"),
            ),
            ToolSpec::function(
                "change_theme",
                "Switch the application theme between dark and light mode.",
                string_arg("theme", "Either 'dark' or 'light'"),
            ),
            ToolSpec::function(
                "show_notification",
                "Show a notification message to the user in the UI.",
                json!({
                    "type": "object",
                    "properties": {
                        "message": {"type": "string", "description": "Notification text"},
                        "notification_type": {
                            "type": "string",
                            "description": "One of 'info', 'success', 'warning', 'error'"
                        }
                    },
                    "required": ["message"]
                }),
            ),
            ToolSpec::function(
                "reset_ui",
                "Reset the UI to its default state.",
                json!({"type": "object", "properties": {}}),
            ),
        ];
        Self { specs }
    }

    /// Tool declarations for the chat API request.
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Run a tool by name with JSON arguments.
    pub fn invoke(&self, name: &str, args: &JsonValue) -> Result<ToolOutput, ToolError> {
        let str_arg = |key: &str| -> Result<String, ToolError> {
            args.get(key)
                .and_then(JsonValue::as_str)
                .map(str::to_string)
                .ok_or_else(|| ToolError::InvalidArgs(format!("missing '{key}'")))
        };

        match name {
            "calculator" => {
                let expression = str_arg("expression")?;
                let value = evaluate(&expression)
                    .map_err(|reason| ToolError::Failed(format!("{reason} in '{expression}'")))?;
                Ok(ToolOutput::Text(format!("Result: {}", format_number(value))))
            }
            "web_search" => Ok(ToolOutput::Text(web_search(&str_arg("query")?))),
            "get_current_time" => Ok(ToolOutput::Text(format!(
                "Current time: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            ))),
            "get_weather" => {
                let location = str_arg("location")?;
                Ok(ToolOutput::Component {
                    name: "WeatherCard",
                    data: weather_for(&location),
                })
            }
            "change_background_color" => Ok(ToolOutput::UiAction(
                UiAction::ChangeBackgroundColor {
                    color: str_arg("color")?,
                },
            )),
            "change_theme" => {
                // Unexpected values default to dark rather than failing.
                let theme = match str_arg("theme")?.to_lowercase().as_str() {
                    "light" => Theme::Light,
                    _ => Theme::Dark,
                };
                Ok(ToolOutput::UiAction(UiAction::ChangeTheme { theme }))
            }
            "show_notification" => {
                let message = str_arg("message")?;
                let level = args
                    .get("notification_type")
                    .and_then(JsonValue::as_str)
                    .map(NotificationLevel::parse_lenient)
                    .unwrap_or(NotificationLevel::Info);
                Ok(ToolOutput::UiAction(UiAction::ShowNotification {
                    message,
                    level,
                }))
            }
            "reset_ui" => Ok(ToolOutput::UiAction(UiAction::ResetUi)),
            _ => Err(ToolError::UnknownTool),
        }
    }
}

/// Mock web search, keyed on a few known topics.
fn web_search(query: &str) -> String {
    let query_lower = query.to_lowercase();
    if query_lower.contains("rust") {
        "Rust is a systems programming language focused on safety and performance.".to_string()
    } else if query_lower.contains("python") {
        "Python is a high-level programming language known for its simplicity and readability."
            .to_string()
    } else if query_lower.contains("ai") {
        "Artificial Intelligence (AI) is the simulation of human intelligence by machines."
            .to_string()
    } else {
        format!("Search results for '{query}': Found 3 relevant articles about this topic.")
    }
}

/// Mock weather data with location-keyed variations.
fn weather_for(location: &str) -> JsonValue {
    let loc_lower = location.to_lowercase();
    let (temperature, condition, humidity, wind, feels_like, is_day) =
        if loc_lower.contains("mumbai") {
            (32, "Humid", 85, 8, 38, false)
        } else if loc_lower.contains("london") {
            (15, "Cloudy", 60, 18, 14, true)
        } else if loc_lower.contains("new york") {
            (18, "Partly Cloudy", 55, 22, 17, true)
        } else if loc_lower.contains("snow") || loc_lower.contains("antarctica") {
            (-5, "Snowy", 80, 30, -12, true)
        } else if loc_lower.contains("rain") {
            (20, "Rainy", 90, 15, 19, false)
        } else {
            (22, "Sunny", 45, 12, 24, true)
        };

    json!({
        "location": title_case(location),
        "temperature": temperature,
        "condition": condition,
        "humidity": humidity,
        "windSpeed": wind,
        "feelsLike": feels_like,
        "isDay": is_day,
    })
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Evaluate an arithmetic expression.
///
/// Recursive-descent over `+ - * /`, unary minus and parentheses. Anything
/// else is rejected.
fn evaluate(expression: &str) -> Result<f64, &'static str> {
    let mut parser = Parser {
        input: expression.as_bytes(),
        pos: 0,
    };
    let value = parser.expr()?;
    parser.skip_whitespace();
    if parser.pos != parser.input.len() {
        return Err("unexpected trailing input");
    }
    if !value.is_finite() {
        return Err("non-finite result");
    }
    Ok(value)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn skip_whitespace(&mut self) {
        while self.input.get(self.pos) == Some(&b' ') {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.input.get(self.pos).copied()
    }

    fn expr(&mut self) -> Result<f64, &'static str> {
        let mut value = self.term()?;
        while let Some(op @ (b'+' | b'-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            if op == b'+' {
                value += rhs;
            } else {
                value -= rhs;
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, &'static str> {
        let mut value = self.factor()?;
        while let Some(op @ (b'*' | b'/')) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            if op == b'*' {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err("division by zero");
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, &'static str> {
        match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some(b'(') => {
                self.pos += 1;
                let value = self.expr()?;
                if self.peek() != Some(b')') {
                    return Err("unbalanced parentheses");
                }
                self.pos += 1;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == b'.' => self.number(),
            _ => Err("expected a number"),
        }
    }

    fn number(&mut self) -> Result<f64, &'static str> {
        let start = self.pos;
        while matches!(self.input.get(self.pos), Some(c) if c.is_ascii_digit() || *c == b'.') {
            self.pos += 1;
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or("invalid number")
    }
}
