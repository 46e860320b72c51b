use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Success,
    Failure,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Success => style(text).green(),
        StyleType::Failure => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// A `✓`/`✗` prefixed progress line.
pub fn status_line(ok: bool, text: &str) -> String {
    if ok {
        style_text(&format!("✓ {text}"), StyleType::Success)
    } else {
        style_text(&format!("✗ {text}"), StyleType::Failure)
    }
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right aligned rate, or a red "N/A" when its source failed.
pub fn rate_cell(value: f64, available: bool) -> Cell {
    if available {
        Cell::new(format!("{value:.2}")).set_alignment(CellAlignment::Right)
    } else {
        Cell::new("N/A")
            .fg(Color::Red)
            .set_alignment(CellAlignment::Right)
    }
}

/// Creates a ticking spinner, hidden automatically when stdout is not a terminal.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_prefix() {
        console::set_colors_enabled(false);
        assert_eq!(status_line(true, "BCV rates"), "✓ BCV rates");
        assert_eq!(status_line(false, "BCV rates"), "✗ BCV rates");
    }

    #[test]
    fn test_rate_cell_content() {
        assert_eq!(rate_cell(36.5013, true).content(), "36.50");
        assert_eq!(rate_cell(0.0, false).content(), "N/A");
    }
}
