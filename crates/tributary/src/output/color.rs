//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Anchor:      bold cyan
//!   - Upstream:    blue
//!   - Downstream:  green
//!   - Flow/Focus:  magenta
//!   - Ghost:       dimmed
//!   - Warning:     yellow
//!   - Error:       red

use crate::domain::VisibilityReason;
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Apply semantic "info" color (cyan) to text.
pub fn info(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.cyan().to_string()
}

/// Apply dimmed style to text.
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text.
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

/// Marker shown before a node, with ASCII fallback.
pub(crate) fn reason_icon(reason: VisibilityReason, config: &OutputConfig) -> &'static str {
    if config.use_ascii {
        match reason {
            VisibilityReason::Anchor => "*",
            VisibilityReason::Upstream => "<",
            VisibilityReason::Downstream => ">",
            VisibilityReason::FlowMember => "#",
            VisibilityReason::FocusStretch => "@",
            VisibilityReason::AdjacentButExcluded => "o",
        }
    } else {
        match reason {
            VisibilityReason::Anchor => "●",
            VisibilityReason::Upstream => "◀",
            VisibilityReason::Downstream => "▶",
            VisibilityReason::FlowMember => "◆",
            VisibilityReason::FocusStretch => "◎",
            VisibilityReason::AdjacentButExcluded => "○",
        }
    }
}

/// Apply the reason's color to `text`.
pub(crate) fn colorize_reason(text: &str, reason: VisibilityReason, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    match reason {
        VisibilityReason::Anchor => text.cyan().bold().to_string(),
        VisibilityReason::Upstream => text.blue().to_string(),
        VisibilityReason::Downstream => text.green().to_string(),
        VisibilityReason::FlowMember | VisibilityReason::FocusStretch => {
            text.magenta().to_string()
        }
        VisibilityReason::AdjacentButExcluded => text.dimmed().to_string(),
    }
}

/// Colored marker for a node.
pub(crate) fn colored_reason_icon(reason: VisibilityReason, config: &OutputConfig) -> String {
    colorize_reason(reason_icon(reason, config), reason, config)
}

/// Arrow between nodes on a path.
pub(crate) fn arrow(config: &OutputConfig) -> &'static str {
    if config.use_ascii { "->" } else { "→" }
}

/// Horizontal rule character.
pub(crate) fn rule(config: &OutputConfig) -> &'static str {
    if config.use_ascii { "-" } else { "─" }
}
