use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Move a list cursor by `offset`, clamped to `0..len`.
pub(crate) fn step_selection(current: usize, len: usize, offset: isize) -> usize {
    if len == 0 {
        return 0;
    }
    let target = current as isize + offset;
    target.clamp(0, len as isize - 1) as usize
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Strip the quotes terminals add around dragged-in paths.
pub(crate) fn clean_path_input(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn step_selection_clamps() {
        assert_eq!(step_selection(0, 0, 3), 0);
        assert_eq!(step_selection(2, 5, -5), 0);
        assert_eq!(step_selection(2, 5, 10), 4);
        assert_eq!(step_selection(1, 5, 1), 2);
    }

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = anyhow!("disk full").context("Book not added");
        assert_eq!(surface_error(&err), "disk full");
    }

    #[test]
    fn quoted_paths_are_cleaned() {
        assert_eq!(clean_path_input("  '/tmp/My Book.pdf' "), "/tmp/My Book.pdf");
        assert_eq!(clean_path_input("\"/a.epub\""), "/a.epub");
    }
}
