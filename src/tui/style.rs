//! Color constants and auto-scaling helpers for the monitor.

use ratatui::style::Color;

/// Grid cost line color.
pub const COST_COLOR: Color = Color::Cyan;
/// Building that bought grid energy this hour.
pub const BUYING: Color = Color::Red;
/// Building that covered its demand locally.
pub const SELF_SUFFICIENT: Color = Color::Green;
/// Transfer matrix cells that moved energy.
pub const TRANSFER_ACTIVE: Color = Color::Yellow;
/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text and idle cells.
pub const FOOTER_FG: Color = Color::DarkGray;

/// Returns the flag color for a building.
pub fn purchase_color(buying: bool) -> Color {
    if buying { BUYING } else { SELF_SUFFICIENT }
}

/// Computes Y-axis bounds with 10% padding, anchored at zero.
///
/// Grid cost is never negative, so the lower bound stays at 0.
pub fn auto_bounds_y(points: &[(f64, f64)]) -> [f64; 2] {
    let max = points
        .iter()
        .map(|&(_, y)| y)
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return [0.0, 1.0];
    }
    [0.0, max.max(0.01) * 1.1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_pad_the_maximum() {
        let bounds = auto_bounds_y(&[(0.0, 0.5), (1.0, 2.0)]);
        assert_eq!(bounds[0], 0.0);
        assert!((bounds[1] - 2.2).abs() < 1e-12);
    }

    #[test]
    fn bounds_for_empty_or_flat_data() {
        assert_eq!(auto_bounds_y(&[]), [0.0, 1.0]);
        assert!(auto_bounds_y(&[(0.0, 0.0)])[1] > 0.0);
    }

    #[test]
    fn purchase_flag_colors() {
        assert_eq!(purchase_color(true), BUYING);
        assert_eq!(purchase_color(false), SELF_SUFFICIENT);
    }
}
