//! Pure rendering helpers for the countdown screen.
//!
//! No state and no IO here; the session decides where the lines go.

/// Fallback terminal size when the real one is unavailable.
pub const DEFAULT_WIDTH: u16 = 80;
pub const DEFAULT_HEIGHT: u16 = 24;

const GLYPH_HEIGHT: usize = 5;

/// Format a remaining-seconds value as zero-padded `HH:MM:SS`.
///
/// Negative values (overtime) render the absolute value prefixed with `-`.
/// Total over all of `i64`.
pub fn format_remaining(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let s = seconds.unsigned_abs();
    let h = s / 3600;
    let m = (s % 3600) / 60;
    let sec = s % 60;
    format!("{sign}{h:02}:{m:02}:{sec:02}")
}

/// Lay out one frame: the stylized time block centered in `width` x `height`
/// with the task name on the line below.
///
/// Degrades to a plain single-line time when the terminal is narrower than
/// the block font. Never fails.
pub fn render_frame(
    formatted_time: &str,
    task_name: &str,
    width: u16,
    height: u16,
) -> Vec<String> {
    let width = width as usize;
    let big = big_time_lines(formatted_time);
    let block_width = big.first().map(|l| l.chars().count()).unwrap_or(0);

    let mut body: Vec<String> = if block_width <= width {
        big.iter().map(|l| center_line(l, width)).collect()
    } else {
        vec![center_line(formatted_time, width)]
    };
    body.push(String::new());
    body.push(center_line(task_name, width));

    let pad_top = (height as usize).saturating_sub(body.len()) / 2;
    let mut lines = vec![String::new(); pad_top];
    lines.extend(body);
    lines
}

pub(crate) fn center_line(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let pad = width.saturating_sub(len) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

fn big_time_lines(text: &str) -> Vec<String> {
    let mut rows = vec![String::new(); GLYPH_HEIGHT];
    for (i, c) in text.chars().enumerate() {
        let g = glyph(c);
        for (row, line) in rows.iter_mut().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            line.push_str(g[row]);
        }
    }
    rows
}

fn glyph(c: char) -> [&'static str; GLYPH_HEIGHT] {
    match c {
        '0' => ["█████", "█   █", "█   █", "█   █", "█████"],
        '1' => ["    █", "    █", "    █", "    █", "    █"],
        '2' => ["█████", "    █", "█████", "█    ", "█████"],
        '3' => ["█████", "    █", "█████", "    █", "█████"],
        '4' => ["█   █", "█   █", "█████", "    █", "    █"],
        '5' => ["█████", "█    ", "█████", "    █", "█████"],
        '6' => ["█████", "█    ", "█████", "█   █", "█████"],
        '7' => ["█████", "    █", "    █", "    █", "    █"],
        '8' => ["█████", "█   █", "█████", "█   █", "█████"],
        '9' => ["█████", "█   █", "█████", "    █", "█████"],
        ':' => ["   ", " █ ", "   ", " █ ", "   "],
        '-' => ["     ", "     ", "█████", "     ", "     "],
        _ => ["     ", "     ", "     ", "     ", "     "],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parse `HH:MM:SS` back into seconds, honoring a leading minus.
    fn parse_hms(text: &str) -> i64 {
        let (sign, rest) = match text.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, text),
        };
        let parts: Vec<i64> = rest.split(':').map(|p| p.parse().unwrap()).collect();
        sign * (parts[0] * 3600 + parts[1] * 60 + parts[2])
    }

    #[test]
    fn format_zero_padded() {
        assert_eq!(format_remaining(0), "00:00:00");
        assert_eq!(format_remaining(59), "00:00:59");
        assert_eq!(format_remaining(61), "00:01:01");
        assert_eq!(format_remaining(3661), "01:01:01");
    }

    #[test]
    fn format_negative_carries_marker() {
        assert_eq!(format_remaining(-1), "-00:00:01");
        assert_eq!(format_remaining(-3600), "-01:00:00");
    }

    #[test]
    fn format_round_trips() {
        for s in [0, 1, 59, 60, 3599, 3600, 86399, -1, -59, -3600, -86399] {
            let text = format_remaining(s);
            assert_eq!(parse_hms(&text), s, "round trip failed for {s}");
            assert_eq!(text.starts_with('-'), s < 0);
        }
    }

    #[test]
    fn format_is_total_at_extremes() {
        // Must not panic, even at i64::MIN where plain abs() would.
        let _ = format_remaining(i64::MIN);
        let _ = format_remaining(i64::MAX);
    }

    #[test]
    fn frame_centers_block_and_task_name() {
        let lines = render_frame("00:01:30", "Write report", DEFAULT_WIDTH, DEFAULT_HEIGHT);
        // Top padding, five block rows, a blank line, the task name.
        assert!(lines.len() > GLYPH_HEIGHT + 2);
        let task_line = lines.last().unwrap();
        assert!(task_line.contains("Write report"));
        assert!(task_line.starts_with(' '));
    }

    #[test]
    fn frame_degrades_on_narrow_terminal() {
        let lines = render_frame("00:01:30", "task", 12, 5);
        // No block rows fit in 12 columns; a single plain time line is drawn.
        assert!(lines.iter().any(|l| l.contains("00:01:30")));
        assert!(lines.iter().all(|l| !l.contains('█')));
    }

    #[test]
    fn frame_block_rows_share_width() {
        let lines = render_frame("18:59:09", "t", 200, 40);
        let block: Vec<&String> = lines.iter().filter(|l| l.contains('█')).collect();
        assert_eq!(block.len(), GLYPH_HEIGHT);
    }

    #[test]
    fn center_line_never_underflows() {
        assert_eq!(center_line("wider than width", 4), "wider than width");
    }
}
