//! Text renderers. Both views read the same inputs (the habit collection,
//! today's key and the current week strip) and never touch the store.

use crate::calendar::{GridCell, MonthGrid, WEEKDAY_HEADERS};
use crate::date_key::DateKey;
use crate::edit_window::{EditWindow, classify_at};
use crate::models::{DaySummary, Habit};

/// Terminals narrower than this get the compact view.
pub const WIDE_MIN_COLUMNS: usize = 72;

const TITLE_WIDTH: usize = 24;

const SUMMARY_TEMPLATE: &str = "{{DATE}}  {{DONE}}/{{TOTAL}} done ({{RATE}}%)";

pub trait HabitView {
    fn name(&self) -> &'static str;

    fn render(&self, habits: &[Habit], today: &DateKey, week: &[DateKey; 7]) -> String;
}

/// One line per habit, today only.
pub struct CompactView;

/// A Monday-first table of the whole week.
pub struct WideView;

pub fn select_view(columns: usize) -> Box<dyn HabitView> {
    if columns >= WIDE_MIN_COLUMNS {
        Box::new(WideView)
    } else {
        Box::new(CompactView)
    }
}

pub fn render_summary(today: &DateKey, summary: &DaySummary) -> String {
    SUMMARY_TEMPLATE
        .replace("{{DATE}}", today.as_str())
        .replace("{{DONE}}", &summary.completed.to_string())
        .replace("{{TOTAL}}", &summary.total.to_string())
        .replace("{{RATE}}", &summary.completion_rate.to_string())
}

impl HabitView for CompactView {
    fn name(&self) -> &'static str {
        "compact"
    }

    fn render(&self, habits: &[Habit], today: &DateKey, _week: &[DateKey; 7]) -> String {
        let mut out = render_summary(today, &DaySummary::of(habits, today));
        out.push('\n');
        if habits.is_empty() {
            out.push_str("No habits yet.\n");
            return out;
        }
        for habit in habits {
            let mark = if habit.is_completed(today) { 'x' } else { ' ' };
            out.push_str(&format!("[{mark}] {}  ({})\n", habit.title, habit.id));
        }
        out
    }
}

impl HabitView for WideView {
    fn name(&self) -> &'static str {
        "wide"
    }

    fn render(&self, habits: &[Habit], today: &DateKey, week: &[DateKey; 7]) -> String {
        let mut out = render_summary(today, &DaySummary::of(habits, today));
        out.push('\n');

        let mut header = format!("{:<TITLE_WIDTH$}", "Habit");
        for (label, key) in WEEKDAY_HEADERS.iter().zip(week) {
            let marker = if key == today { '*' } else { ' ' };
            header.push_str(&format!(" {label}{marker}"));
        }
        out.push_str(header.trim_end());
        out.push('\n');

        if habits.is_empty() {
            out.push_str("No habits yet.\n");
            return out;
        }

        for habit in habits {
            let mut row = format!("{:<TITLE_WIDTH$}", fit(&habit.title, TITLE_WIDTH));
            for key in week {
                let cell = match classify_at(key, today) {
                    EditWindow::Future => ' ',
                    _ if habit.is_completed(key) => 'x',
                    _ => '.',
                };
                row.push_str(&format!("  {cell}  "));
            }
            out.push_str(row.trim_end());
            out.push('\n');
        }
        out
    }
}

/// Month grid with Monday-first headers; today is bracketed.
pub fn render_month(grid: &MonthGrid) -> String {
    let mut out = format!("{}\n", grid.cursor.label());
    let header: String = WEEKDAY_HEADERS.iter().map(|day| format!("{day:<4}")).collect();
    out.push_str(header.trim_end());
    out.push('\n');

    for week in grid.weeks() {
        let row: String = week
            .iter()
            .map(|cell| match cell {
                GridCell::Blank => "    ".to_string(),
                GridCell::Day { day, is_today: true, .. } => format!("[{day:>2}]"),
                GridCell::Day { day, .. } => format!("{day:>3} "),
            })
            .collect();
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

fn fit(title: &str, width: usize) -> String {
    if title.chars().count() <= width {
        return title.to_string();
    }
    let mut cut: String = title.chars().take(width - 1).collect();
    cut.push('~');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{MonthCursor, build_month_grid_at, build_week_strip};

    fn key(y: i32, m: u32, d: u32) -> DateKey {
        DateKey::from_ymd(y, m, d).unwrap()
    }

    fn sample() -> (Vec<Habit>, DateKey, [DateKey; 7]) {
        let today = key(2025, 6, 11);
        let mut read = Habit::new("h1", "Read");
        read.logs.insert(key(2025, 6, 9), true);
        read.logs.insert(today.clone(), true);
        let run = Habit::new("h2", "Run");
        let week = build_week_strip(today.date());
        (vec![read, run], today, week)
    }

    #[test]
    fn width_picks_the_view() {
        assert_eq!(select_view(40).name(), "compact");
        assert_eq!(select_view(WIDE_MIN_COLUMNS).name(), "wide");
        assert_eq!(select_view(200).name(), "wide");
    }

    #[test]
    fn compact_lists_today_only() {
        let (habits, today, week) = sample();
        let text = CompactView.render(&habits, &today, &week);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2025-06-11  1/2 done (50%)");
        assert_eq!(lines[1], "[x] Read  (h1)");
        assert_eq!(lines[2], "[ ] Run  (h2)");
    }

    #[test]
    fn wide_marks_past_today_and_future() {
        let (habits, today, week) = sample();
        let text = WideView.render(&habits, &today, &week);
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[1].starts_with("Habit"));
        assert!(lines[1].contains("Wed*"));
        let cells = |line: &str| -> Vec<char> {
            line[TITLE_WIDTH..].chars().filter(|c| !c.is_whitespace()).collect()
        };
        // Mon done, Tue missed, Wed (today) done, rest not yet reachable.
        assert_eq!(cells(lines[2]), ['x', '.', 'x']);
        assert_eq!(cells(lines[3]), ['.', '.', '.']);
    }

    #[test]
    fn both_views_handle_an_empty_collection() {
        let (_, today, week) = sample();
        assert!(CompactView.render(&[], &today, &week).contains("No habits yet."));
        assert!(WideView.render(&[], &today, &week).contains("0/0 done (0%)"));
    }

    #[test]
    fn long_titles_are_cut() {
        assert_eq!(fit("Short", 10), "Short");
        assert_eq!(fit("Meditate for twenty minutes", 10), "Meditate ~");
    }

    #[test]
    fn month_grid_text() {
        let grid = build_month_grid_at(MonthCursor::new(2025, 6).unwrap(), &key(2025, 6, 10));
        let text = render_month(&grid);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "June 2025");
        assert_eq!(lines[1], "Mon Tue Wed Thu Fri Sat Sun");
        // June 2025 starts on a Sunday.
        assert_eq!(lines[2].trim_start(), "1");
        assert_eq!(lines[2].len(), 27);
        assert_eq!(lines[4], "  9 [10] 11  12  13  14  15");
        assert_eq!(lines.len(), 2 + grid.weeks().len());
    }
}
