//! Text rendering of the roster view.

use client_core::{RosterEvent, RosterState, RosterView};
use shared::domain::UserRecord;

const HEADERS: [&str; 4] = ["Name", "Email", "Referrals", "Actions"];

fn action_label(view: &RosterView, user: &UserRecord) -> &'static str {
    if view.is_deleting(&user.id) {
        "Deleting..."
    } else {
        "Delete"
    }
}

pub fn render_view(view: &RosterView) -> String {
    let users = match &view.roster {
        RosterState::Loaded(users) => users,
        RosterState::Unloaded => {
            return match (&view.error, view.loading) {
                (_, true) => "Loading...".to_string(),
                (Some(error), false) => format!("Error: {error}"),
                (None, false) => "No users loaded.".to_string(),
            };
        }
    };

    let rows: Vec<[String; 4]> = users
        .iter()
        .map(|user| {
            [
                user.display_name.clone(),
                user.email.clone(),
                user.referral_count.to_string(),
                action_label(view, user).to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::from("Admin Page\n");
    out.push_str(&format_row(&HEADERS.map(str::to_string), &widths));
    out.push_str(
        &widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    if rows.is_empty() {
        out.push_str("(no users)\n");
    }
    for row in &rows {
        out.push_str(&format_row(row, &widths));
    }
    if let Some(error) = &view.error {
        out.push_str(&format!("Error: {error}\n"));
    }
    out
}

fn format_row(cells: &[String; 4], widths: &[usize; 4]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("{}\n", line.trim_end())
}

/// One-line progress note for an event, if it is worth printing.
pub fn describe_event(event: &RosterEvent) -> Option<String> {
    match event {
        RosterEvent::PendingChanged {
            user_id,
            pending: true,
        } => Some(format!("Deleting {user_id}...")),
        RosterEvent::RosterInvalidated => Some("Roster changed; reloading".to_string()),
        RosterEvent::Error(message) => Some(format!("Error: {message}")),
        RosterEvent::PendingChanged { pending: false, .. } | RosterEvent::RosterLoaded { .. } => {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use shared::domain::UserId;

    use super::*;

    fn ann() -> UserRecord {
        UserRecord {
            id: UserId::new("1"),
            display_name: "Ann".to_string(),
            email: "a@x.com".to_string(),
            referral_count: 0,
        }
    }

    #[test]
    fn unloaded_view_shows_loading_then_error() {
        let mut view = RosterView {
            loading: true,
            ..RosterView::default()
        };
        assert_eq!(render_view(&view), "Loading...");

        view.loading = false;
        view.error = Some("Failed to fetch users (HTTP 404)".to_string());
        assert_eq!(render_view(&view), "Error: Failed to fetch users (HTTP 404)");
    }

    #[test]
    fn renders_rows_with_pending_label() {
        let view = RosterView {
            roster: RosterState::Loaded(vec![ann()]),
            pending: BTreeSet::from([UserId::new("1")]),
            error: None,
            loading: false,
        };
        let rendered = render_view(&view);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Admin Page");
        assert_eq!(lines[1], "Name | Email   | Referrals | Actions");
        assert_eq!(lines[3], "Ann  | a@x.com | 0         | Deleting...");
    }

    #[test]
    fn loaded_view_keeps_table_and_appends_error() {
        let view = RosterView {
            roster: RosterState::Loaded(vec![ann()]),
            pending: BTreeSet::new(),
            error: Some("Failed to delete user (HTTP 500)".to_string()),
            loading: false,
        };
        let rendered = render_view(&view);
        assert!(rendered.contains("| Delete\n"));
        assert!(rendered.ends_with("Error: Failed to delete user (HTTP 500)\n"));
    }

    #[test]
    fn empty_roster_says_so() {
        let view = RosterView {
            roster: RosterState::Loaded(Vec::new()),
            ..RosterView::default()
        };
        assert!(render_view(&view).contains("(no users)"));
    }

    #[test]
    fn describes_only_user_facing_events() {
        assert_eq!(
            describe_event(&RosterEvent::PendingChanged {
                user_id: UserId::new("7"),
                pending: true,
            }),
            Some("Deleting 7...".to_string())
        );
        assert_eq!(describe_event(&RosterEvent::RosterLoaded { count: 3 }), None);
    }
}
