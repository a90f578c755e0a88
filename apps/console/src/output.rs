use admin_views::{MapMarker, NodeField, SessionField};
use chrono::{DateTime, Utc};
use shared::domain::{Node, Session};

const SESSION_COLUMNS: [SessionField; 7] = [
    SessionField::Key,
    SessionField::Title,
    SessionField::Speakers,
    SessionField::StartsAt,
    SessionField::RedirectTo,
    SessionField::ClickCount,
    SessionField::VideoClickCount,
];

fn format_time(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn format_count(value: Option<u64>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}

fn yes_no(flag: bool) -> String {
    let word = if flag { "yes" } else { "no" };
    word.to_string()
}

fn session_cell(session: &Session, field: SessionField) -> String {
    let counters = session.counters();
    match field {
        SessionField::Key => session.key.to_string(),
        SessionField::Title => session.title.clone(),
        SessionField::Speakers => session.speakers_display(),
        SessionField::RedirectTo => session.redirect_to().unwrap_or_default().to_string(),
        SessionField::StartsAt => format_time(session.starts_at),
        SessionField::EndsAt => format_time(session.ends_at),
        SessionField::CalendarClickCount => format_count(counters.calendar),
        SessionField::ClickCount => format_count(counters.total),
        SessionField::VideoClickCount => format_count(counters.video),
    }
}

fn node_cell(node: &Node, field: NodeField) -> String {
    match field {
        NodeField::Key => node.key.to_string(),
        NodeField::Account => node.account.clone(),
        NodeField::Configured => yes_no(node.configured),
        NodeField::SslConfigured => yes_no(node.ssl_configured),
        NodeField::Timestamp => format_time(node.timestamp),
    }
}

/// Left-aligned columns separated by two spaces.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(headers.to_vec())];
    out.extend(rows.iter().map(|row| line(row.iter().map(String::as_str).collect())));
    out.join("\n")
}

pub fn sessions_table(rows: &[&Session]) -> String {
    let headers = SESSION_COLUMNS.map(SessionField::header);
    let cells = rows
        .iter()
        .map(|session| {
            SESSION_COLUMNS
                .iter()
                .map(|field| session_cell(session, *field))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    render_table(&headers, &cells)
}

pub fn nodes_table(rows: &[&Node]) -> String {
    let headers = NodeField::ALL.map(NodeField::header);
    let cells = rows
        .iter()
        .map(|node| {
            NodeField::ALL
                .iter()
                .map(|field| node_cell(node, *field))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    render_table(&headers, &cells)
}

pub fn markers_list(markers: &[MapMarker]) -> String {
    if markers.is_empty() {
        return "no clicks recorded".to_string();
    }
    markers
        .iter()
        .map(|marker| {
            format!(
                "{} ({:.4}, {:.4})",
                marker.label, marker.latitude, marker.longitude
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
