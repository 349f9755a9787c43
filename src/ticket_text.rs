// Keyword classification of a page's text lines into ticket records

use serde::Serialize;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Fields picked out of one ticket's text. Absent fields are omitted from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TicketInfo {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl TicketInfo {
    fn is_empty(&self) -> bool {
        *self == TicketInfo::default()
    }
}

/// Split page text into ticket records.
///
/// A line holding both `Adult` and `Age` opens a new record; other lines
/// fill fields of the current one, first matching rule wins and later lines
/// overwrite earlier ones. Lines before the first opener form a record of
/// their own when they match anything.
pub fn parse_ticket_text(text: &str) -> Vec<TicketInfo> {
    let mut tickets = Vec::new();
    let mut current = TicketInfo::default();

    for line in text.lines().map(str::trim) {
        if line.contains("Adult") && line.contains("Age") {
            if !current.is_empty() {
                tickets.push(std::mem::take(&mut current));
            }
            current.kind = Some(line.to_string());
        } else if line.contains('@') && line.contains('.') {
            current.email = Some(line.to_string());
        } else if line.contains('€') || line.contains('$') {
            current.price = Some(line.to_string());
        } else if line.starts_with("A-") && line.chars().count() < 15 {
            current.ticket_id = Some(line.to_string());
        } else if line.contains("Awaiting Payment") || line.contains("Confirmed") {
            current.status = Some(line.to_string());
        } else if MONTHS.iter().any(|month| line.contains(month)) {
            current.date = Some(line.to_string());
        }
    }

    if !current.is_empty() {
        tickets.push(current);
    }
    tickets
}
