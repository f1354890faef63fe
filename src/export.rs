use crate::error::{Result, VisitorError};
use crate::record::VisitorRecord;

/// What the UI layer knows about where it is running. Export is only
/// offered on Windows desktops and mobile browsers.
#[derive(Debug, Clone, Default)]
pub struct ClientEnvironment {
    pub platform: String,
    pub user_agent: String,
}

type FieldGetter = fn(&VisitorRecord) -> Option<&str>;

/// Exported sheet layout: label and source field, in column order.
const EXPORT_COLUMNS: [(&str, FieldGetter); 13] = [
    ("Name", |v| v.full_name.as_deref()),
    ("Phone", |v| v.primary_phone_num.as_deref()),
    ("Address", |v| v.address.as_deref()),
    ("Gender", |v| v.gender.as_deref()),
    ("Age", |v| v.age.as_deref()),
    ("Inviter Name", |v| v.iow_name.as_deref()),
    ("Inviter Phone", |v| v.iow_phone_num.as_deref()),
    ("Follow Up Leader", |v| v.follow_up_leader.as_deref()),
    ("Foundation Status", |v| v.foundation_class_status.as_deref()),
    ("Ministers Status", |v| v.ministers_training_status.as_deref()),
    ("Ministry Joined", |v| v.ministry_joined.as_deref()),
    ("Cell Group Status", |v| v.cell_group_status.as_deref()),
    ("Registered", |v| v.registered_at.as_deref()),
];

pub const EXPORT_FILE_NAME: &str = "visitors.csv";

pub fn export_allowed(environment: &ClientEnvironment) -> bool {
    let is_windows = environment.platform.contains("Win");
    let agent = environment.user_agent.to_lowercase();
    let is_mobile = agent.contains("mobi") || agent.contains("android");
    is_windows || is_mobile
}

/// Renders the row set as a flat labeled-column CSV sheet, or refuses when
/// the environment heuristic says export is unsupported. The actual file
/// download stays in the UI layer.
pub fn export_rows(rows: &[VisitorRecord], environment: &ClientEnvironment) -> Result<String> {
    if !export_allowed(environment) {
        return Err(VisitorError::ExportUnavailable);
    }
    Ok(rows_to_csv(rows))
}

fn rows_to_csv(rows: &[VisitorRecord]) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(rows.len() + 1);
    lines.push(
        EXPORT_COLUMNS
            .iter()
            .map(|(label, _)| csv_escape(label))
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in rows {
        lines.push(
            EXPORT_COLUMNS
                .iter()
                .map(|(_, getter)| csv_escape(getter(row).unwrap_or("")))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

/// Cells starting with a formula character get a leading apostrophe so a
/// spreadsheet opens them as text instead of executing them.
fn neutralize_formula(value: &str) -> String {
    let trimmed = value.trim_start();
    let starts_formula = !trimmed.is_empty()
        && !trimmed.starts_with('\'')
        && matches!(
            trimmed.chars().next(),
            Some('=') | Some('+') | Some('-') | Some('@')
        );
    if starts_formula {
        format!("'{value}")
    } else {
        value.to_string()
    }
}

fn csv_escape(value: &str) -> String {
    let safe = neutralize_formula(value);
    if safe.contains(',') || safe.contains('"') || safe.contains('\n') || safe.contains('\r') {
        format!("\"{}\"", safe.replace('"', "\"\""))
    } else {
        safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windows() -> ClientEnvironment {
        ClientEnvironment {
            platform: "Win32".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0)".to_string(),
        }
    }

    fn mac_desktop() -> ClientEnvironment {
        ClientEnvironment {
            platform: "MacIntel".to_string(),
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X)".to_string(),
        }
    }

    fn android() -> ClientEnvironment {
        ClientEnvironment {
            platform: "Linux armv8l".to_string(),
            user_agent: "Mozilla/5.0 (Linux; Android 14; Mobile)".to_string(),
        }
    }

    #[test]
    fn export_gate_follows_the_platform_heuristic() {
        assert!(export_allowed(&windows()));
        assert!(export_allowed(&android()));
        assert!(!export_allowed(&mac_desktop()));
    }

    #[test]
    fn export_refused_outside_supported_environments() {
        let rows = vec![VisitorRecord::sample(1)];
        assert!(matches!(
            export_rows(&rows, &mac_desktop()),
            Err(VisitorError::ExportUnavailable)
        ));
    }

    #[test]
    fn sheet_has_labeled_header_and_one_line_per_row() {
        let rows = vec![VisitorRecord::sample(1), VisitorRecord::sample(2)];
        let sheet = export_rows(&rows, &windows()).unwrap();
        let lines: Vec<&str> = sheet.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Name,Phone,Address,Gender,Age,"));
        assert!(lines[0].ends_with("Registered"));
        assert!(lines[1].starts_with("Visitor 1,"));
    }

    #[test]
    fn missing_fields_export_as_empty_cells() {
        let mut row = VisitorRecord::sample(1);
        row.address = None;
        let sheet = export_rows(&[row], &windows()).unwrap();
        let data_line = sheet.lines().nth(1).unwrap();
        assert!(data_line.contains(",,"));
    }

    #[test]
    fn csv_escape_quotes_and_doubles() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn formula_prefixes_are_neutralized() {
        assert_eq!(csv_escape("=SUM(A1)"), "'=SUM(A1)");
        assert_eq!(csv_escape("+233241234567"), "'+233241234567");
        assert_eq!(csv_escape("@handle"), "'@handle");
        // Already-quoted cells are left alone.
        assert_eq!(csv_escape("'=ok"), "'=ok");
    }
}
