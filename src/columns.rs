use serde::Serialize;
use serde_json::{Map, Value};

use crate::record::{display_text, VisitorRecord, ID_FIELD, IMAGE_FIELD};

const ROW_NUMBER_WIDTH: u32 = 40;
const IMAGE_WIDTH: u32 = 50;
const MIN_COLUMN_WIDTH: u32 = 120;
const PER_CHAR_WIDTH: u32 = 8;
const WIDTH_PADDING: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellRenderer {
    /// Synthetic leading `#` column showing the grid row index.
    RowNumber,
    Text,
    /// Round photo thumbnail built from the row's public image URL.
    Image,
    /// Trailing per-row delete button; the UI must confirm before calling
    /// the delete operation.
    Actions,
}

/// Grid column definition, serializable straight into the grid widget's
/// column API. Derived fresh from the row set on every change, never
/// persisted or diffed.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub header_name: String,
    pub renderer: CellRenderer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    pub flex: bool,
    pub sortable: bool,
    pub filter: bool,
    pub editable: bool,
    pub suppress_movable: bool,
}

/// Derives the column list from a sampled row set. Key order comes from
/// the first record only; an empty row set yields no columns at all so the
/// grid never renders a schema out of nothing.
pub fn derive_columns(rows: &[VisitorRecord], edit_mode: bool) -> Vec<ColumnDef> {
    if rows.is_empty() {
        return Vec::new();
    }
    let sampled: Vec<Map<String, Value>> = rows.iter().map(VisitorRecord::to_row).collect();

    let mut defs = vec![row_number_column()];
    for key in sampled[0].keys() {
        if key == ID_FIELD {
            continue;
        }
        if key == IMAGE_FIELD {
            defs.push(image_column());
            continue;
        }
        defs.push(text_column(key.as_str(), sampled.as_slice(), edit_mode));
    }
    if edit_mode {
        defs.push(actions_column());
    }
    defs
}

fn row_number_column() -> ColumnDef {
    ColumnDef {
        field: None,
        header_name: "#".to_string(),
        renderer: CellRenderer::RowNumber,
        width: Some(ROW_NUMBER_WIDTH),
        min_width: None,
        flex: false,
        sortable: false,
        filter: false,
        editable: false,
        suppress_movable: true,
    }
}

fn image_column() -> ColumnDef {
    ColumnDef {
        field: Some(IMAGE_FIELD.to_string()),
        header_name: "Photo".to_string(),
        renderer: CellRenderer::Image,
        width: Some(IMAGE_WIDTH),
        min_width: None,
        flex: false,
        sortable: false,
        filter: false,
        // Photos only change through re-registration, not cell edits.
        editable: false,
        suppress_movable: false,
    }
}

fn text_column(key: &str, sampled: &[Map<String, Value>], edit_mode: bool) -> ColumnDef {
    let longest = sampled
        .iter()
        .map(|row| display_text(row.get(key)).chars().count() as u32)
        .max()
        .unwrap_or(0);
    let estimated = longest * PER_CHAR_WIDTH + WIDTH_PADDING;

    ColumnDef {
        field: Some(key.to_string()),
        header_name: header_label(key),
        renderer: CellRenderer::Text,
        width: None,
        min_width: Some(estimated.max(MIN_COLUMN_WIDTH)),
        flex: true,
        sortable: true,
        filter: true,
        editable: edit_mode,
        suppress_movable: false,
    }
}

fn actions_column() -> ColumnDef {
    ColumnDef {
        field: None,
        header_name: "Actions".to_string(),
        renderer: CellRenderer::Actions,
        width: None,
        min_width: Some(MIN_COLUMN_WIDTH),
        flex: false,
        sortable: false,
        filter: false,
        editable: false,
        suppress_movable: false,
    }
}

/// `full_name` -> `Full Name`.
fn header_label(key: &str) -> String {
    key.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
