use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ID_FIELD: &str = "id";
pub const IMAGE_FIELD: &str = "image";

/// One row of the remote `newVisitors` table. Field declaration order is
/// the column order of the remote schema; [`VisitorRecord::to_row`] relies
/// on it when the grid samples the first record for its columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitorRecord {
    pub id: i64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub primary_phone_num: Option<String>,
    #[serde(default)]
    pub secondary_phone_num: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub born_again_date: Option<String>,
    #[serde(default)]
    pub iow_name: Option<String>,
    #[serde(default)]
    pub iow_phone_num: Option<String>,
    #[serde(default)]
    pub follow_up_leader: Option<String>,
    #[serde(default)]
    pub foundation_class_status: Option<String>,
    #[serde(default)]
    pub foundation_class_teacher: Option<String>,
    #[serde(default)]
    pub ministers_training_status: Option<String>,
    #[serde(default)]
    pub ministers_training_teacher: Option<String>,
    #[serde(default)]
    pub ministry_joined: Option<String>,
    #[serde(default)]
    pub cell_group_status: Option<String>,
    #[serde(default)]
    pub assigned_cell_group: Option<String>,
    #[serde(default)]
    pub registered_at: Option<String>,
}

impl VisitorRecord {
    /// Ordered key/value view for the generic schema walk. Declaration
    /// order is preserved by serde_json's `preserve_order` feature.
    pub fn to_row(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Insert payload for the registration path. `id` and `registered_at` are
/// assigned by the server.
#[derive(Debug, Clone, Serialize)]
pub struct NewVisitor {
    pub image: String,
    pub full_name: String,
    pub primary_phone_num: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_phone_num: Option<String>,
    pub address: String,
    pub gender: String,
    pub age: String,
    pub born_again_date: String,
    pub iow_name: String,
    pub iow_phone_num: String,
    pub follow_up_leader: String,
    pub foundation_class_status: String,
    pub foundation_class_teacher: String,
    pub ministers_training_status: String,
    pub ministers_training_teacher: String,
    pub ministry_joined: String,
    pub cell_group_status: String,
    pub assigned_cell_group: String,
}

/// How the web grid stringified cell values; the width heuristic and the
/// CSV export both follow it so numbers and nulls render the same way.
pub fn display_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::Null) | None => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(boolean)) => boolean.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|entry| display_text(Some(entry)))
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
impl VisitorRecord {
    pub(crate) fn sample(id: i64) -> VisitorRecord {
        VisitorRecord {
            id,
            image: Some(format!("https://cdn.example/images/{id}.jpg")),
            full_name: Some(format!("Visitor {id}")),
            primary_phone_num: Some("0241234567".to_string()),
            secondary_phone_num: None,
            address: Some("12 High Street".to_string()),
            gender: Some("M".to_string()),
            age: Some("29".to_string()),
            born_again_date: Some("2025-05-11".to_string()),
            iow_name: Some("Ama".to_string()),
            iow_phone_num: Some("0209876543".to_string()),
            follow_up_leader: Some("Leader A".to_string()),
            foundation_class_status: Some("Enrolled".to_string()),
            foundation_class_teacher: Some("Teacher A".to_string()),
            ministers_training_status: Some("Not Started".to_string()),
            ministers_training_teacher: Some("Teacher B".to_string()),
            ministry_joined: Some("Choir".to_string()),
            cell_group_status: Some("Joined".to_string()),
            assigned_cell_group: Some("Group 4".to_string()),
            registered_at: Some("2025-05-12T09:00:00Z".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_keys_follow_declaration_order() {
        let keys: Vec<String> = VisitorRecord::sample(1).to_row().keys().cloned().collect();
        assert_eq!(keys[0], "id");
        assert_eq!(keys[1], "image");
        assert_eq!(keys[2], "full_name");
        assert_eq!(keys.last().map(String::as_str), Some("registered_at"));
        assert_eq!(keys.len(), 20);
    }

    #[test]
    fn display_text_matches_grid_stringification() {
        assert_eq!(display_text(None), "");
        assert_eq!(display_text(Some(&Value::Null)), "");
        assert_eq!(display_text(Some(&json!("abc"))), "abc");
        assert_eq!(display_text(Some(&json!(42))), "42");
        assert_eq!(display_text(Some(&json!([1, "b"]))), "1,b");
    }

    #[test]
    fn record_parses_with_missing_columns() {
        let record: VisitorRecord =
            serde_json::from_value(json!({ "id": 7, "full_name": "Kofi" })).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.full_name.as_deref(), Some("Kofi"));
        assert!(record.gender.is_none());
    }

    #[test]
    fn new_visitor_omits_absent_secondary_phone() {
        let record = NewVisitor {
            image: "url".to_string(),
            full_name: "Kofi".to_string(),
            primary_phone_num: "024".to_string(),
            secondary_phone_num: None,
            address: "addr".to_string(),
            gender: "Male".to_string(),
            age: "30".to_string(),
            born_again_date: "2025-01-01".to_string(),
            iow_name: "Ama".to_string(),
            iow_phone_num: "020".to_string(),
            follow_up_leader: "L".to_string(),
            foundation_class_status: "Enrolled".to_string(),
            foundation_class_teacher: "T".to_string(),
            ministers_training_status: "No".to_string(),
            ministers_training_teacher: "T".to_string(),
            ministry_joined: "Choir".to_string(),
            cell_group_status: "Joined".to_string(),
            assigned_cell_group: "G1".to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("secondary_phone_num").is_none());
        assert!(value.get("id").is_none());
        assert!(value.get("registered_at").is_none());
    }
}
