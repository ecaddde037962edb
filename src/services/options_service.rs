use crate::db::enums::{ConvertStatus, Priority, WorkStatus};
use crate::db::models::api::SelectItem;

/// Dropdown sources for the enum columns.
pub struct OptionsService;

impl OptionsService {
    pub fn work_statuses() -> Vec<SelectItem> {
        WorkStatus::ALL
            .iter()
            .map(|s| item(*s as i32, s.key(), s.label()))
            .collect()
    }

    pub fn priorities() -> Vec<SelectItem> {
        Priority::ALL
            .iter()
            .map(|p| item(*p as i32, p.key(), p.label()))
            .collect()
    }

    pub fn convert_statuses() -> Vec<SelectItem> {
        ConvertStatus::ALL
            .iter()
            .map(|s| item(*s as i32, s.key(), s.label()))
            .collect()
    }
}

fn item(value: i32, key: &str, text: &str) -> SelectItem {
    SelectItem {
        value,
        key: key.to_string(),
        text: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_declaration_order() {
        let statuses = OptionsService::work_statuses();
        assert_eq!(statuses.len(), 5);
        assert_eq!(statuses[0].value, 0);
        assert_eq!(statuses[0].key, "not_started");
        assert_eq!(OptionsService::priorities()[3].text, "Urgent");
        assert_eq!(OptionsService::convert_statuses()[4].key, "failed");
    }
}
