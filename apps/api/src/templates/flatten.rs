//! Decoding of the get-templates payload and flattening into reviewable templates.
//!
//! The engine sends one object per company with stringly-keyed slot columns
//! (`Email Templet 3`, `Subject 3`, `Status 3`). Those keys are read here and
//! nowhere else; the rest of the crate works with `[RawSlot; SLOT_COUNT]`.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::templates::model::{
    RawCompanyRecord, RawSlot, Template, TemplateId, TemplateStatus, SLOT_COUNT,
};

fn ordinal_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| Regex::new(r"^\d+\.\s*").expect("ordinal prefix pattern is valid"))
}

/// Strips a leading `"<digits>. "` ordinal and surrounding whitespace.
pub fn normalize_company_name(raw: &str) -> String {
    ordinal_prefix().replace(raw.trim_start(), "").trim().to_string()
}

/// Decodes the webhook payload into company records.
///
/// Returns `None` when the payload is not an array (an error object, a single
/// record). Array elements that are not objects are skipped.
pub fn decode_records(payload: &Value) -> Option<Vec<RawCompanyRecord>> {
    let rows = payload.as_array()?;
    let records = rows
        .iter()
        .enumerate()
        .filter_map(|(position, row)| match row.as_object() {
            Some(object) => Some(decode_record(object, position)),
            None => {
                warn!("Skipping non-object template row at position {position}");
                None
            }
        })
        .collect();
    Some(records)
}

fn decode_record(row: &Map<String, Value>, position: usize) -> RawCompanyRecord {
    let row_number = row.get("row_number").and_then(as_row_number);
    if row_number.is_none() {
        debug!("Template row at position {position} has no row_number; keying by position");
    }

    let slots = std::array::from_fn(|i| {
        let n = i + 1;
        RawSlot {
            content: text_field(row, &format!("Email Templet {n}")),
            subject: text_field(row, &format!("Subject {n}")),
            status: text_field(row, &format!("Status {n}")),
        }
    });

    RawCompanyRecord {
        row_number,
        position: position + 1,
        company: text_field(row, "Company").unwrap_or_default(),
        description: text_field(row, "Description"),
        why_salesforce: text_field(row, "Why Salesforce ? "),
        slots,
    }
}

fn as_row_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_field(row: &Map<String, Value>, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Emits one template per populated slot, in record then slot order.
/// Slots with only a subject or only content are dropped silently.
pub fn flatten_records(records: &[RawCompanyRecord]) -> Vec<Template> {
    let mut templates = Vec::new();

    for record in records {
        let company = normalize_company_name(&record.company);

        for (i, slot) in record.slots.iter().enumerate() {
            if !slot.is_populated() {
                continue;
            }
            let slot_index = (i + 1) as u8;
            let status = slot
                .status
                .as_deref()
                .and_then(TemplateStatus::parse)
                .unwrap_or_default();

            templates.push(Template {
                id: TemplateId::for_record(record, slot_index),
                company: company.clone(),
                slot_index,
                subject: slot.subject.clone().unwrap_or_default(),
                content: slot.content.clone().unwrap_or_default(),
                status,
                original_status: status,
                change_request: String::new(),
            });
        }
    }

    debug_assert!(templates.len() <= records.len() * SLOT_COUNT);
    templates
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_strips_ordinal_prefix() {
        assert_eq!(normalize_company_name("3. Acme Corp"), "Acme Corp");
        assert_eq!(normalize_company_name("Acme Corp"), "Acme Corp");
        assert_eq!(normalize_company_name("  12.Acme Corp  "), "Acme Corp");
        assert_eq!(
            normalize_company_name("3. Acme Corp"),
            normalize_company_name("Acme Corp")
        );
    }

    #[test]
    fn test_normalize_keeps_inner_numbers() {
        assert_eq!(normalize_company_name("7-Eleven"), "7-Eleven");
        assert_eq!(normalize_company_name("3M Company"), "3M Company");
    }

    #[test]
    fn test_decode_rejects_non_array() {
        assert!(decode_records(&json!({ "error": "workflow failed" })).is_none());
        assert!(decode_records(&json!("nope")).is_none());
        assert_eq!(decode_records(&json!([])).unwrap().len(), 0);
    }

    #[test]
    fn test_decode_skips_non_object_rows() {
        let records = decode_records(&json!([1, { "row_number": 2, "Company": "X" }])).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].row_number, Some(2));
        assert_eq!(records[0].position, 2);
    }

    #[test]
    fn test_decode_records_missing_row_number() {
        let records = decode_records(&json!([{ "Company": "A" }, { "Company": "B" }])).unwrap();
        assert_eq!(records[0].row_number, None);
        assert_eq!(records[0].position, 1);
        assert_eq!(records[1].position, 2);
    }

    #[test]
    fn test_flatten_ids_stay_unique_with_mixed_row_numbers() {
        let records = decode_records(&json!([
            { "Company": "A", "Email Templet 1": "<p>a</p>", "Subject 1": "a" },
            { "row_number": 1, "Company": "B", "Email Templet 1": "<p>b</p>", "Subject 1": "b" },
            { "row_number": "2", "Company": "C", "Email Templet 1": "<p>c</p>", "Subject 1": "c" }
        ]))
        .unwrap();

        let templates = flatten_records(&records);
        let ids: Vec<&str> = templates.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["p1-1", "1-1", "2-1"]);
    }

    #[test]
    fn test_decode_reads_slot_columns() {
        let records = decode_records(&json!([{
            "row_number": 9,
            "Company": "1. Hooli",
            "Why Salesforce ? ": "Scaling sales",
            "Email Templet 4": "<p>case</p>",
            "Subject 4": "A case study",
            "Status 4": "Approved"
        }]))
        .unwrap();

        let record = &records[0];
        assert_eq!(record.why_salesforce.as_deref(), Some("Scaling sales"));
        assert_eq!(record.slots[3].subject.as_deref(), Some("A case study"));
        assert_eq!(record.slots[3].status.as_deref(), Some("Approved"));
        assert_eq!(record.slots[0], RawSlot::default());
    }

    #[test]
    fn test_flatten_counts_only_fully_populated_slots() {
        let records = decode_records(&json!([{
            "row_number": 1,
            "Company": "Acme",
            "Email Templet 1": "<p>1</p>", "Subject 1": "s1",
            "Email Templet 2": "<p>2</p>", "Subject 2": "",
            "Email Templet 3": "",          "Subject 3": "s3",
            "Email Templet 5": "<p>5</p>", "Subject 5": "s5",
            "Subject 6": "s6"
        }]))
        .unwrap();

        let templates = flatten_records(&records);
        let slots: Vec<u8> = templates.iter().map(|t| t.slot_index).collect();
        assert_eq!(slots, vec![1, 5]);
    }

    #[test]
    fn test_flatten_defaults_status_to_pending() {
        let records = decode_records(&json!([{
            "row_number": 1,
            "Company": "Acme",
            "Email Templet 1": "<p>1</p>", "Subject 1": "s1",
            "Email Templet 2": "<p>2</p>", "Subject 2": "s2", "Status 2": "",
            "Email Templet 3": "<p>3</p>", "Subject 3": "s3", "Status 3": "Sent",
            "Email Templet 4": "<p>4</p>", "Subject 4": "s4", "Status 4": "Rejected"
        }]))
        .unwrap();

        let templates = flatten_records(&records);
        for t in &templates[..3] {
            assert_eq!(t.status, TemplateStatus::Pending);
            assert_eq!(t.original_status, TemplateStatus::Pending);
        }
        assert_eq!(templates[3].status, TemplateStatus::Rejected);
        assert_eq!(templates[3].original_status, TemplateStatus::Rejected);
        assert!(templates.iter().all(|t| !t.is_dirty()));
    }

    #[test]
    fn test_flatten_globex_scenario() {
        let records = decode_records(&json!([{
            "row_number": 2,
            "Company": "2. Globex",
            "Email Templet 1": "<html><body>Hello</body></html>",
            "Subject 1": "Meet Globex",
            "Email Templet 2": "<p>second</p>",
            "Subject 2": ""
        }]))
        .unwrap();

        let templates = flatten_records(&records);
        assert_eq!(templates.len(), 1);
        let t = &templates[0];
        assert_eq!(t.id.as_str(), "2-1");
        assert_eq!(t.company, "Globex");
        assert_eq!(t.slot_index, 1);
        assert_eq!(t.status, TemplateStatus::Pending);
        assert_eq!(t.change_request, "");
    }
}
