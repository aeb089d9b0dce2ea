use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of parallel template slots the engine keeps per company.
pub const SLOT_COUNT: usize = 6;

/// Human labels for slots 1..=6, in order.
const SLOT_LABELS: [&str; SLOT_COUNT] = [
    "Welcome Email",
    "Follow-up Email",
    "Product Demo",
    "Case Study",
    "Pricing Information",
    "Final Follow-up",
];

/// Label for a 1-based slot index, `Template N` past the named list.
pub fn slot_label(slot_index: u8) -> String {
    usize::from(slot_index)
        .checked_sub(1)
        .and_then(|i| SLOT_LABELS.get(i))
        .map(|label| label.to_string())
        .unwrap_or_else(|| format!("Template {slot_index}"))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateStatus {
    Approved,
    Rejected,
    #[default]
    Pending,
}

impl TemplateStatus {
    /// Trimmed, case-insensitive parse of the engine's status column.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("approved") {
            Some(TemplateStatus::Approved)
        } else if raw.eq_ignore_ascii_case("rejected") {
            Some(TemplateStatus::Rejected)
        } else if raw.eq_ignore_ascii_case("pending") {
            Some(TemplateStatus::Pending)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateStatus::Approved => "Approved",
            TemplateStatus::Rejected => "Rejected",
            TemplateStatus::Pending => "Pending",
        }
    }
}

impl fmt::Display for TemplateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite `<row_number>-<slot_index>` key, unique within one fetch.
/// Rows without a `row_number` are keyed `p<position>-<slot_index>` instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(row_number: u64, slot_index: u8) -> Self {
        Self(format!("{row_number}-{slot_index}"))
    }

    pub fn positional(position: usize, slot_index: u8) -> Self {
        Self(format!("p{position}-{slot_index}"))
    }

    /// Id for a slot of `record`, preferring the engine's row number.
    pub fn for_record(record: &RawCompanyRecord, slot_index: u8) -> Self {
        match record.row_number {
            Some(row_number) => Self::new(row_number, slot_index),
            None => Self::positional(record.position, slot_index),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TemplateId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the six positions of a company record, as sent by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSlot {
    pub content: Option<String>,
    pub subject: Option<String>,
    pub status: Option<String>,
}

impl RawSlot {
    /// Both content and subject present and non-empty.
    pub fn is_populated(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        filled(&self.content) && filled(&self.subject)
    }
}

/// A company row from the get-templates webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCompanyRecord {
    pub row_number: Option<u64>,
    /// 1-based position in the payload array.
    pub position: usize,
    /// Company name as sent, possibly carrying an ordinal prefix (`"1. Acme Corp"`).
    pub company: String,
    pub description: Option<String>,
    pub why_salesforce: Option<String>,
    pub slots: [RawSlot; SLOT_COUNT],
}

/// A single reviewable email template, flattened from one populated slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    pub id: TemplateId,
    pub company: String,
    pub slot_index: u8,
    pub subject: String,
    /// HTML markup. Rendered by the dashboard, never executed here.
    pub content: String,
    pub status: TemplateStatus,
    /// Status as last synchronized with the engine. Only fetches and saves move it.
    pub original_status: TemplateStatus,
    pub change_request: String,
}

impl Template {
    pub fn is_dirty(&self) -> bool {
        self.status != self.original_status
    }

    pub fn label(&self) -> String {
        slot_label(self.slot_index)
    }
}

/// One entry of the save webhook's batch body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavePayload {
    #[serde(rename = "Company name")]
    pub company_name: String,
    #[serde(rename = "Templet Number")]
    pub templet_number: u8,
    #[serde(rename = "Status")]
    pub status: TemplateStatus,
    #[serde(rename = "Change Request")]
    pub change_request: String,
    #[serde(rename = "Email templet")]
    pub email_templet: String,
}

impl From<&Template> for SavePayload {
    fn from(template: &Template) -> Self {
        let change_request = if template.status == TemplateStatus::Rejected {
            template.change_request.clone()
        } else {
            String::new()
        };
        SavePayload {
            company_name: template.company.clone(),
            templet_number: template.slot_index,
            status: template.status,
            change_request,
            email_templet: template.content.clone(),
        }
    }
}
