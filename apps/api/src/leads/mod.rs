//! Lead companies and contacts, plus the scrape and outreach triggers.

pub mod handlers;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::templates::flatten::normalize_company_name;

const MISSING_COMPANY: &str = "N/A";
const MISSING_DESCRIPTION: &str = "No description available.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadCompany {
    pub company_name: String,
    pub description: String,
    pub why_salesforce: String,
}

/// Normalizes one row of the `get_companies` response.
pub fn lead_company_from(row: &Value) -> LeadCompany {
    let text = |key: &str| row.get(key).and_then(Value::as_str).map(str::trim);

    LeadCompany {
        company_name: text("Company")
            .map(normalize_company_name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| MISSING_COMPANY.to_string()),
        description: text("Description")
            .filter(|d| !d.is_empty())
            .unwrap_or(MISSING_DESCRIPTION)
            .to_string(),
        why_salesforce: text("Why Salesforce ? ").unwrap_or_default().to_string(),
    }
}

/// Accepts strings, numbers and booleans; anything else (including null) becomes empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// A contact row under a lead company. Column names follow the engine's sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename(deserialize = "User Id"), default, deserialize_with = "lenient_string")]
    pub user_id: String,
    #[serde(rename(deserialize = "Name "), alias = "Name", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename(deserialize = "Email"), default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(rename(deserialize = "Role"), default, deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(rename(deserialize = "Role Details"), default, deserialize_with = "lenient_string")]
    pub role_details: String,
    #[serde(rename(deserialize = "Phone"), default, deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(rename(deserialize = "linkedin"), default, deserialize_with = "lenient_string")]
    pub linkedin: String,
    #[serde(rename(deserialize = "Send Status"), default, deserialize_with = "lenient_string")]
    pub send_status: String,
    #[serde(rename(deserialize = "Time"), default, deserialize_with = "lenient_string")]
    pub time: String,
    #[serde(rename(deserialize = "Opened"), default, deserialize_with = "lenient_string")]
    pub opened: String,
    #[serde(rename(deserialize = "OpenedAt"), default, deserialize_with = "lenient_string")]
    pub opened_at: String,
    #[serde(rename(deserialize = "Company"), default, deserialize_with = "lenient_string")]
    pub company: String,
}

/// The engine answers with a list, or a bare object when only one contact exists.
pub fn contacts_from(payload: Value) -> Result<Vec<Contact>, serde_json::Error> {
    match payload {
        Value::Array(rows) => rows
            .into_iter()
            .filter(Value::is_object)
            .map(serde_json::from_value)
            .collect(),
        row @ Value::Object(_) => Ok(vec![serde_json::from_value(row)?]),
        _ => Ok(Vec::new()),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeRequest {
    pub company: String,
    pub roles: Vec<String>,
}

impl ScrapeRequest {
    /// Validates and builds the scrape webhook body. Roles are trimmed and de-duplicated.
    pub fn to_payload(&self, timestamp: &str) -> Result<Value, AppError> {
        let company = normalize_company_name(&self.company);
        if company.is_empty() {
            return Err(AppError::Validation("No company selected".to_string()));
        }

        let mut roles: Vec<&str> = Vec::new();
        for role in self.roles.iter().map(|r| r.trim()).filter(|r| !r.is_empty()) {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        if roles.is_empty() {
            return Err(AppError::Validation(
                "Please select at least one role to scrape".to_string(),
            ));
        }

        Ok(json!({
            "company": company,
            "roles": roles,
            "timestamp": timestamp,
        }))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendEmailsRequest {
    pub company: String,
}
