//! Analysis requests: validates the dashboard's three analysis forms and
//! shapes them into the engine's payloads.

pub mod handlers;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;

/// Durations offered by the industry form.
pub const DURATIONS: [&str; 4] = ["3 Months", "6 Months", "9 Months", "12 Months"];

const OTHER_INDUSTRY: &str = "Other";

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisRequest {
    /// AI-researched industry overview.
    Ai {
        industry_name: String,
        #[serde(default)]
        research_instruction: String,
        output_size: String,
        #[serde(default)]
        role: String,
    },
    Industry {
        industry: String,
        #[serde(default)]
        custom_industry: String,
        duration: String,
        research_instruction: String,
        output_size: String,
        #[serde(default)]
        notes: String,
    },
    Company {
        company_name: String,
        #[serde(default)]
        analysis_description: String,
        #[serde(default)]
        company_location: String,
        #[serde(default)]
        roles: String,
        #[serde(default)]
        notes: String,
    },
}

fn required(value: &str, message: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        Err(AppError::Validation(message.to_string()))
    } else {
        Ok(())
    }
}

impl AnalysisRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            AnalysisRequest::Ai {
                industry_name,
                output_size,
                ..
            } => {
                required(industry_name, "industry_name is required for AI analysis")?;
                required(output_size, "output_size is required for AI analysis")
            }
            AnalysisRequest::Industry {
                duration,
                research_instruction,
                output_size,
                ..
            } => {
                required(
                    self.resolved_industry().unwrap_or_default(),
                    "industry is required",
                )?;
                if !DURATIONS.contains(&duration.trim()) {
                    return Err(AppError::Validation(format!(
                        "duration must be one of: {}",
                        DURATIONS.join(", ")
                    )));
                }
                required(research_instruction, "research_instruction is required")?;
                required(output_size, "output_size is required")
            }
            AnalysisRequest::Company { company_name, .. } => {
                required(company_name, "company_name is required")
            }
        }
    }

    /// The industry to analyse, substituting the custom entry when `Other` was picked.
    fn resolved_industry(&self) -> Option<&str> {
        match self {
            AnalysisRequest::Industry {
                industry,
                custom_industry,
                ..
            } if industry.trim() == OTHER_INDUSTRY => Some(custom_industry.trim()),
            AnalysisRequest::Industry { industry, .. } => Some(industry.trim()),
            _ => None,
        }
    }

    /// Body posted to the analysis webhook, using the engine's key names.
    pub fn to_payload(&self) -> Value {
        match self {
            AnalysisRequest::Ai {
                industry_name,
                research_instruction,
                output_size,
                role,
            } => json!({
                "type": "ai",
                "IndustryName": industry_name.trim(),
                "ResearchInstruction": research_instruction,
                "OutputSize": output_size,
                "Role": role,
            }),
            AnalysisRequest::Industry {
                duration,
                research_instruction,
                output_size,
                notes,
                ..
            } => json!({
                "type": "industry",
                "Industry": self.resolved_industry().unwrap_or_default(),
                "Duration": duration.trim(),
                "ResearchInstruction": research_instruction,
                "OutputSize": output_size,
                "Notes": notes,
            }),
            AnalysisRequest::Company {
                company_name,
                analysis_description,
                company_location,
                roles,
                notes,
            } => json!({
                "type": "company",
                "companyName": company_name.trim(),
                "analysisDescription": analysis_description,
                "companyLocation": company_location,
                "roles": roles,
                "Notes": notes,
            }),
        }
    }
}

/// Industries arrive as the values of a JSON object (`{"0": "Retail", ...}`) or as a list.
pub fn industries_from(payload: &Value) -> Vec<String> {
    let values: Box<dyn Iterator<Item = &Value>> = match payload {
        Value::Object(map) => Box::new(map.values()),
        Value::Array(items) => Box::new(items.iter()),
        _ => Box::new(std::iter::empty()),
    };
    values
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
