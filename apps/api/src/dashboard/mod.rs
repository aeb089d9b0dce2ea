//! Campaign metrics: aggregates the dashboard webhook's contact rows.
//!
//! Each row is one contact with up to six outreach emails. Slot 1 uses the
//! bare `Send Status` / `Opened` columns, slot N uses `Send Status N` / `Opened N`.

pub mod handlers;

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::{Map, Value};

const SEQUENCE_LENGTH: usize = 6;
/// Share of opens counted as clicks for the estimated click-through rate.
const CLICK_ESTIMATE: f64 = 0.3;
const UNKNOWN_COMPANY: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CampaignMetrics {
    pub total_contacts: usize,
    pub total_companies: usize,
    pub engaged_companies: usize,
    pub engaged_contacts: usize,
    pub sent_emails: usize,
    pub opened_emails: usize,
    pub open_rate: f64,
    pub click_through_rate: f64,
    pub company_engagement_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyPerformance {
    pub name: String,
    pub leads: usize,
    pub sent: usize,
    pub opened: usize,
    pub open_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequencePerformance {
    pub template: String,
    pub sent: usize,
    pub opened: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignReport {
    pub metrics: CampaignMetrics,
    pub companies: Vec<CompanyPerformance>,
    pub sequence: Vec<SequencePerformance>,
}

fn send_status_key(slot: usize) -> String {
    if slot == 1 {
        "Send Status".to_string()
    } else {
        format!("Send Status {slot}")
    }
}

fn opened_key(slot: usize) -> String {
    if slot == 1 {
        "Opened".to_string()
    } else {
        format!("Opened {slot}")
    }
}

/// Looks up `key`, falling back to the engine's space-less spelling (`SendStatus 2`).
fn text<'a>(row: &'a Map<String, Value>, key: &str) -> &'a str {
    row.get(key)
        .or_else(|| row.get(&key.replacen(' ', "", 1)))
        .and_then(Value::as_str)
        .unwrap_or("")
}

fn company_of(row: &Map<String, Value>) -> Option<&str> {
    row.get("Company")
        .or_else(|| row.get("company"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn is_sent(status: &str) -> bool {
    status == "Sent" || status == "UNREAD"
}

fn percent(part: usize, whole: usize) -> f64 {
    percent_f(part as f64, whole)
}

fn percent_f(part: f64, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part / whole as f64 * 1000.0).round() / 10.0
}

pub fn build_report(rows: &[Value]) -> CampaignReport {
    let rows: Vec<&Map<String, Value>> = rows.iter().filter_map(Value::as_object).collect();
    CampaignReport {
        metrics: campaign_metrics(&rows),
        companies: company_performance(&rows),
        sequence: sequence_performance(&rows),
    }
}

fn campaign_metrics(rows: &[&Map<String, Value>]) -> CampaignMetrics {
    let mut companies = HashSet::new();
    let mut engaged_companies = HashSet::new();
    let mut engaged_contacts = 0;
    let mut sent = 0;
    let mut opened = 0;

    for row in rows {
        let company = company_of(row).unwrap_or(UNKNOWN_COMPANY);
        companies.insert(company);

        let mut engaged = false;
        for slot in 1..=SEQUENCE_LENGTH {
            if !is_sent(text(row, &send_status_key(slot))) {
                continue;
            }
            sent += 1;
            if text(row, &opened_key(slot)) == "Yes" {
                opened += 1;
                engaged = true;
                engaged_companies.insert(company);
            }
        }
        if engaged {
            engaged_contacts += 1;
        }
    }

    CampaignMetrics {
        total_contacts: rows.len(),
        total_companies: companies.len(),
        engaged_companies: engaged_companies.len(),
        engaged_contacts,
        sent_emails: sent,
        opened_emails: opened,
        open_rate: percent(opened, sent),
        click_through_rate: percent_f(opened as f64 * CLICK_ESTIMATE, sent),
        company_engagement_rate: percent(engaged_companies.len(), companies.len()),
    }
}

/// Per-company rollup in encounter order. `sent` counts the first email only;
/// `opened` counts contacts who opened any email.
fn company_performance(rows: &[&Map<String, Value>]) -> Vec<CompanyPerformance> {
    let mut order: Vec<CompanyPerformance> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        let Some(name) = company_of(row) else {
            continue;
        };
        let i = *index.entry(name).or_insert_with(|| {
            order.push(CompanyPerformance {
                name: name.to_string(),
                leads: 0,
                sent: 0,
                opened: 0,
                open_rate: 0.0,
            });
            order.len() - 1
        });

        let entry = &mut order[i];
        entry.leads += 1;
        if text(row, "Send Status") == "Sent" {
            entry.sent += 1;
        }
        if (1..=SEQUENCE_LENGTH).any(|slot| text(row, &opened_key(slot)) == "Yes") {
            entry.opened += 1;
        }
    }

    for company in &mut order {
        company.open_rate = percent(company.opened, company.sent);
    }
    order
}

fn sequence_performance(rows: &[&Map<String, Value>]) -> Vec<SequencePerformance> {
    (1..=SEQUENCE_LENGTH)
        .map(|slot| {
            let status_key = send_status_key(slot);
            let open_key = opened_key(slot);
            SequencePerformance {
                template: format!("Email {slot}"),
                sent: rows
                    .iter()
                    .filter(|row| is_sent(text(row, &status_key)))
                    .count(),
                opened: rows
                    .iter()
                    .filter(|row| text(row, &open_key) == "Yes")
                    .count(),
            }
        })
        .collect()
}
