use std::collections::HashMap;

use serde::Serialize;

use crate::templates::model::{Template, TemplateId, TemplateStatus};

/// The in-memory template set plus its dirty-tracking baseline.
///
/// `generation` increases every time the set is replaced wholesale, so a
/// save that resolves after a refresh can tell its templates are gone.
#[derive(Debug, Default)]
pub struct TemplateBoard {
    templates: Vec<Template>,
    generation: u64,
}

/// Result of a single edit.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub template: Template,
    /// Rejected without any change request text; the dashboard should prompt for one.
    pub change_request_required: bool,
}

/// Templates of one company, in encounter order.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyGroup<'a> {
    pub company: &'a str,
    pub templates: Vec<&'a Template>,
}

impl TemplateBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, id: &TemplateId) -> Option<&Template> {
        self.templates.iter().find(|t| &t.id == id)
    }

    /// Replaces the whole set. No merge by id across fetches.
    pub fn replace(&mut self, templates: Vec<Template>) {
        self.templates = templates;
        self.generation += 1;
    }

    /// Applies a user edit. `original_status` is never touched here.
    ///
    /// Rejected with `Some(text)` sets the change request, Rejected with `None`
    /// keeps the current text, any other status clears it.
    pub fn edit(
        &mut self,
        id: &TemplateId,
        status: TemplateStatus,
        change_request: Option<String>,
    ) -> Option<EditOutcome> {
        let template = self.templates.iter_mut().find(|t| &t.id == id)?;

        template.status = status;
        if status == TemplateStatus::Rejected {
            if let Some(text) = change_request {
                template.change_request = text.trim().to_string();
            }
        } else {
            template.change_request.clear();
        }

        Some(EditOutcome {
            change_request_required: status == TemplateStatus::Rejected
                && template.change_request.is_empty(),
            template: template.clone(),
        })
    }

    pub fn changed_set(&self) -> Vec<&Template> {
        self.templates.iter().filter(|t| t.is_dirty()).collect()
    }

    pub fn changed_count(&self) -> usize {
        self.templates.iter().filter(|t| t.is_dirty()).count()
    }

    /// Moves the baseline of each submitted template to the status that was submitted.
    ///
    /// Only the given `(id, status)` pairs are touched, and nothing is touched if the
    /// set was replaced since `generation`. Returns how many baselines moved.
    pub fn advance_baseline(
        &mut self,
        generation: u64,
        submitted: &[(TemplateId, TemplateStatus)],
    ) -> usize {
        if generation != self.generation {
            return 0;
        }

        let mut advanced = 0;
        for (id, status) in submitted {
            if let Some(template) = self.templates.iter_mut().find(|t| &t.id == id) {
                template.original_status = *status;
                advanced += 1;
            }
        }
        advanced
    }

    /// Groups by normalized company, preserving first-encounter order.
    pub fn grouped(&self) -> Vec<CompanyGroup<'_>> {
        let mut groups: Vec<CompanyGroup<'_>> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for template in &self.templates {
            let slot = *index.entry(template.company.as_str()).or_insert_with(|| {
                groups.push(CompanyGroup {
                    company: template.company.as_str(),
                    templates: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].templates.push(template);
        }
        groups
    }
}
