use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::shared::DomainError;

/// Where the processor page should open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormTarget {
    /// A new browser context (`target="_blank"`)
    NewContext,
    /// The current tab, for browsers that block programmatic popups
    SameContext,
}

/// Hidden-field form POST to an external payment processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectForm {
    pub action: String,
    pub fields: BTreeMap<String, String>,
}

impl RedirectForm {
    pub fn new(action: impl Into<String>, fields: BTreeMap<String, String>) -> Self {
        Self {
            action: action.into(),
            fields,
        }
    }
}

/// Outcome of handing a form to the browser side
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedForm {
    pub target: FormTarget,
    /// Where the submitter left the form, if it was materialised somewhere
    pub location: Option<String>,
}

/// The one place that knows how a form actually reaches a browser
#[async_trait]
pub trait FormSubmitter: Send + Sync {
    async fn submit(&self, form: &RedirectForm) -> Result<SubmittedForm, DomainError>;
}
