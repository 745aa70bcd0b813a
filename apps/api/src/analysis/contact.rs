//! Contact extraction: pulls name, email, phone and links out of resume text.

use serde::{Deserialize, Serialize};

use crate::analysis::normalize::lenient_opt_string;
use crate::analysis::prompts::{fill, CONTACT_PROMPT_TEMPLATE, CONTACT_SYSTEM};
use crate::analysis::request;
use crate::errors::AppError;
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::LlmClient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub linkedin: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub website: Option<String>,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        *self == ContactInfo::default()
    }
}

pub fn build_prompt(resume_text: &str) -> String {
    fill(CONTACT_PROMPT_TEMPLATE, &[("resume_text", resume_text)])
}

pub async fn extract_contact_info(
    llm: &LlmClient,
    resume_text: &str,
) -> Result<ContactInfo, AppError> {
    request(
        llm,
        &build_prompt(resume_text),
        &system_prompt(CONTACT_SYSTEM),
        "extract contact info",
    )
    .await
}
