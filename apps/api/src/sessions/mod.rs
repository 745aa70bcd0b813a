// Tailoring sessions: the analyze and tailor pipelines that tie storage and
// the analysis functions together.
//
// Analyze: contact info + job analysis (concurrently) -> match score -> job posting.
// Tailor:  stored job analysis + match -> tailored content -> tailored resume.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::contact::{extract_contact_info, ContactInfo};
use crate::analysis::interview::{generate_interview_questions, InterviewQuestion};
use crate::analysis::job::{analyze_job_posting, JobAnalysis};
use crate::analysis::matching::{score_band, score_match, MatchAnalysis};
use crate::analysis::tailoring::{tailor_resume, TailoredContent};
use crate::auth::require_owner;
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::job_posting::{JobPosting, JobPostingUpdate, NewJobPosting};
use crate::models::resume::{NewTailoredResume, TailoredResume};
use crate::models::session::{NewResumeSession, ResumeSession, ResumeSessionUpdate, SessionStatus};
use crate::models::user::User;
use crate::storage::Storage;

pub mod handlers;

#[derive(Debug, Serialize)]
pub struct AnalysisOutcome {
    pub session: ResumeSession,
    pub job_posting: JobPosting,
    pub contact_info: ContactInfo,
    pub job_analysis: JobAnalysis,
    pub match_analysis: MatchAnalysis,
}

#[derive(Debug, Serialize)]
pub struct TailorOutcome {
    pub session: ResumeSession,
    pub tailored_resume: TailoredResume,
    pub content: TailoredContent,
}

/// Where the resume text of a new session comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ResumeSource {
    Text(String),
    Stored(Uuid),
    Default,
}

pub(crate) fn to_json<T: Serialize>(value: &T, what: &str) -> Result<Value, AppError> {
    serde_json::to_value(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize {what}: {e}")))
}

fn from_json<T: serde::de::DeserializeOwned + Default>(value: Option<&Value>) -> T {
    value
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

/// Opens a session for `user`, resolving the resume text from the source.
pub async fn open_session(
    storage: &dyn Storage,
    user: &User,
    source: ResumeSource,
    job_description: String,
    job_url: Option<String>,
) -> Result<ResumeSession, AppError> {
    if job_description.trim().is_empty() {
        return Err(AppError::Validation("job_description cannot be empty".to_string()));
    }

    let (resume_text, stored_resume_id) = match source {
        ResumeSource::Text(text) => (text, None),
        ResumeSource::Stored(id) => {
            let stored =
                require_owner(storage.get_stored_resume(id).await?, user, "Stored resume", id)?;
            (stored.content, Some(stored.id))
        }
        ResumeSource::Default => {
            let stored = storage.get_default_stored_resume(user.id).await?.ok_or_else(|| {
                AppError::Validation(
                    "resume_text is required when no default resume is set".to_string(),
                )
            })?;
            (stored.content, Some(stored.id))
        }
    };
    if resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text cannot be empty".to_string()));
    }

    let session = storage
        .create_session(NewResumeSession {
            user_id: Some(user.id),
            stored_resume_id,
            resume_text,
            job_description,
            job_url,
        })
        .await?;
    info!("Opened session {} for user {}", session.id, user.id);
    Ok(session)
}

/// The job posting recorded for a session, if analysis has produced one.
pub async fn session_posting(
    storage: &dyn Storage,
    session: &ResumeSession,
    user_id: Uuid,
) -> Result<Option<JobPosting>, AppError> {
    Ok(storage
        .list_job_postings_by_user(user_id)
        .await?
        .into_iter()
        .find(|p| p.session_id == Some(session.id)))
}

/// Runs contact extraction, job analysis and match scoring for a session and
/// records the results. Re-running refreshes the session's existing posting.
pub async fn analyze_session(
    storage: &dyn Storage,
    llm: &LlmClient,
    session: ResumeSession,
    user_id: Uuid,
) -> Result<AnalysisOutcome, AppError> {
    info!("Analyzing session {}", session.id);

    let (contact_info, job_analysis) = tokio::try_join!(
        extract_contact_info(llm, &session.resume_text),
        analyze_job_posting(llm, &session.job_description),
    )?;
    if contact_info.is_empty() {
        warn!("No contact details found in resume of session {}", session.id);
    }
    let match_analysis = score_match(llm, &session.resume_text, &job_analysis).await?;
    info!(
        "Session {} scored {}/100 ({})",
        session.id,
        match_analysis.overall_score,
        score_band(match_analysis.overall_score)
    );

    let analysis_json = to_json(&job_analysis, "job analysis")?;
    let job_posting = match session_posting(storage, &session, user_id).await? {
        Some(existing) => storage
            .update_job_posting(
                existing.id,
                JobPostingUpdate {
                    title: Some(job_analysis.display_title()),
                    company: job_analysis.company.clone(),
                    location: job_analysis.location.clone(),
                    url: None,
                    analysis: Some(analysis_json.clone()),
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found("Job posting", existing.id))?,
        None => {
            storage
                .create_job_posting(NewJobPosting {
                    user_id,
                    session_id: Some(session.id),
                    title: job_analysis.display_title(),
                    company: job_analysis.company.clone(),
                    location: job_analysis.location.clone(),
                    description: session.job_description.clone(),
                    url: session.job_url.clone(),
                    analysis: Some(analysis_json.clone()),
                })
                .await?
        }
    };

    let session = storage
        .update_session(
            session.id,
            ResumeSessionUpdate {
                contact_info: Some(to_json(&contact_info, "contact info")?),
                job_analysis: Some(analysis_json),
                match_analysis: Some(to_json(&match_analysis, "match analysis")?),
                status: Some(SessionStatus::Analyzed),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found("Session", session.id))?;

    Ok(AnalysisOutcome {
        session,
        job_posting,
        contact_info,
        job_analysis,
        match_analysis,
    })
}

/// Rewrites the session's resume for its analyzed job and stores the result
/// as a tailored resume.
pub async fn tailor_session(
    storage: &dyn Storage,
    llm: &LlmClient,
    session: ResumeSession,
    user_id: Uuid,
) -> Result<TailorOutcome, AppError> {
    if session.job_analysis.is_none() {
        return Err(AppError::Validation(format!(
            "Session {} must be analyzed before tailoring",
            session.id
        )));
    }
    let job_analysis: JobAnalysis = from_json(session.job_analysis.as_ref());
    let match_analysis: MatchAnalysis = from_json(session.match_analysis.as_ref());

    info!("Tailoring session {}", session.id);
    let content = tailor_resume(llm, &session.resume_text, &job_analysis, &match_analysis).await?;
    let content_json = to_json(&content, "tailored content")?;

    let posting = session_posting(storage, &session, user_id).await?;
    let tailored_resume = storage
        .create_tailored_resume(NewTailoredResume {
            user_id,
            session_id: Some(session.id),
            stored_resume_id: session.stored_resume_id,
            job_posting_id: posting.map(|p| p.id),
            title: job_analysis.display_title(),
            content: content_json.clone(),
            match_score: Some(i32::from(match_analysis.overall_score)),
        })
        .await?;
    info!(
        "Created tailored resume {} from session {}",
        tailored_resume.id, session.id
    );

    let session = storage
        .update_session(
            session.id,
            ResumeSessionUpdate {
                tailored_content: Some(content_json),
                status: Some(SessionStatus::Tailored),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found("Session", session.id))?;

    Ok(TailorOutcome {
        session,
        tailored_resume,
        content,
    })
}

/// Interview questions for a tailored resume. The job comes from its posting
/// or, failing that, its session; the resume text from the session or, if the
/// session is gone, the tailored content itself.
pub async fn prepare_interview(
    storage: &dyn Storage,
    llm: &LlmClient,
    tailored: &TailoredResume,
) -> Result<Vec<InterviewQuestion>, AppError> {
    let session = match tailored.session_id {
        Some(id) => storage.get_session(id).await?,
        None => None,
    };
    let posting = match tailored.job_posting_id {
        Some(id) => storage.get_job_posting(id).await?,
        None => None,
    };

    let job_value = posting
        .and_then(|p| p.analysis)
        .or_else(|| session.as_ref().and_then(|s| s.job_analysis.clone()))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Tailored resume {} has no analyzed job to prepare for",
                tailored.id
            ))
        })?;
    let job_analysis: JobAnalysis = from_json(Some(&job_value));

    let resume_text = match session {
        Some(s) => s.resume_text,
        None => from_json::<TailoredContent>(Some(&tailored.content)).to_plain_text(),
    };

    generate_interview_questions(llm, &resume_text, &job_analysis).await
}
