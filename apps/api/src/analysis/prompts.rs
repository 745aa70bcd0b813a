// All LLM prompt templates for the analysis module.
// Placeholders in `{braces}` are replaced before sending.

pub const CONTACT_SYSTEM: &str =
    "You are a precise resume parser that extracts contact details exactly as written.";

/// Replace: {resume_text}
pub const CONTACT_PROMPT_TEMPLATE: &str = r#"Extract the candidate's contact information from the resume below.

Return a JSON object with this EXACT schema:
{
  "name": "Full Name" | null,
  "email": "name@example.com" | null,
  "phone": "+1 555 0100" | null,
  "location": "City, Region" | null,
  "linkedin": "https://linkedin.com/in/..." | null,
  "website": "https://..." | null
}

Use null for anything not present. Do NOT guess.

RESUME:
{resume_text}"#;

pub const JOB_ANALYSIS_SYSTEM: &str =
    "You are an expert technical recruiter who breaks job postings down into structured requirements.";

/// Replace: {job_description}
pub const JOB_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the following job posting.

Return a JSON object with this EXACT schema:
{
  "title": "Senior Backend Engineer",
  "company": "Company name" | null,
  "location": "Remote / City" | null,
  "experience_level": "entry" | "mid" | "senior" | "lead" | "executive",
  "summary": "Two-sentence summary of the role",
  "required_skills": ["Must-have skills"],
  "preferred_skills": ["Nice-to-have skills"],
  "responsibilities": ["What the person will do"],
  "qualifications": ["Degrees, certifications, years of experience"],
  "keywords": ["Terms an applicant tracking system would scan for"]
}

JOB POSTING:
{job_description}"#;

pub const MATCH_SYSTEM: &str =
    "You are a hiring manager scoring how well a resume fits a specific job. Be honest and calibrated.";

/// Replace: {resume_text}, {job_analysis_json}
pub const MATCH_PROMPT_TEMPLATE: &str = r#"Score how well this resume matches the analyzed job.

Return a JSON object with this EXACT schema:
{
  "overall_score": 0-100,
  "skills_score": 0-100,
  "experience_score": 0-100,
  "summary": "One paragraph assessment",
  "matched_skills": ["Skills the resume demonstrates"],
  "missing_skills": ["Required or preferred skills not evidenced"],
  "strengths": ["Why this candidate fits"],
  "improvements": ["Concrete changes that would raise the score"]
}

Scores are integers. 90+ means an exceptional fit; below 50 means major gaps.

JOB ANALYSIS:
{job_analysis_json}

RESUME:
{resume_text}"#;

pub const TAILOR_SYSTEM: &str =
    "You are an expert resume writer who tailors resumes to a target job without inventing facts.";

/// Replace: {grounding_instruction}, {resume_text}, {job_analysis_json}, {match_json},
///          {max_bullets}, {max_skills}, {max_highlights}
pub const TAILOR_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

Rewrite the resume below so it targets the analyzed job.

Return a JSON object with this EXACT schema:
{
  "summary": "3-4 sentence professional summary aimed at this role",
  "experience": [
    {
      "title": "Job title as written",
      "company": "Employer as written",
      "dates": "Dates as written",
      "bullets": ["Rewritten achievement bullets, at most {max_bullets}"]
    }
  ],
  "skills": ["Most relevant skills first, at most {max_skills}"],
  "highlights": ["Top selling points for this role, at most {max_highlights}"],
  "keywords_added": ["Job keywords you worked into the text"]
}

RULES:
1. Keep every employer, title and date exactly as in the resume
2. Lead bullets with strong action verbs and keep metrics that exist
3. Work in the job's keywords only where the resume supports them
4. Address the improvement suggestions where the resume allows

JOB ANALYSIS:
{job_analysis_json}

MATCH ANALYSIS:
{match_json}

RESUME:
{resume_text}"#;

pub const INTERVIEW_SYSTEM: &str =
    "You are an experienced interviewer preparing a candidate for a specific role.";

/// Replace: {resume_text}, {job_analysis_json}, {max_questions}
pub const INTERVIEW_PROMPT_TEMPLATE: &str = r#"Generate up to {max_questions} likely interview questions for this candidate and role.

Return a JSON object with this EXACT schema:
{
  "questions": [
    {
      "question": "The question",
      "category": "technical" | "behavioral" | "situational" | "role_specific",
      "suggested_answer": "How this candidate could answer, using their real experience",
      "tips": ["Short delivery tips"]
    }
  ]
}

Mix categories. Tie suggested answers to experience actually present in the resume.

JOB ANALYSIS:
{job_analysis_json}

RESUME:
{resume_text}"#;

pub const FOLLOW_UP_SYSTEM: &str =
    "You are a career coach who writes concise, professional job-search emails.";

/// Replace: {kind_description}, {candidate_name}, {company}, {position},
///          {status}, {days_since_applied}, {notes}
pub const FOLLOW_UP_PROMPT_TEMPLATE: &str = r#"Draft {kind_description} from {candidate_name} about their application.

APPLICATION:
- Company: {company}
- Position: {position}
- Current status: {status}
- Days since applying: {days_since_applied}
- Notes: {notes}

Return a JSON object with this EXACT schema:
{
  "subject": "Email subject line",
  "body": "Email body, under 150 words, signed with the candidate's name"
}

Be warm and specific. Do NOT invent interview dates, names, or details not listed above."#;

/// Replaces every `{key}` in `template` with its value in a single pass.
/// Substituted values are never rescanned, and braces that do not name a
/// known key are copied through.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (close, *value))
        });
        match hit {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
