//! Behavior every `Storage` backend must share. Each check takes a
//! `&dyn Storage`, so the in-memory tests and the Postgres tests run the
//! same assertions.
//!
//! Checks create their own users with fresh emails and only look at rows
//! they created, so they can run side by side against one shared database.

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use super::{Storage, StorageError};
use crate::models::application::{
    ApplicationStatus, FollowUp, FollowUpKind, FollowUpStatus, FollowUpUpdate, JobApplication,
    JobApplicationUpdate, NewFollowUp, NewJobApplication,
};
use crate::models::job_posting::{JobPosting, NewJobPosting};
use crate::models::resume::{
    NewStoredResume, NewTailoredResume, StoredResume, StoredResumeUpdate, TailoredResume,
    TailoredResumeUpdate,
};
use crate::models::session::{NewResumeSession, ResumeSession, ResumeSessionUpdate, SessionStatus};
use crate::models::user::{NewUser, User, UserUpdate};

fn fresh_email() -> String {
    format!("{}@example.com", Uuid::new_v4().simple())
}

pub async fn new_user(store: &dyn Storage) -> User {
    store
        .create_user(NewUser {
            email: fresh_email(),
            ..Default::default()
        })
        .await
        .unwrap()
}

pub async fn stored(store: &dyn Storage, user_id: Uuid, name: &str, is_default: bool) -> StoredResume {
    store
        .create_stored_resume(NewStoredResume {
            user_id,
            name: name.to_string(),
            content: format!("{name} content"),
            is_default,
        })
        .await
        .unwrap()
}

pub async fn application(
    store: &dyn Storage,
    user_id: Uuid,
    status: ApplicationStatus,
) -> JobApplication {
    store
        .create_application(NewJobApplication {
            user_id,
            company: "Acme".to_string(),
            position: "Engineer".to_string(),
            status,
            ..Default::default()
        })
        .await
        .unwrap()
}

async fn follow_up(store: &dyn Storage, app: &JobApplication, days: i64) -> FollowUp {
    store
        .create_follow_up(NewFollowUp {
            user_id: app.user_id,
            application_id: app.id,
            kind: FollowUpKind::CheckIn,
            due_date: Utc::now() + Duration::days(days),
            subject: format!("in {days} days"),
            message: None,
        })
        .await
        .unwrap()
}

async fn session(store: &dyn Storage, user_id: Uuid) -> ResumeSession {
    store
        .create_session(NewResumeSession {
            user_id: Some(user_id),
            resume_text: "resume".to_string(),
            job_description: "job".to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
}

async fn posting(store: &dyn Storage, user_id: Uuid, session_id: Option<Uuid>) -> JobPosting {
    store
        .create_job_posting(NewJobPosting {
            user_id,
            session_id,
            title: "Rust Engineer".to_string(),
            description: "Build services".to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
}

async fn tailored(
    store: &dyn Storage,
    user_id: Uuid,
    session_id: Option<Uuid>,
    stored_resume_id: Option<Uuid>,
    job_posting_id: Option<Uuid>,
) -> TailoredResume {
    store
        .create_tailored_resume(NewTailoredResume {
            user_id,
            session_id,
            stored_resume_id,
            job_posting_id,
            title: "Rust Engineer at Acme".to_string(),
            content: json!({"summary": "Systems engineer"}),
            match_score: Some(82),
        })
        .await
        .unwrap()
}

async fn default_ids(store: &dyn Storage, user_id: Uuid) -> Vec<Uuid> {
    store
        .list_stored_resumes_by_user(user_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.is_default)
        .map(|r| r.id)
        .collect()
}

// ── Single default ─────────────────────────────────────────────────────────

pub async fn set_default_leaves_exactly_one(store: &dyn Storage) {
    let user = new_user(store).await;
    let first = stored(store, user.id, "first", true).await;
    let second = stored(store, user.id, "second", false).await;
    let third = stored(store, user.id, "third", false).await;

    for target in [&second, &third, &first, &first] {
        let updated = store
            .set_default_stored_resume(user.id, target.id)
            .await
            .unwrap()
            .unwrap();
        assert!(updated.is_default);
        assert_eq!(default_ids(store, user.id).await, vec![target.id]);
        let default = store.get_default_stored_resume(user.id).await.unwrap().unwrap();
        assert_eq!(default.id, target.id);
    }
}

pub async fn default_flag_on_create_and_update(store: &dyn Storage) {
    let user = new_user(store).await;
    stored(store, user.id, "first", true).await;
    let second = stored(store, user.id, "second", true).await;
    assert_eq!(default_ids(store, user.id).await, vec![second.id]);

    let third = stored(store, user.id, "third", false).await;
    store
        .update_stored_resume(
            third.id,
            StoredResumeUpdate {
                is_default: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(default_ids(store, user.id).await, vec![third.id]);
}

pub async fn set_default_is_scoped_to_owner(store: &dyn Storage) {
    let alice = new_user(store).await;
    let bob = new_user(store).await;
    let alice_resume = stored(store, alice.id, "alice", true).await;
    let bob_resume = stored(store, bob.id, "bob", false).await;

    store.set_default_stored_resume(bob.id, bob_resume.id).await.unwrap();
    assert_eq!(default_ids(store, alice.id).await, vec![alice_resume.id]);

    // Not owned, or unknown: no mutation.
    let result = store.set_default_stored_resume(bob.id, alice_resume.id).await.unwrap();
    assert!(result.is_none());
    let result = store.set_default_stored_resume(bob.id, Uuid::new_v4()).await.unwrap();
    assert!(result.is_none());
    assert_eq!(default_ids(store, bob.id).await, vec![bob_resume.id]);
    assert_eq!(default_ids(store, alice.id).await, vec![alice_resume.id]);
}

/// Racing set-default calls may lose with a conflict, never with a backend
/// error, and never leave two defaults behind.
pub async fn concurrent_set_default_keeps_one(store: &dyn Storage) {
    let user = new_user(store).await;
    let a = stored(store, user.id, "a", true).await;
    let b = stored(store, user.id, "b", false).await;
    let c = stored(store, user.id, "c", false).await;
    let d = stored(store, user.id, "d", false).await;

    let results = tokio::join!(
        store.set_default_stored_resume(user.id, b.id),
        store.set_default_stored_resume(user.id, c.id),
        store.set_default_stored_resume(user.id, d.id),
        store.set_default_stored_resume(user.id, a.id),
    );
    for result in [results.0, results.1, results.2, results.3] {
        match result {
            Ok(Some(resume)) => assert_eq!(resume.user_id, user.id),
            Err(StorageError::Conflict(_)) => {}
            other => panic!("unexpected set-default outcome: {other:?}"),
        }
    }
    assert_eq!(default_ids(store, user.id).await.len(), 1);
}

// ── Partial updates and unknown ids ────────────────────────────────────────

pub async fn unknown_ids_are_none_without_mutation(store: &dyn Storage) {
    let user = new_user(store).await;
    let app = application(store, user.id, ApplicationStatus::Applied).await;
    let missing = Uuid::new_v4();

    let result = store
        .update_application(
            missing,
            JobApplicationUpdate {
                status: Some(ApplicationStatus::Rejected),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(result.is_none());
    let unchanged = store.get_application(app.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, ApplicationStatus::Applied);
    assert_eq!(unchanged.updated_at, app.updated_at);

    assert!(store.get_user(missing).await.unwrap().is_none());
    assert!(store.update_user(missing, UserUpdate::default()).await.unwrap().is_none());
    assert!(store
        .update_session(missing, ResumeSessionUpdate::default())
        .await
        .unwrap()
        .is_none());
    assert!(store
        .update_stored_resume(missing, StoredResumeUpdate::default())
        .await
        .unwrap()
        .is_none());
    assert!(store
        .update_tailored_resume(missing, TailoredResumeUpdate::default())
        .await
        .unwrap()
        .is_none());
    assert!(store
        .update_follow_up(missing, FollowUpUpdate::default())
        .await
        .unwrap()
        .is_none());
    assert!(!store.delete_job_posting(missing).await.unwrap());
}

pub async fn partial_update_merges_fields(store: &dyn Storage) {
    let user = new_user(store).await;
    let app = application(store, user.id, ApplicationStatus::Applied).await;
    let updated = store
        .update_application(
            app.id,
            JobApplicationUpdate {
                notes: Some("Recruiter replied".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.notes.as_deref(), Some("Recruiter replied"));
    assert_eq!(updated.company, "Acme");
    assert_eq!(updated.status, ApplicationStatus::Applied);
    assert!(updated.updated_at > app.updated_at);
    assert_eq!(updated.created_at, app.created_at);

    let resume = tailored(store, user.id, None, None, None).await;
    let renamed = store
        .update_tailored_resume(
            resume.id,
            TailoredResumeUpdate {
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.title, "Renamed");
    assert_eq!(renamed.match_score, Some(82));
    assert_eq!(renamed.content, json!({"summary": "Systems engineer"}));
}

pub async fn session_json_and_status_round_trip(store: &dyn Storage) {
    let user = new_user(store).await;
    let created = session(store, user.id).await;
    assert_eq!(created.status, SessionStatus::Created);

    let updated = store
        .update_session(
            created.id,
            ResumeSessionUpdate {
                job_analysis: Some(json!({"title": "Engineer", "keywords": ["rust"]})),
                status: Some(SessionStatus::Analyzed),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, SessionStatus::Analyzed);
    assert!(updated.contact_info.is_none());

    let loaded = store.get_session(created.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, SessionStatus::Analyzed);
    assert_eq!(
        loaded.job_analysis,
        Some(json!({"title": "Engineer", "keywords": ["rust"]}))
    );
    let listed = store.list_sessions_by_user(user.id).await.unwrap();
    assert_eq!(listed.len(), 1);
}

// ── Deletes ────────────────────────────────────────────────────────────────

pub async fn delete_twice_returns_false(store: &dyn Storage) {
    let user = new_user(store).await;
    let resume = stored(store, user.id, "first", false).await;
    assert!(store.delete_stored_resume(resume.id).await.unwrap());
    assert!(!store.delete_stored_resume(resume.id).await.unwrap());
    assert!(store.get_stored_resume(resume.id).await.unwrap().is_none());
}

pub async fn delete_application_removes_follow_ups(store: &dyn Storage) {
    let user = new_user(store).await;
    let app = application(store, user.id, ApplicationStatus::Applied).await;
    let pending = follow_up(store, &app, 1).await;
    assert!(store.delete_application(app.id).await.unwrap());
    assert!(store.get_follow_up(pending.id).await.unwrap().is_none());
    assert!(store.list_pending_follow_ups(user.id).await.unwrap().is_empty());
}

pub async fn delete_user_removes_owned_rows(store: &dyn Storage) {
    let doomed = new_user(store).await;
    let keeper = new_user(store).await;

    let login = store.create_auth_session(doomed.id, Duration::hours(1)).await.unwrap();
    let resume = stored(store, doomed.id, "main", true).await;
    let sess = session(store, doomed.id).await;
    let post = posting(store, doomed.id, Some(sess.id)).await;
    let tail = tailored(store, doomed.id, Some(sess.id), Some(resume.id), Some(post.id)).await;
    let app = application(store, doomed.id, ApplicationStatus::Applied).await;
    let follow = follow_up(store, &app, 2).await;

    let kept_resume = stored(store, keeper.id, "kept", true).await;
    let kept_app = application(store, keeper.id, ApplicationStatus::Saved).await;

    assert!(store.delete_user(doomed.id).await.unwrap());
    assert!(!store.delete_user(doomed.id).await.unwrap());

    assert!(store.get_user(doomed.id).await.unwrap().is_none());
    assert!(store.get_auth_session(&login.token).await.unwrap().is_none());
    assert!(store.get_stored_resume(resume.id).await.unwrap().is_none());
    assert!(store.get_default_stored_resume(doomed.id).await.unwrap().is_none());
    assert!(store.get_session(sess.id).await.unwrap().is_none());
    assert!(store.get_job_posting(post.id).await.unwrap().is_none());
    assert!(store.get_tailored_resume(tail.id).await.unwrap().is_none());
    assert!(store.get_application(app.id).await.unwrap().is_none());
    assert!(store.get_follow_up(follow.id).await.unwrap().is_none());
    assert_eq!(store.application_stats(doomed.id).await.unwrap().total, 0);

    assert!(store.get_stored_resume(kept_resume.id).await.unwrap().is_some());
    assert!(store.get_application(kept_app.id).await.unwrap().is_some());
}

pub async fn deleting_referenced_rows_clears_links(store: &dyn Storage) {
    let user = new_user(store).await;
    let resume = stored(store, user.id, "main", false).await;
    let sess = session(store, user.id).await;
    let post = posting(store, user.id, Some(sess.id)).await;
    let tail = tailored(store, user.id, Some(sess.id), Some(resume.id), Some(post.id)).await;
    let app = store
        .create_application(NewJobApplication {
            user_id: user.id,
            tailored_resume_id: Some(tail.id),
            job_posting_id: Some(post.id),
            company: "Acme".to_string(),
            position: "Engineer".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(store.delete_session(sess.id).await.unwrap());
    let post_now = store.get_job_posting(post.id).await.unwrap().unwrap();
    assert!(post_now.session_id.is_none());

    assert!(store.delete_stored_resume(resume.id).await.unwrap());
    assert!(store.delete_job_posting(post.id).await.unwrap());
    let tail_now = store.get_tailored_resume(tail.id).await.unwrap().unwrap();
    assert!(tail_now.session_id.is_none());
    assert!(tail_now.stored_resume_id.is_none());
    assert!(tail_now.job_posting_id.is_none());

    assert!(store.delete_tailored_resume(tail.id).await.unwrap());
    let app_now = store.get_application(app.id).await.unwrap().unwrap();
    assert!(app_now.tailored_resume_id.is_none());
    assert!(app_now.job_posting_id.is_none());
}

// ── Lists, ordering and aggregates ─────────────────────────────────────────

pub async fn application_stats_match_filtered_lists(store: &dyn Storage) {
    let user = new_user(store).await;
    let other = new_user(store).await;
    for status in [
        ApplicationStatus::Applied,
        ApplicationStatus::Applied,
        ApplicationStatus::Interviewing,
        ApplicationStatus::Rejected,
        ApplicationStatus::Offered,
        ApplicationStatus::Withdrawn,
    ] {
        application(store, user.id, status).await;
    }
    application(store, other.id, ApplicationStatus::Applied).await;

    let stats = store.application_stats(user.id).await.unwrap();
    assert_eq!(stats.total, 6);
    assert_eq!(stats.applied, 2);
    assert_eq!(stats.saved, 0);
    let mut sum = 0;
    for status in ApplicationStatus::ALL {
        let filtered = store
            .list_applications_by_user(user.id, Some(status))
            .await
            .unwrap();
        assert!(filtered.iter().all(|a| a.status == status));
        assert_eq!(filtered.len() as i64, stats.count(status));
        sum += stats.count(status);
    }
    assert_eq!(sum, stats.total);
    assert_eq!(
        store.list_applications_by_user(user.id, None).await.unwrap().len() as i64,
        stats.total
    );
}

pub async fn lists_are_newest_first(store: &dyn Storage) {
    let user = new_user(store).await;
    let first = application(store, user.id, ApplicationStatus::Applied).await;
    let second = application(store, user.id, ApplicationStatus::Saved).await;
    let ids: Vec<Uuid> = store
        .list_applications_by_user(user.id, None)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let older = stored(store, user.id, "older", false).await;
    let newer = stored(store, user.id, "newer", false).await;
    // Touching the older resume moves it to the front.
    store
        .update_stored_resume(
            older.id,
            StoredResumeUpdate {
                content: Some("rewritten".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let ids: Vec<Uuid> = store
        .list_stored_resumes_by_user(user.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![older.id, newer.id]);
}

pub async fn follow_ups_are_soonest_due_first(store: &dyn Storage) {
    let user = new_user(store).await;
    let app = application(store, user.id, ApplicationStatus::Applied).await;
    let later = follow_up(store, &app, 5).await;
    let overdue = follow_up(store, &app, -2).await;
    let soon = follow_up(store, &app, 1).await;

    let listed: Vec<Uuid> = store
        .list_follow_ups_by_application(app.id)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(listed, vec![overdue.id, soon.id, later.id]);

    // Due lists span every user; keep only this application's rows.
    let due: Vec<Uuid> = store
        .list_due_follow_ups(Utc::now())
        .await
        .unwrap()
        .into_iter()
        .filter(|f| f.application_id == app.id)
        .map(|f| f.id)
        .collect();
    assert_eq!(due, vec![overdue.id]);
    assert_eq!(overdue.kind, FollowUpKind::CheckIn);
}

pub async fn follow_up_stats_partition(store: &dyn Storage) {
    let user = new_user(store).await;
    let app = application(store, user.id, ApplicationStatus::Applied).await;
    let done = follow_up(store, &app, -3).await;
    follow_up(store, &app, -1).await;
    follow_up(store, &app, 2).await;
    let skipped = follow_up(store, &app, 4).await;

    let now = Utc::now();
    store
        .update_follow_up(
            done.id,
            FollowUpUpdate {
                status: Some(FollowUpStatus::Completed),
                completed_at: Some(now),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    store
        .update_follow_up(
            skipped.id,
            FollowUpUpdate {
                status: Some(FollowUpStatus::Skipped),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let stats = store.follow_up_stats(user.id, now).await.unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.pending + stats.completed + stats.skipped, stats.total);
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.overdue, 1);
    assert_eq!(
        store.list_pending_follow_ups(user.id).await.unwrap().len() as i64,
        stats.pending
    );
}

pub async fn completed_at_follows_status(store: &dyn Storage) {
    let user = new_user(store).await;
    let app = application(store, user.id, ApplicationStatus::Applied).await;
    let item = follow_up(store, &app, 1).await;
    assert!(item.completed_at.is_none());

    let stamp = Utc::now();
    let done = store
        .update_follow_up(
            item.id,
            FollowUpUpdate {
                status: Some(FollowUpStatus::Completed),
                completed_at: Some(stamp),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.status, FollowUpStatus::Completed);
    assert!(done.completed_at.is_some());

    // Editing the message keeps the completion.
    let edited = store
        .update_follow_up(
            item.id,
            FollowUpUpdate {
                message: Some("Sent".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert!(edited.completed_at.is_some());

    let reopened = store
        .update_follow_up(
            item.id,
            FollowUpUpdate {
                status: Some(FollowUpStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reopened.status, FollowUpStatus::Pending);
    assert!(reopened.completed_at.is_none());
}

// ── Users and auth sessions ────────────────────────────────────────────────

pub async fn duplicate_email_conflicts(store: &dyn Storage) {
    let email = fresh_email();
    store
        .create_user(NewUser {
            email: email.to_uppercase(),
            ..Default::default()
        })
        .await
        .unwrap();
    let err = store
        .create_user(NewUser {
            email: email.clone(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));
    let found = store.get_user_by_email(&email.to_uppercase()).await.unwrap().unwrap();
    assert_eq!(found.email, email);
}

pub async fn auth_session_lifecycle(store: &dyn Storage) {
    let user = new_user(store).await;
    let session = store.create_auth_session(user.id, Duration::hours(1)).await.unwrap();
    let loaded = store.get_auth_session(&session.token).await.unwrap().unwrap();
    assert_eq!(loaded.user_id, user.id);
    assert!(!loaded.is_expired(Utc::now()));
    assert!(store.delete_auth_session(&session.token).await.unwrap());
    assert!(!store.delete_auth_session(&session.token).await.unwrap());
}

pub async fn admin_flag_updates(store: &dyn Storage) {
    let user = new_user(store).await;
    assert!(!user.is_admin);
    let promoted = store
        .update_user(
            user.id,
            UserUpdate {
                is_admin: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert!(promoted.is_admin);
    assert_eq!(promoted.email, user.email);
    assert!(store.list_users().await.unwrap().iter().any(|u| u.id == user.id));
}

/// Expands to one `#[tokio::test]` per named check, each run against a fresh
/// handle built by the `store` expression.
macro_rules! storage_conformance_tests {
    (store = $store:expr; $($check:ident),+ $(,)?) => {
        $(
            #[tokio::test]
            async fn $check() {
                let store = $store;
                crate::storage::conformance::$check(&store).await;
            }
        )+
    };
    (ignore = $reason:literal, store = $store:expr; $($check:ident),+ $(,)?) => {
        $(
            #[tokio::test]
            #[ignore = $reason]
            async fn $check() {
                let store = $store;
                crate::storage::conformance::$check(&store).await;
            }
        )+
    };
}

pub(crate) use storage_conformance_tests;
