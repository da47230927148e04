use exam_core::model::{ExamConfig, ExamId, ExamSession, OptionLabel, SessionId};
use exam_core::time::fixed_now;
use storage::repository::{
    ExamResultRecord, ExamResultRepository, QuestionRepository, SessionSnapshotRepository,
    StorageError,
};
use storage::sample::sample_questions;
use storage::sqlite::SqliteRepository;

async fn seeded(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    for q in sample_questions() {
        repo.upsert_question(&q).await.unwrap();
    }
    repo
}

#[tokio::test]
async fn sqlite_question_pool_filters_and_limits() {
    let repo = seeded("memdb_pool").await;
    assert_eq!(
        repo.count_questions().await.unwrap(),
        sample_questions().len() as u64
    );

    let picked = repo.random_questions(4, &[]).await.unwrap();
    assert_eq!(picked.len(), 4);

    let categories = vec!["Datenbanken".to_string(), "Programmierung".to_string()];
    let filtered = repo.random_questions(50, &categories).await.unwrap();
    assert!(!filtered.is_empty());
    assert!(
        filtered
            .iter()
            .all(|q| categories.iter().any(|c| c == q.category()))
    );
}

#[tokio::test]
async fn sqlite_upsert_round_trips_question_fields() {
    let repo = seeded("memdb_upsert").await;
    let original = sample_questions().remove(1);

    repo.upsert_question(&original).await.unwrap();
    assert_eq!(
        repo.count_questions().await.unwrap(),
        sample_questions().len() as u64
    );

    let all = repo.random_questions(100, &[]).await.unwrap();
    let fetched = all.into_iter().find(|q| q.id() == original.id()).unwrap();
    assert_eq!(fetched, original);
}

#[tokio::test]
async fn sqlite_results_history_is_newest_first() {
    let repo = seeded("memdb_results").await;
    let exam = ExamConfig::new(ExamId::new("netzwerk-exam").unwrap(), "Netz", 1, 3).unwrap();
    let questions = repo.random_questions(3, &[]).await.unwrap();

    let mut ids = Vec::new();
    for offset in 0..2_i64 {
        let mut session =
            ExamSession::start(SessionId::new(), exam.clone(), questions.clone(), fixed_now())
                .unwrap();
        session.answer_current(OptionLabel::A).unwrap();
        session.submit().unwrap();
        let completed_at = fixed_now() + chrono::Duration::minutes(offset);
        let result = session.complete(completed_at).unwrap();
        let record = ExamResultRecord {
            exam_id: exam.id().clone(),
            session_id: session.id(),
            completed_at,
            result,
        };
        ids.push(repo.append_result(&record).await.unwrap());
    }

    let rows = repo.recent_results(exam.id(), 10).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, ids[1]);
    assert_eq!(rows[0].record.result.total, 3);
    assert_eq!(rows[0].record.result.unanswered, 2);
}

#[tokio::test]
async fn sqlite_rejects_duplicate_session_result() {
    let repo = seeded("memdb_dup").await;
    let exam = ExamConfig::new(ExamId::new("dup").unwrap(), "Dup", 1, 1).unwrap();
    let questions = repo.random_questions(1, &[]).await.unwrap();
    let mut session =
        ExamSession::start(SessionId::new(), exam.clone(), questions, fixed_now()).unwrap();
    session.submit().unwrap();
    let record = ExamResultRecord {
        exam_id: exam.id().clone(),
        session_id: session.id(),
        completed_at: fixed_now(),
        result: session.complete(fixed_now()).unwrap(),
    };

    repo.append_result(&record).await.unwrap();
    let err = repo.append_result(&record).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn sqlite_snapshot_slot_is_replaced_and_cleared() {
    let repo = seeded("memdb_snapshot").await;
    let exam = ExamConfig::new(ExamId::new("snap").unwrap(), "Snap", 10, 2).unwrap();
    let questions = repo.random_questions(2, &[]).await.unwrap();

    let first = ExamSession::start(SessionId::new(), exam.clone(), questions.clone(), fixed_now())
        .unwrap();
    repo.save_snapshot(&first.snapshot().unwrap()).await.unwrap();

    let mut second =
        ExamSession::start(SessionId::new(), exam, questions, fixed_now()).unwrap();
    second.answer_current(OptionLabel::C).unwrap();
    second.tick();
    let snapshot = second.snapshot().unwrap();
    repo.save_snapshot(&snapshot).await.unwrap();

    let loaded = repo.load_snapshot().await.unwrap().unwrap();
    assert_eq!(loaded, snapshot);
    let restored = ExamSession::restore(loaded).unwrap();
    assert_eq!(restored.id(), second.id());
    assert_eq!(restored.remaining_secs(), 599);

    repo.clear_snapshot().await.unwrap();
    assert!(repo.load_snapshot().await.unwrap().is_none());
}
