mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{quiz_reply, test_config, Reply, ScriptedGenerator};
use study_assistant::models::question::{Question, Quiz};
use study_assistant::services::quiz_service::{QuizService, QuizSettings};

fn service(generator: Arc<ScriptedGenerator>) -> QuizService {
    QuizService::new(generator, QuizSettings::from_config(&test_config()))
}

fn assert_valid(quiz: &Quiz, expected: usize) {
    assert_eq!(quiz.questions.len(), expected);
    let keys: HashSet<String> = quiz.questions.iter().map(Question::key).collect();
    assert_eq!(keys.len(), expected);
    for q in &quiz.questions {
        assert!(!q.question.trim().is_empty());
        assert_eq!(q.options.len(), 4);
        assert!(q.answer_index <= 3);
    }
}

#[tokio::test]
async fn every_supported_count_is_honoured() {
    for count in [10usize, 20, 30, 50] {
        // full reply, partial reply, and outright failure
        for script in [
            vec![Reply::Text(quiz_reply(count))],
            vec![Reply::Text(quiz_reply(count / 2))],
            vec![Reply::Fail, Reply::Fail],
        ] {
            let generator = ScriptedGenerator::new(script);
            let quiz = service(generator).build("Operating Systems", "medium", Some(count as i64)).await;
            assert_valid(&quiz, count);
        }
    }
}

#[tokio::test]
async fn unsupported_count_falls_back_to_ten() {
    let generator = ScriptedGenerator::new([Reply::Text(quiz_reply(40))]);
    let quiz = service(generator).build("Networks", "easy", Some(15)).await;
    assert_valid(&quiz, 10);
}

#[tokio::test]
async fn failing_service_still_yields_topic_questions() {
    let generator = ScriptedGenerator::failing();
    let quiz = service(generator.clone())
        .build("Binary Trees", "hard", Some(10))
        .await;
    assert_valid(&quiz, 10);
    assert!(quiz.questions.iter().all(|q| q.question.contains("Binary Trees")));

    let requests = generator.requests();
    assert_eq!(requests.len(), 2, "one attempt plus exactly one retry");
    assert_eq!(requests[0].model, test_config().quiz_model);
    assert_eq!(requests[1].model, test_config().quiz_retry_model);
    assert_eq!(requests[1].temperature, 0.2);
}

#[tokio::test]
async fn shuffled_answers_still_point_at_the_correct_text() {
    let generator = ScriptedGenerator::new([Reply::Text(quiz_reply(30))]);
    let quiz = service(generator).build("Compilers", "god level", Some(30)).await;
    assert_valid(&quiz, 30);
    for (i, q) in quiz.questions.iter().enumerate() {
        assert_eq!(q.question, format!("Model question {}?", i));
        assert_eq!(q.correct_option(), format!("correct {}", i));
    }
}

#[tokio::test]
async fn malformed_first_reply_recovers_on_retry() {
    let generator = ScriptedGenerator::new([
        Reply::Text("{\"quiz\": [ this is not json".into()),
        Reply::Text(quiz_reply(10)),
    ]);
    let quiz = service(generator.clone()).build("Databases", "easy", None).await;
    assert_valid(&quiz, 10);
    assert!(quiz.questions.iter().all(|q| q.question.starts_with("Model question")));
    assert!(generator.requests()[1].prompt.contains("(no markdown)"));
}
