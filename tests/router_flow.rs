//! End-to-end conversations through the router, without Telegram.

use std::sync::Arc;

use program_catalog_bot::catalogue::Catalogue;
use program_catalog_bot::commands::format::{
    ASK_BACKGROUND_TEXT, ASK_SEARCH_QUERY_TEXT, PROGRAM_NOT_FOUND_TEXT, UNKNOWN_INPUT_TEXT,
    WELCOME_TEXT,
};
use program_catalog_bot::commands::{
    CallbackData, Event, InlineButton, Keyboard, Reply, ReplyMode, Router,
};
use program_catalog_bot::config::RecommendationTable;
use program_catalog_bot::query::{QueryEngine, SearchSettings};
use program_catalog_bot::recommend::Recommender;
use program_catalog_bot::session::ConversationState;

const CATALOGUE: &str = r#"{
    "programs": [
        {
            "program_name": "Искусственный интеллект",
            "program_name_en": "Artificial Intelligence",
            "description": "Программа по ИИ",
            "website_url": "https://abit.itmo.ru/program/master/ai",
            "duration_years": 2,
            "language": "ru",
            "courses_data": {
                "courses": {
                    "Программирование на Python": {"name": "Программирование на Python", "semester": 1, "credits": 3, "hours": 108},
                    "Базы данных": {"name": "Базы данных", "semester": 2, "credits": 4, "hours": 144}
                },
                "semesters": {
                    "1": [{"name": "Программирование на Python", "semester": 1, "credits": 3, "hours": 108}],
                    "2": [{"name": "Базы данных", "semester": 2, "credits": 4, "hours": 144}]
                }
            }
        },
        {
            "program_name": "Управление ИИ-продуктами",
            "program_name_en": "AI Product",
            "description": "Продуктовая программа",
            "website_url": "https://abit.itmo.ru/program/master/ai_product",
            "duration_years": 2,
            "language": "ru",
            "courses_data": {
                "courses": {
                    "Продуктовый менеджмент": {"name": "Продуктовый менеджмент", "semester": 1, "hours": 72}
                }
            }
        }
    ],
    "metadata": {"version": "1.1", "total_programs": 2}
}"#;

const AI: &str = "Искусственный интеллект";
const USER: i64 = 42;

fn router() -> Router {
    let catalogue = Catalogue::from_json(CATALOGUE).unwrap();
    Router::new(
        QueryEngine::new(Arc::new(catalogue), SearchSettings::default()),
        Recommender::new(RecommendationTable::default()),
        Arc::new(ConversationState::new()),
    )
}

async fn say(router: &Router, text: &str) -> Reply {
    router
        .handle(Event::Message {
            user_id: USER,
            text: text.to_owned(),
        })
        .await
}

async fn press(router: &Router, callback: &CallbackData) -> Reply {
    router
        .handle(Event::Callback {
            user_id: USER,
            data: callback.encode().unwrap().into_bytes(),
        })
        .await
}

fn buttons(reply: &Reply) -> Vec<InlineButton> {
    match &reply.keyboard {
        Keyboard::Inline(rows) => rows.iter().flatten().cloned().collect(),
        other => panic!("expected inline keyboard, got {other:?}"),
    }
}

fn decoded(reply: &Reply) -> Vec<CallbackData> {
    buttons(reply)
        .iter()
        .map(|b| CallbackData::decode(b.data.as_bytes()).unwrap())
        .collect()
}

#[tokio::test]
async fn test_start_shows_main_menu() {
    let router = router();
    let reply = say(&router, "/start").await;
    assert_eq!(reply.text, WELCOME_TEXT);
    assert_eq!(reply.keyboard, Keyboard::MainMenu);
    assert_eq!(reply.mode, ReplyMode::Send);
}

#[tokio::test]
async fn test_browse_program_semesters() {
    let router = router();

    let list = say(&router, "📋 Список программ").await;
    assert_eq!(
        decoded(&list),
        vec![
            CallbackData::ShowProgram(AI.to_owned()),
            CallbackData::ShowProgram("Управление ИИ-продуктами".to_owned()),
        ]
    );

    let details = press(&router, &CallbackData::ShowProgram(AI.to_owned())).await;
    assert_eq!(details.mode, ReplyMode::Edit);
    assert!(details.text.contains("Artificial Intelligence"));
    assert!(details.text.contains("• Программирование на Python"));
    assert_eq!(
        decoded(&details),
        vec![
            CallbackData::ShowSemesters(AI.to_owned()),
            CallbackData::StartRecommendation(AI.to_owned()),
        ]
    );

    let semesters = press(&router, &CallbackData::ShowSemesters(AI.to_owned())).await;
    assert_eq!(
        decoded(&semesters),
        vec![
            CallbackData::ShowSemester(AI.to_owned(), "1".to_owned()),
            CallbackData::ShowSemester(AI.to_owned(), "2".to_owned()),
            CallbackData::ShowProgram(AI.to_owned()),
        ]
    );

    let second = press(
        &router,
        &CallbackData::ShowSemester(AI.to_owned(), "2".to_owned()),
    )
    .await;
    assert!(second.text.contains("Базы данных (4 кредитов, 144 часов)"));
    assert!(!second.text.contains("Программирование на Python"));
}

#[tokio::test]
async fn test_search_flow_is_single_shot() {
    let router = router();

    let prompt = say(&router, "🔍 Поиск курса").await;
    assert_eq!(prompt.text, ASK_SEARCH_QUERY_TEXT);
    assert_eq!(prompt.keyboard, Keyboard::Remove);

    let results = say(&router, "python").await;
    assert!(results.text.contains("Результаты поиска"));
    assert!(results.text.contains("Программирование на Python"));
    assert_eq!(results.keyboard, Keyboard::MainMenu);
    assert!(router.sessions().is_empty().await);

    let again = say(&router, "python").await;
    assert_eq!(again.text, UNKNOWN_INPUT_TEXT);
}

#[tokio::test]
async fn test_recommendation_flow() {
    let router = router();

    let prompt = press(&router, &CallbackData::StartRecommendation(AI.to_owned())).await;
    assert_eq!(prompt.text, ASK_BACKGROUND_TEXT);

    let reply = say(&router, "Имею опыт в Python и анализе данных").await;
    assert!(reply.text.contains("Рекомендации для программы"));
    assert!(reply.text.contains("• Программирование на Python"));
    assert!(reply.text.contains("• Базы данных"));
    assert!(router.sessions().is_empty().await);

    // The flow was consumed; the same text is no longer a background.
    let again = say(&router, "Имею опыт в Python").await;
    assert_eq!(again.text, UNKNOWN_INPUT_TEXT);
}

#[tokio::test]
async fn test_menu_command_cancels_pending_flow() {
    let router = router();

    press(&router, &CallbackData::StartRecommendation(AI.to_owned())).await;
    assert!(!router.sessions().is_empty().await);

    say(&router, "/help").await;
    assert!(router.sessions().is_empty().await);
}

#[tokio::test]
async fn test_program_without_credits_still_listed() {
    let router = router();

    let details = press(
        &router,
        &CallbackData::ShowProgram("Управление ИИ-продуктами".to_owned()),
    )
    .await;
    assert_eq!(details.mode, ReplyMode::Edit);
    assert!(details.text.contains("AI Product"));
}

#[tokio::test]
async fn test_unknown_program_and_garbage_callbacks_alert() {
    let router = router();

    let missing = press(&router, &CallbackData::ShowProgram("Нет такой".to_owned())).await;
    assert_eq!(missing.mode, ReplyMode::Alert);
    assert_eq!(missing.text, PROGRAM_NOT_FOUND_TEXT);

    let garbage = router
        .handle(Event::Callback {
            user_id: USER,
            data: b"program_AI".to_vec(),
        })
        .await;
    assert_eq!(garbage.mode, ReplyMode::Alert);
}
