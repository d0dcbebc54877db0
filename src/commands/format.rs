//! HTML rendering of bot replies.
//!
//! Only the Telegram HTML subset is used: `<b>`, `<i>` and line breaks.
//! Catalogue and user text is always escaped before interpolation.

use std::fmt::Write as _;

use crate::catalogue::{Course, SemesterKey};
use crate::query::{ProgramSummary, SearchOutcome};
use crate::recommend::Recommendation;

pub const WELCOME_TEXT: &str = "👋 Привет! Я помогу тебе с информацией о магистерских программах.\n\
                                Выбери действие:";

pub const HELP_TEXT: &str = "🤖 <b>Помощь по боту</b>\n\n\
    Я помогаю получить информацию о магистерских программах.\n\n\
    📋 <b>Список программ</b> - просмотр всех доступных программ\n\
    🔍 <b>Поиск курса</b> - поиск курсов по названию или ключевым словам\n\
    💡 <b>Рекомендации</b> - персональные рекомендации курсов\n\n\
    Для возврата в главное меню используйте команду /start";

pub const UNKNOWN_INPUT_TEXT: &str =
    "🤔 Не понял запрос. Воспользуйтесь меню или командой /help.";

pub const PROGRAM_LIST_TEXT: &str = "🏛 Доступные программы магистратуры:";
pub const NO_PROGRAMS_TEXT: &str = "😔 Список программ пока пуст.";
pub const PICK_PROGRAM_FOR_RECOMMENDATION_TEXT: &str =
    "📊 Для рекомендации курсов выберите программу:";
pub const ASK_SEARCH_QUERY_TEXT: &str = "🔍 Введите название курса или ключевые слова:";
pub const ASK_BACKGROUND_TEXT: &str = "📝 Опишите ваш опыт и интересы \
    (например: 'Имею опыт в Python и анализе данных'):";
pub const RESTART_FLOW_TEXT: &str = "❌ Не удалось определить программу. Попробуйте снова.";
pub const PROGRAM_NOT_FOUND_TEXT: &str =
    "Программа не найдена. Откройте список программ заново.";
pub const GENERIC_ERROR_TEXT: &str = "Произошла ошибка, попробуйте позже";

/// Escapes text for Telegram's HTML parse mode.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Russian plural form of "year" for a count.
fn years_word(n: u32) -> &'static str {
    match (n % 10, n % 100) {
        (1, r) if r != 11 => "год",
        (2..=4, r) if !(12..=14).contains(&r) => "года",
        _ => "лет",
    }
}

/// Program detail page.
#[must_use]
pub fn render_program(summary: &ProgramSummary) -> String {
    let mut out = format!(
        "<b>{}</b> ({})\n\n\
         📝 <b>Описание:</b> {}\n\
         ⏳ <b>Длительность:</b> {} {}\n\
         🌐 <b>Язык:</b> {}\n\
         🔗 <b>Сайт:</b> {}\n\n\
         📚 <b>Основные дисциплины:</b>\n",
        escape_html(&summary.name),
        escape_html(&summary.name_en),
        escape_html(&summary.description),
        summary.duration_years,
        years_word(summary.duration_years),
        escape_html(&summary.language.to_uppercase()),
        escape_html(&summary.website_url),
    );

    if summary.first_courses.is_empty() {
        out.push_str("—");
    } else {
        out.push_str(&bullet_list(&summary.first_courses));
    }
    out
}

/// Header of the semester picker.
#[must_use]
pub fn render_semester_picker(program: &str, semesters: &[SemesterKey]) -> String {
    if semesters.is_empty() {
        format!(
            "📅 Для программы <b>{}</b> нет данных по семестрам.",
            escape_html(program)
        )
    } else {
        format!(
            "📅 Выберите семестр программы <b>{}</b>:",
            escape_html(program)
        )
    }
}

/// Label of a semester button.
#[must_use]
pub fn semester_label(semester: &SemesterKey) -> String {
    format!("Семестр {semester}")
}

/// Courses of one semester.
#[must_use]
pub fn render_semester_courses(program: &str, semester: &str, courses: &[Course]) -> String {
    let mut out = format!(
        "📚 <b>Курсы {}, семестр {}:</b>\n\n",
        escape_html(program),
        escape_html(semester)
    );

    if courses.is_empty() {
        out.push_str("В этом семестре курсов нет.");
        return out;
    }

    for course in courses {
        let _ = writeln!(
            out,
            "• {} ({} кредитов, {} часов)",
            escape_html(&course.name),
            course.credits,
            course.hours
        );
    }
    out
}

/// Search results or suggestions.
#[must_use]
pub fn render_search(outcome: &SearchOutcome<'_>) -> String {
    match outcome {
        SearchOutcome::Hits(hits) => {
            let mut out = "🔍 <b>Результаты поиска:</b>\n\n".to_owned();
            for hit in hits {
                let semester = hit
                    .course
                    .semester
                    .map_or_else(|| "—".to_owned(), |s| s.to_string());
                let _ = write!(
                    out,
                    "📚 <b>{}</b>\n🏛 <i>{}</i>\n📅 Семестр: {} | 🎓 Кредиты: {}\n\n",
                    escape_html(&hit.course.name),
                    escape_html(hit.program_name),
                    semester,
                    hit.course.credits
                );
            }
            out.trim_end().to_owned()
        }
        SearchOutcome::Suggestions(names) => {
            let names: Vec<String> = names.iter().map(|n| (*n).to_owned()).collect();
            format!(
                "❌ Точных совпадений не найдено. Возможно, вы искали:\n\n{}",
                bullet_list(&names)
            )
        }
        SearchOutcome::Nothing => "❌ Ничего не найдено. Попробуйте изменить запрос.".to_owned(),
    }
}

/// Recommendation response.
#[must_use]
pub fn render_recommendation(
    program: &str,
    background: &str,
    recommendation: &Recommendation,
) -> String {
    let intro = if recommendation.is_fallback {
        "Подходящих ключевых слов не нашлось, начните с базовых курсов:"
    } else {
        "Мы рекомендуем следующие курсы:"
    };

    format!(
        "🎓 <b>Рекомендации для программы {}</b>\n\
         📌 На основе вашего опыта: <i>{}</i>\n\n\
         {intro}\n{}",
        escape_html(program),
        escape_html(background.trim()),
        bullet_list(&recommendation.courses)
    )
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("• {}", escape_html(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncates a string to a maximum length, adding "..." if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
