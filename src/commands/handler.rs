//! Event router.
//!
//! Turns inbound transport events into formatted replies. Every
//! per-interaction failure is converted into a user-visible message here;
//! nothing propagates to the serving loop.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::format::{
    self, render_program, render_recommendation, render_search, render_semester_courses,
    render_semester_picker, semester_label, truncate,
};
use super::types::{CallbackData, Event, InlineButton, Keyboard, MenuCommand, Reply};
use crate::catalogue::Program;
use crate::query::{courses_in_semester, list_semesters, program_summary, QueryEngine};
use crate::recommend::Recommender;
use crate::session::{ConversationState, PendingFlow, UserId};

/// Routes events to the query and recommendation engines.
pub struct Router {
    /// Catalogue queries.
    queries: QueryEngine,

    /// Keyword recommendation engine.
    recommender: Recommender,

    /// Pending multi-step flows, shared with whoever owns the router.
    sessions: Arc<ConversationState>,
}

impl Router {
    /// Creates a new router.
    #[must_use]
    pub fn new(
        queries: QueryEngine,
        recommender: Recommender,
        sessions: Arc<ConversationState>,
    ) -> Self {
        Self {
            queries,
            recommender,
            sessions,
        }
    }

    /// Returns the conversation state store.
    #[must_use]
    pub fn sessions(&self) -> &Arc<ConversationState> {
        &self.sessions
    }

    /// Handles one inbound event and produces the reply to deliver.
    pub async fn handle(&self, event: Event) -> Reply {
        match event {
            Event::Message { user_id, text } => {
                debug!("Message from {}: \"{}\"", user_id, truncate(&text, 40));
                self.handle_message(user_id, &text).await
            }
            Event::Callback { user_id, data } => self.handle_callback(user_id, &data).await,
        }
    }

    async fn handle_message(&self, user_id: UserId, text: &str) -> Reply {
        if let Some(command) = MenuCommand::parse(text) {
            info!("User {} ran command: {}", user_id, command);
            // A menu command abandons whatever flow was pending.
            self.sessions.cancel(user_id).await;
            return self.execute(user_id, command).await;
        }

        match self.sessions.take(user_id).await {
            Some(PendingFlow::AwaitingSearchQuery) => self.handle_search(text),
            Some(PendingFlow::AwaitingBackground { program }) => {
                self.handle_background(user_id, &program, text)
            }
            None => Reply::send(format::UNKNOWN_INPUT_TEXT, Keyboard::MainMenu),
        }
    }

    async fn execute(&self, user_id: UserId, command: MenuCommand) -> Reply {
        match command {
            MenuCommand::Start => Reply::send(format::WELCOME_TEXT, Keyboard::MainMenu),
            MenuCommand::Help => Reply::send(format::HELP_TEXT, Keyboard::MainMenu),
            MenuCommand::ListPrograms => self.handle_list_programs(),
            MenuCommand::SearchCourse => {
                self.sessions.begin_search(user_id).await;
                Reply::send(format::ASK_SEARCH_QUERY_TEXT, Keyboard::Remove)
            }
            MenuCommand::Recommendations => self.handle_pick_for_recommendation(),
        }
    }

    async fn handle_callback(&self, user_id: UserId, data: &[u8]) -> Reply {
        let callback = match CallbackData::decode(data) {
            Ok(callback) => callback,
            Err(e) => {
                warn!("Rejected callback from {}: {}", user_id, e);
                return Reply::alert(format::GENERIC_ERROR_TEXT);
            }
        };

        debug!("Callback from {}: {}", user_id, callback);

        match callback {
            CallbackData::ShowProgram(name) => self.handle_show_program(&name),
            CallbackData::ShowSemesters(name) => self.handle_show_semesters(&name),
            CallbackData::ShowSemester(name, semester) => {
                self.handle_show_semester(&name, &semester)
            }
            CallbackData::StartRecommendation(name) => {
                self.handle_start_recommendation(user_id, &name).await
            }
        }
    }

    fn handle_list_programs(&self) -> Reply {
        let rows = self.program_buttons(CallbackData::ShowProgram);
        if rows.is_empty() {
            return Reply::send(format::NO_PROGRAMS_TEXT, Keyboard::MainMenu);
        }
        Reply::send(format::PROGRAM_LIST_TEXT, Keyboard::Inline(rows))
    }

    fn handle_pick_for_recommendation(&self) -> Reply {
        let rows = self.program_buttons(CallbackData::StartRecommendation);
        if rows.is_empty() {
            return Reply::send(format::NO_PROGRAMS_TEXT, Keyboard::MainMenu);
        }
        Reply::send(
            format::PICK_PROGRAM_FOR_RECOMMENDATION_TEXT,
            Keyboard::Inline(rows),
        )
    }

    fn handle_show_program(&self, name: &str) -> Reply {
        let Some(program) = self.lookup(name) else {
            return Reply::alert(format::PROGRAM_NOT_FOUND_TEXT);
        };

        let text = render_program(&program_summary(program));
        let row: Vec<InlineButton> = [
            button(
                "📅 Показать по семестрам",
                &CallbackData::ShowSemesters(program.name.clone()),
            ),
            button(
                "💡 Подобрать курсы",
                &CallbackData::StartRecommendation(program.name.clone()),
            ),
        ]
        .into_iter()
        .flatten()
        .collect();

        Reply::edit(text, inline(vec![row]))
    }

    fn handle_show_semesters(&self, name: &str) -> Reply {
        let Some(program) = self.lookup(name) else {
            return Reply::alert(format::PROGRAM_NOT_FOUND_TEXT);
        };

        let semesters = list_semesters(program);
        let mut rows: Vec<Vec<InlineButton>> = semesters
            .iter()
            .filter_map(|semester| {
                button(
                    &semester_label(semester),
                    &CallbackData::ShowSemester(program.name.clone(), semester.to_string()),
                )
            })
            .map(|b| vec![b])
            .collect();
        rows.extend(
            button("⬅️ Назад", &CallbackData::ShowProgram(program.name.clone())).map(|b| vec![b]),
        );

        Reply::edit(render_semester_picker(&program.name, &semesters), inline(rows))
    }

    fn handle_show_semester(&self, name: &str, semester: &str) -> Reply {
        let Some(program) = self.lookup(name) else {
            return Reply::alert(format::PROGRAM_NOT_FOUND_TEXT);
        };

        let courses = courses_in_semester(program, semester);
        let rows: Vec<Vec<InlineButton>> = button(
            "⬅️ К списку семестров",
            &CallbackData::ShowSemesters(program.name.clone()),
        )
        .map(|b| vec![vec![b]])
        .unwrap_or_default();

        Reply::edit(
            render_semester_courses(&program.name, semester, courses),
            inline(rows),
        )
    }

    async fn handle_start_recommendation(&self, user_id: UserId, name: &str) -> Reply {
        let Some(program) = self.lookup(name) else {
            return Reply::alert(format::PROGRAM_NOT_FOUND_TEXT);
        };

        self.sessions.begin(user_id, program.name.clone()).await;
        Reply::send(format::ASK_BACKGROUND_TEXT, Keyboard::Remove)
    }

    fn handle_search(&self, query: &str) -> Reply {
        let outcome = self.queries.search(query);
        Reply::send(render_search(&outcome), Keyboard::MainMenu)
    }

    fn handle_background(&self, user_id: UserId, program_name: &str, background: &str) -> Reply {
        let Some(program) = self.lookup(program_name) else {
            info!("User {} had a flow for unknown program '{}'", user_id, program_name);
            return Reply::send(format::RESTART_FLOW_TEXT, Keyboard::MainMenu);
        };

        let recommendation = self.recommender.recommend(program, background);
        info!(
            "Recommended {} courses for user {} (program: '{}', fallback: {})",
            recommendation.courses.len(),
            user_id,
            program.name,
            recommendation.is_fallback
        );

        Reply::send(
            render_recommendation(&program.name, background, &recommendation),
            Keyboard::MainMenu,
        )
    }

    /// Finds a program, logging references to programs that no longer exist.
    fn lookup(&self, name: &str) -> Option<&Program> {
        match self.queries.find_program(name) {
            Ok(program) => Some(program),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    /// One button per program, each in its own row.
    fn program_buttons(&self, action: fn(String) -> CallbackData) -> Vec<Vec<InlineButton>> {
        self.queries
            .list_programs()
            .iter()
            .filter_map(|p| button(&p.name, &action(p.name.clone())))
            .map(|b| vec![b])
            .collect()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("programs", &self.queries.list_programs().len())
            .field("keyword_rules", &self.recommender.table().len())
            .finish_non_exhaustive()
    }
}

/// Builds an inline button, dropping it if its payload cannot be encoded.
fn button(text: &str, data: &CallbackData) -> Option<InlineButton> {
    match data.encode() {
        Ok(encoded) => Some(InlineButton {
            text: text.to_owned(),
            data: encoded,
        }),
        Err(e) => {
            warn!("Omitting button \"{}\" ({}): {}", text, data, e);
            None
        }
    }
}

fn inline(rows: Vec<Vec<InlineButton>>) -> Keyboard {
    if rows.is_empty() {
        Keyboard::None
    } else {
        Keyboard::Inline(rows)
    }
}
