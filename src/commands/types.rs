//! Command, callback payload and reply types.

use std::fmt;

use thiserror::Error;

use crate::session::UserId;

/// Telegram's limit on inline button callback data, in bytes.
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

/// Main menu button labels.
pub const LIST_PROGRAMS_LABEL: &str = "📋 Список программ";
pub const SEARCH_COURSE_LABEL: &str = "🔍 Поиск курса";
pub const RECOMMENDATIONS_LABEL: &str = "💡 Рекомендации";
pub const HELP_LABEL: &str = "ℹ️ Помощь";

/// An inbound event delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A free-text message.
    Message { user_id: UserId, text: String },

    /// An inline button press carrying raw callback data.
    Callback { user_id: UserId, data: Vec<u8> },
}

impl Event {
    /// Returns the user the event came from.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        match self {
            Self::Message { user_id, .. } | Self::Callback { user_id, .. } => *user_id,
        }
    }
}

/// Commands reachable from the main menu or as slash commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    /// Greet the user and show the main menu.
    Start,

    /// Show help information.
    Help,

    /// List all programs.
    ListPrograms,

    /// Ask for a course search query.
    SearchCourse,

    /// Pick a program for course recommendations.
    Recommendations,
}

impl MenuCommand {
    /// Parses a menu command from message text.
    ///
    /// Returns `None` if the message is not a command.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();

        if let Some(after_slash) = text.strip_prefix('/') {
            // "/start@SomeBot payload" -> "start"
            let word = after_slash.split_whitespace().next().unwrap_or_default();
            let cmd = word.split('@').next().unwrap_or_default().to_lowercase();
            return match cmd.as_str() {
                "start" | "menu" => Some(Self::Start),
                "help" => Some(Self::Help),
                "programs" | "list" => Some(Self::ListPrograms),
                "search" => Some(Self::SearchCourse),
                "recommend" => Some(Self::Recommendations),
                _ => None,
            };
        }

        match text {
            LIST_PROGRAMS_LABEL => Some(Self::ListPrograms),
            SEARCH_COURSE_LABEL => Some(Self::SearchCourse),
            RECOMMENDATIONS_LABEL => Some(Self::Recommendations),
            HELP_LABEL => Some(Self::Help),
            _ => None,
        }
    }

    /// Returns the command name as it appears in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::ListPrograms => "programs",
            Self::SearchCourse => "search",
            Self::Recommendations => "recommend",
        }
    }

    /// Main menu layout, two buttons per row.
    #[must_use]
    pub fn main_menu() -> Vec<Vec<&'static str>> {
        vec![
            vec![LIST_PROGRAMS_LABEL, SEARCH_COURSE_LABEL],
            vec![RECOMMENDATIONS_LABEL, HELP_LABEL],
        ]
    }
}

impl fmt::Display for MenuCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors decoding or encoding callback payloads.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallbackError {
    #[error("Empty callback payload")]
    Empty,

    #[error("Callback payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("Unknown callback tag: '{0}'")]
    UnknownTag(char),

    #[error("Malformed callback payload: {0}")]
    Malformed(String),

    #[error("Callback tag '{tag}' expects {expected} segment(s), found {found}")]
    SegmentCount {
        tag: char,
        expected: usize,
        found: usize,
    },

    #[error("Callback payload is {len} bytes, limit is 64")]
    TooLong { len: usize },
}

/// Structured inline-button payload.
///
/// Encoded as a one-letter tag followed by length-prefixed segments,
/// `<tag>(<byte-len>:<segment>)*`, so segments may contain any character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackData {
    ShowProgram(String),
    ShowSemesters(String),
    ShowSemester(String, String),
    StartRecommendation(String),
}

impl CallbackData {
    const SHOW_PROGRAM: char = 'p';
    const SHOW_SEMESTERS: char = 'l';
    const SHOW_SEMESTER: char = 's';
    const START_RECOMMENDATION: char = 'r';

    /// Returns the one-letter tag of this payload.
    #[must_use]
    pub const fn tag(&self) -> char {
        match self {
            Self::ShowProgram(_) => Self::SHOW_PROGRAM,
            Self::ShowSemesters(_) => Self::SHOW_SEMESTERS,
            Self::ShowSemester(..) => Self::SHOW_SEMESTER,
            Self::StartRecommendation(_) => Self::START_RECOMMENDATION,
        }
    }

    fn segments(&self) -> Vec<&str> {
        match self {
            Self::ShowProgram(p) | Self::ShowSemesters(p) | Self::StartRecommendation(p) => {
                vec![p.as_str()]
            }
            Self::ShowSemester(p, s) => vec![p.as_str(), s.as_str()],
        }
    }

    /// Encodes the payload.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError::TooLong`] if the result exceeds Telegram's limit.
    pub fn encode(&self) -> Result<String, CallbackError> {
        let mut out = String::new();
        out.push(self.tag());
        for segment in self.segments() {
            out.push_str(&segment.len().to_string());
            out.push(':');
            out.push_str(segment);
        }

        if out.len() > MAX_CALLBACK_DATA_LEN {
            return Err(CallbackError::TooLong { len: out.len() });
        }
        Ok(out)
    }

    /// Decodes a payload received from the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a valid encoding.
    pub fn decode(data: &[u8]) -> Result<Self, CallbackError> {
        let text = std::str::from_utf8(data).map_err(|_| CallbackError::InvalidUtf8)?;
        let mut chars = text.chars();
        let tag = chars.next().ok_or(CallbackError::Empty)?;
        let segments = parse_segments(chars.as_str())?;

        let expected = match tag {
            Self::SHOW_PROGRAM | Self::SHOW_SEMESTERS | Self::START_RECOMMENDATION => 1,
            Self::SHOW_SEMESTER => 2,
            other => return Err(CallbackError::UnknownTag(other)),
        };
        if segments.len() != expected {
            return Err(CallbackError::SegmentCount {
                tag,
                expected,
                found: segments.len(),
            });
        }

        let mut segments = segments.into_iter().map(str::to_owned);
        let mut next = || segments.next().unwrap_or_default();

        Ok(match tag {
            Self::SHOW_PROGRAM => Self::ShowProgram(next()),
            Self::SHOW_SEMESTERS => Self::ShowSemesters(next()),
            Self::START_RECOMMENDATION => Self::StartRecommendation(next()),
            _ => {
                let program = next();
                Self::ShowSemester(program, next())
            }
        })
    }
}

fn parse_segments(mut rest: &str) -> Result<Vec<&str>, CallbackError> {
    let mut segments = Vec::new();

    while !rest.is_empty() {
        let (len_str, after) = rest
            .split_once(':')
            .ok_or_else(|| CallbackError::Malformed("missing length separator".to_owned()))?;
        let len: usize = len_str
            .parse()
            .map_err(|_| CallbackError::Malformed(format!("invalid segment length '{len_str}'")))?;
        let segment = after
            .get(..len)
            .ok_or_else(|| CallbackError::Malformed(format!("segment shorter than {len} bytes")))?;
        segments.push(segment);
        rest = &after[len..];
    }

    Ok(segments)
}

impl fmt::Display for CallbackData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShowProgram(p) => write!(f, "show_program({p})"),
            Self::ShowSemesters(p) => write!(f, "show_semesters({p})"),
            Self::ShowSemester(p, s) => write!(f, "show_semester({p}, {s})"),
            Self::StartRecommendation(p) => write!(f, "start_recommendation({p})"),
        }
    }
}

/// One inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    /// Encoded [`CallbackData`].
    pub data: String,
}

/// Keyboard attached to a reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Keyboard {
    /// Leave the current keyboard as it is.
    #[default]
    None,

    /// Show the main menu reply keyboard.
    MainMenu,

    /// Hide the reply keyboard (free-text input expected).
    Remove,

    /// Inline buttons under the message.
    Inline(Vec<Vec<InlineButton>>),
}

/// How the transport should deliver a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// Send a new message.
    Send,

    /// Replace the message whose button was pressed.
    Edit,

    /// Short notification answering a button press.
    Alert,
}

/// A formatted response produced by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Message text (HTML subset).
    pub text: String,

    pub keyboard: Keyboard,

    pub mode: ReplyMode,
}

impl Reply {
    /// Creates a reply sent as a new message.
    #[must_use]
    pub fn send(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
            mode: ReplyMode::Send,
        }
    }

    /// Creates a reply that edits the originating message.
    #[must_use]
    pub fn edit(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
            mode: ReplyMode::Edit,
        }
    }

    /// Creates a plain-text callback alert.
    #[must_use]
    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::None,
            mode: ReplyMode::Alert,
        }
    }
}
