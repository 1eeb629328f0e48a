//! services/console/src/shell/command.rs
//!
//! Parses console input lines into intents.

use bookstore_core::{BookDraft, BookId, FilterCriteria, SortKey};

//=========================================================================================
// Commands
//=========================================================================================

/// A book field that `add` and `edit` can set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Author,
    Category,
    Price,
    Rating,
    Date,
}

impl Field {
    fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "title" => Some(Field::Title),
            "author" => Some(Field::Author),
            "category" => Some(Field::Category),
            "price" => Some(Field::Price),
            "rating" => Some(Field::Rating),
            "date" | "published" | "publisheddate" => Some(Field::Date),
            _ => None,
        }
    }

    pub fn apply(self, draft: &mut BookDraft, value: String) {
        match self {
            Field::Title => draft.title = value,
            Field::Author => draft.author = value,
            Field::Category => draft.category = value,
            Field::Price => draft.price = value,
            Field::Rating => draft.rating = value,
            Field::Date => draft.published_date = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { email: String, password: String },
    Signup { email: String, password: String },
    Logout,
    List,
    All,
    /// 1-based page number as the user typed it.
    Page(u32),
    Next,
    Prev,
    Sort(SortKey),
    Search(String),
    Filter(FilterCriteria),
    Reset,
    Show(BookId),
    Add(Vec<(Field, String)>),
    Edit(BookId, Vec<(Field, String)>),
    Delete(BookId),
    Confirm,
    Cancel,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("empty input")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    Invalid(String),
}

pub const HELP: &str = "\
commands:
  login <email> <password>     signup <email> <password>     logout
  list                         all                           show <id>
  page <n>   next   prev       sort <price|title|author|rating|publishedDate>
  search <words...>            filter [author=..] [category=..] [rating=..]
  reset                        add title=.. author=.. [category=.. price=.. rating=.. date=YYYY-MM-DD]
  edit <id> field=value...     delete <id>   confirm   cancel
  help                         quit";

//=========================================================================================
// Parsing
//=========================================================================================

pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    if verb.is_empty() {
        return Err(CommandError::Empty);
    }

    match verb.to_ascii_lowercase().as_str() {
        "login" => credentials(rest, "login <email> <password>")
            .map(|(email, password)| Command::Login { email, password }),
        "signup" => credentials(rest, "signup <email> <password>")
            .map(|(email, password)| Command::Signup { email, password }),
        "logout" => Ok(Command::Logout),
        "list" | "ls" => Ok(Command::List),
        "all" => Ok(Command::All),
        "page" => rest
            .parse::<u32>()
            .ok()
            .filter(|n| *n >= 1)
            .map(Command::Page)
            .ok_or(CommandError::Usage("page <n> (n starts at 1)")),
        "next" => Ok(Command::Next),
        "prev" => Ok(Command::Prev),
        "sort" => rest
            .parse::<SortKey>()
            .map(Command::Sort)
            .map_err(|e| CommandError::Invalid(e.to_string())),
        "search" => Ok(Command::Search(rest.to_string())),
        "filter" => filter(rest).map(Command::Filter),
        "reset" => Ok(Command::Reset),
        "show" => id(rest, "show <id>").map(Command::Show),
        "add" => fields(rest).map(Command::Add),
        "edit" => {
            let (target, assignments) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let id = id(target, "edit <id> field=value...")?;
            let fields = fields(assignments)?;
            if fields.is_empty() {
                return Err(CommandError::Usage("edit <id> field=value..."));
            }
            Ok(Command::Edit(id, fields))
        }
        "delete" | "rm" => id(rest, "delete <id>").map(Command::Delete),
        "confirm" | "yes" => Ok(Command::Confirm),
        "cancel" | "no" => Ok(Command::Cancel),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn credentials(rest: &str, usage: &'static str) -> Result<(String, String), CommandError> {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(email), Some(password), None) => Ok((email.to_string(), password.to_string())),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn id(rest: &str, usage: &'static str) -> Result<BookId, CommandError> {
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return Err(CommandError::Usage(usage));
    }
    rest.parse::<BookId>()
        .map_err(|_| CommandError::Usage(usage))
}

/// Splits `key=value` assignments. A value runs until the next token that starts
/// a new assignment, so `title=The Dispossessed author=Le Guin` has two fields.
fn assignments<'a>(
    rest: &'a str,
    is_key: impl Fn(&str) -> bool,
) -> Result<Vec<(&'a str, String)>, CommandError> {
    let mut pairs: Vec<(&str, String)> = Vec::new();
    for token in rest.split_whitespace() {
        match token.split_once('=') {
            Some((key, value)) if is_key(key) => pairs.push((key, value.to_string())),
            _ => match pairs.last_mut() {
                Some((_, value)) => {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(token);
                }
                None => {
                    return Err(CommandError::Invalid(format!(
                        "expected field=value, got '{token}'"
                    )))
                }
            },
        }
    }
    Ok(pairs)
}

fn fields(rest: &str) -> Result<Vec<(Field, String)>, CommandError> {
    assignments(rest, |key| Field::from_key(key).is_some())?
        .into_iter()
        .map(|(key, value)| {
            Field::from_key(key)
                .map(|field| (field, value))
                .ok_or_else(|| CommandError::Invalid(format!("unknown field '{key}'")))
        })
        .collect()
}

fn filter(rest: &str) -> Result<FilterCriteria, CommandError> {
    let is_key = |key: &str| matches!(key, "author" | "category" | "rating");
    let mut criteria = FilterCriteria::default();
    for (key, value) in assignments(rest, is_key)? {
        match key {
            "author" => criteria.author = Some(value),
            "category" => criteria.category = Some(value),
            _ if value.trim().is_empty() => criteria.min_rating = None,
            _ => {
                let rating = value
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|r| (0.0..=5.0).contains(r))
                    .ok_or_else(|| {
                        CommandError::Invalid(format!("rating '{value}' must be between 0 and 5"))
                    })?;
                criteria.min_rating = Some(rating);
            }
        }
    }
    Ok(criteria)
}
