//! services/console/src/shell/mod.rs
//!
//! The line-oriented front end. Each input line becomes one intent against the
//! catalog core; the resulting view is rendered back to the terminal.

pub mod command;
pub mod render;

use bookstore_core::{
    ApiClient, ApiError, ApiResult, AuthSession, BookDraft, CatalogApi, CatalogMutations,
    CatalogQueryCoordinator, FetchOutcome, HttpTransport, PendingDelete, Session, TokenStore,
};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::adapters::ReqwestTransport;
use crate::config::Config;
use crate::error::ConsoleError;
use command::{Command, CommandError, Field, HELP};
use render::{render_book, render_row, render_view};

//=========================================================================================
// Console State
//=========================================================================================

pub struct Console {
    auth: AuthSession,
    api: Arc<dyn CatalogApi>,
    coordinator: Arc<CatalogQueryCoordinator>,
    mutations: CatalogMutations,
    pending_delete: Option<PendingDelete>,
}

impl Console {
    /// Wires the full stack: session, API client, coordinator and mutations.
    pub fn from_config(config: &Config) -> Result<Self, ConsoleError> {
        let transport = Arc::new(ReqwestTransport::new(config.http_timeout)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: &Config, transport: Arc<dyn HttpTransport>) -> Self {
        let session = Arc::new(Session::new(TokenStore::new()));
        let api: Arc<dyn CatalogApi> = Arc::new(ApiClient::for_session(
            config.api_url.clone(),
            transport,
            session.clone(),
        ));
        let coordinator = Arc::new(CatalogQueryCoordinator::new(
            api.clone(),
            config.page_size,
            config.default_sort,
        ));
        coordinator.subscribe(Arc::new(|view: &bookstore_core::CatalogView| {
            debug!(
                mode = ?view.query.mode,
                page = view.query.page,
                loading = view.result.is_loading,
                items = view.result.items.len(),
                "view changed"
            );
        }));
        let mutations =
            CatalogMutations::new(api.clone(), coordinator.clone(), config.numeric_policy);

        Self {
            auth: AuthSession::new(api.clone(), session),
            api,
            coordinator,
            mutations,
            pending_delete: None,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        self.auth.session()
    }

    pub fn coordinator(&self) -> &Arc<CatalogQueryCoordinator> {
        &self.coordinator
    }

    /// Logs in and loads the first page.
    pub async fn login(&mut self, email: &str, password: &str) -> String {
        match self.auth.login(email, password).await {
            Ok(()) => {
                let listing = self.listing(self.coordinator.reset_to_browse().await);
                format!("Logged in as {email}.\n{listing}")
            }
            Err(e) => format!("Login failed: {}", e.display_message()),
        }
    }

    //=====================================================================================
    // Command Execution
    //=====================================================================================

    pub async fn execute(&mut self, command: Command) -> String {
        // Any other command abandons an unconfirmed delete.
        if !matches!(command, Command::Confirm | Command::Cancel) {
            self.pending_delete = None;
        }

        match command {
            Command::Login { email, password } => self.login(&email, &password).await,
            Command::Signup { email, password } => {
                match self.auth.signup(&email, &password).await {
                    Ok(()) => format!("Account created for {email}. Use 'login' to sign in."),
                    Err(e) => format!("Signup failed: {}", e.display_message()),
                }
            }
            Command::Logout => {
                self.auth.logout();
                "Logged out.".to_string()
            }
            Command::List => self.listing(self.coordinator.refresh().await),
            Command::All => match self.api.all_books().await {
                Ok(books) if books.is_empty() => "No books found.".to_string(),
                Ok(books) => books.iter().map(render_row).collect::<Vec<_>>().join("\n"),
                Err(e) => self.failure(&e),
            },
            Command::Page(n) => {
                let outcome = self.coordinator.go_to_page(n.saturating_sub(1)).await;
                self.listing(outcome)
            }
            Command::Next => {
                let (page, result) = (self.coordinator.query().page, self.coordinator.result());
                if !result.can_go_next(page) {
                    return "Already on the last page.".to_string();
                }
                let outcome = self.coordinator.go_to_page(page + 1).await;
                self.listing(outcome)
            }
            Command::Prev => {
                let (page, result) = (self.coordinator.query().page, self.coordinator.result());
                if !result.can_go_previous(page) {
                    return "Already on the first page.".to_string();
                }
                let outcome = self.coordinator.go_to_page(page - 1).await;
                self.listing(outcome)
            }
            Command::Sort(key) => match self.coordinator.set_sort_key(key).await {
                Ok(FetchOutcome::NotDispatched) => {
                    format!("Sort set to {key}; it applies once you 'reset' to browsing.")
                }
                outcome => self.listing(outcome),
            },
            Command::Search(term) => {
                let outcome = self.coordinator.search(&term).await;
                self.listing(outcome)
            }
            Command::Filter(criteria) => {
                let outcome = self.coordinator.apply_filter(criteria).await;
                self.listing(outcome)
            }
            Command::Reset => {
                let outcome = self.coordinator.reset_to_browse().await;
                self.listing(outcome)
            }
            Command::Show(id) => match self.coordinator.book_details(&id).await {
                Ok(book) => render_book(&book),
                Err(e) => self.failure(&e),
            },
            Command::Add(fields) => {
                let draft = apply_fields(BookDraft::default(), fields);
                match self.mutations.create(&draft).await {
                    Ok(book) => format!("Book added successfully (#{}).\n{}", book.id, self.current()),
                    Err(e) => self.failure(&e),
                }
            }
            Command::Edit(id, fields) => {
                let existing = match self.coordinator.book_details(&id).await {
                    Ok(book) => book,
                    Err(e) => return self.failure(&e),
                };
                let draft = apply_fields(BookDraft::from_record(&existing), fields);
                match self.mutations.update(&id, &draft).await {
                    Ok(book) => format!("Book #{} updated.\n{}", book.id, self.current()),
                    Err(e) => self.failure(&e),
                }
            }
            Command::Delete(id) => {
                let prompt = format!("Delete book #{id}? Type 'confirm' or 'cancel'.");
                self.pending_delete = Some(PendingDelete::new(id));
                prompt
            }
            Command::Confirm => match self.pending_delete.take() {
                Some(pending) => {
                    let id = pending.id().clone();
                    match self.mutations.delete(pending.confirm()).await {
                        Ok(()) => format!("Book #{id} deleted successfully.\n{}", self.current()),
                        Err(e) => self.failure(&e),
                    }
                }
                None => "Nothing to confirm.".to_string(),
            },
            Command::Cancel => match self.pending_delete.take() {
                Some(pending) => format!("Kept book #{}.", pending.id()),
                None => "Nothing to cancel.".to_string(),
            },
            Command::Help => HELP.to_string(),
            Command::Quit => "Bye.".to_string(),
        }
    }

    /// Reads commands until `quit` or end of input.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> Result<(), ConsoleError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        output.write_all(b"> ").await?;
        output.flush().await?;

        while let Some(line) = lines.next_line().await? {
            let reply = match command::parse(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => self.execute(command).await,
                Err(CommandError::Empty) => String::new(),
                Err(e) => e.to_string(),
            };
            if !reply.is_empty() {
                output.write_all(reply.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
            output.write_all(b"> ").await?;
            output.flush().await?;
        }
        info!("console closed");
        Ok(())
    }

    //=====================================================================================
    // Rendering Helpers
    //=====================================================================================

    fn current(&self) -> String {
        render_view(&self.coordinator.view())
    }

    fn listing(&self, outcome: ApiResult<FetchOutcome>) -> String {
        match outcome {
            Err(ApiError::Unauthorized) => format!("{}\n{}", self.login_hint(), self.current()),
            Err(ApiError::Validation(reason)) => reason,
            _ => self.current(),
        }
    }

    fn failure(&self, err: &ApiError) -> String {
        match err {
            ApiError::Unauthorized => self.login_hint(),
            other => other.display_message(),
        }
    }

    fn login_hint(&self) -> String {
        format!(
            "{} Use 'login <email> <password>'.",
            ApiError::Unauthorized.display_message()
        )
    }
}

fn apply_fields(mut draft: BookDraft, fields: Vec<(Field, String)>) -> BookDraft {
    for (field, value) in fields {
        field.apply(&mut draft, value);
    }
    draft
}
