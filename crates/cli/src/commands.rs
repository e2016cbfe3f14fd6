//! CLI commands

use anyhow::{Context as _, Result, bail};
use chrono::Utc;
use clap::{Args, Subcommand};
use serde::Serialize;
use shelf_core::{
    AccountUpdate, BorrowRecord, MediaDraft, MediaFilter, MediaItem, MediaType, Role, SortOrder,
    User, UserQuery,
};
use shelf_http::{FileStorage, ShelfClientBuilder, TokenStore};
use shelf_session::auth::HOME_ROUTE;
use shelf_session::{FavoritesService, Guard, GuardDecision, Reconciled, SessionContext, SessionError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config;
use crate::events::CliEvents;

/// Options shared by every command
pub struct Context {
    pub data_dir: PathBuf,
    pub config: Option<PathBuf>,
    pub api_url: Option<String>,
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session in the data directory
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "SHELF_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "SHELF_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Browse the catalog
    Media {
        #[command(subcommand)]
        command: MediaCommands,
    },

    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        command: FavoriteCommands,
    },

    /// Borrow and return media
    Borrow {
        #[command(subcommand)]
        command: BorrowCommands,
    },

    /// Administrator operations
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Subcommand)]
pub enum MediaCommands {
    /// List catalog entries
    List(ListArgs),

    /// Show one catalog entry
    Show { id: String },

    /// List known genres
    Genres,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only this kind of media (book, film, music)
    #[arg(long = "type")]
    media_type: Option<MediaType>,

    #[arg(long)]
    genre: Option<String>,

    /// Free-text search over title and creator
    #[arg(long)]
    search: Option<String>,

    /// Field to sort by (e.g. title, year)
    #[arg(long)]
    sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    desc: bool,

    #[arg(long, default_value = "1")]
    page: u32,

    #[arg(long, default_value_t = shelf_core::types::DEFAULT_PAGE_SIZE)]
    limit: u32,
}

impl ListArgs {
    fn into_filter(self) -> MediaFilter {
        let mut filter = MediaFilter::default().page(self.page).limit(self.limit);
        if let Some(media_type) = self.media_type {
            filter = filter.media_type(media_type);
        }
        if let Some(genre) = self.genre {
            filter = filter.genre(genre);
        }
        if let Some(search) = self.search {
            filter = filter.search(search);
        }
        if let Some(sort) = self.sort {
            let order = if self.desc { SortOrder::Desc } else { SortOrder::Asc };
            filter = filter.sort(sort, order);
        }
        filter
    }
}

#[derive(Subcommand)]
pub enum FavoriteCommands {
    /// List favorite catalog entries
    List,

    /// Add or remove a favorite
    Toggle { media_id: String },
}

#[derive(Subcommand)]
pub enum BorrowCommands {
    /// Show your borrow history
    Mine,

    /// Borrow a catalog entry
    Take { media_id: String },

    /// Return a borrowed entry
    Return { borrow_id: String },
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// List accounts
    Users {
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        role: Option<Role>,

        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Change an account's role
    SetRole { user_id: String, role: Role },

    /// Re-enable an account
    Activate { user_id: String },

    /// Disable an account without deleting it
    Deactivate { user_id: String },

    /// Delete an account
    DeleteUser { user_id: String },

    /// Add a catalog entry
    AddMedia {
        #[arg(long)]
        title: String,

        #[arg(long = "type")]
        media_type: MediaType,

        #[arg(long)]
        creator: String,

        #[arg(long)]
        genre: Option<String>,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long, default_value = "1")]
        copies: u32,
    },

    /// Delete a catalog entry
    DeleteMedia { media_id: String },

    /// List every loan
    Borrows {
        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value_t = shelf_core::types::DEFAULT_PAGE_SIZE)]
        limit: u32,
    },
}

impl Context {
    /// Session backed by the data directory, not yet restored
    fn session(&self) -> Result<SessionContext> {
        let settings = config::load_settings(
            self.config.as_deref(),
            &self.data_dir,
            self.api_url.as_deref(),
        )?;
        let storage = FileStorage::open(&self.data_dir).with_context(|| {
            format!("failed to open session storage in {}", self.data_dir.display())
        })?;
        let builder = ShelfClientBuilder::from_settings(&settings)
            .tokens(TokenStore::new(Arc::new(storage)));
        Ok(SessionContext::new(builder, Arc::new(CliEvents))?)
    }

    /// Restored session that passes `guard`
    async fn signed_in(&self, guard: Guard) -> Result<SessionContext> {
        let session = self.session()?;
        session.initialize().await;
        match session.guard(guard) {
            GuardDecision::Allow => Ok(session),
            GuardDecision::Redirect(HOME_ROUTE) => {
                bail!("this command requires an administrator account")
            }
            GuardDecision::Redirect(_) | GuardDecision::Pending => {
                bail!("not signed in; run `shelf login` first")
            }
        }
    }

    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human(value);
        }
        Ok(())
    }
}

impl Commands {
    pub async fn execute(self, ctx: Context) -> Result<()> {
        match self {
            Self::Login { email, password } => {
                let session = ctx.session()?;
                let user = session
                    .login(&email, &password)
                    .await
                    .map_err(describe_session_error)?;
                ctx.emit(&user, print_user)
            }
            Self::Register {
                name,
                email,
                password,
            } => {
                let session = ctx.session()?;
                session.initialize().await;
                if session.guard(Guard::GuestOnly) != GuardDecision::Allow {
                    bail!("already signed in; run `shelf logout` first");
                }
                let user = session
                    .register(&name, &email, &password)
                    .await
                    .map_err(describe_session_error)?;
                ctx.emit(&user, print_user)
            }
            Self::Logout => {
                let session = ctx.session()?;
                session.logout().await;
                info!("Session cleared");
                Ok(())
            }
            Self::Whoami => {
                let session = ctx.signed_in(Guard::Protected).await?;
                let user = session.user().context("session ended")?;
                ctx.emit(&user, print_user)
            }
            Self::Media { command } => command.execute(&ctx).await,
            Self::Favorites { command } => command.execute(&ctx).await,
            Self::Borrow { command } => command.execute(&ctx).await,
            Self::Admin { command } => command.execute(&ctx).await,
            Self::Config => {
                let settings = config::load_settings(
                    ctx.config.as_deref(),
                    &ctx.data_dir,
                    ctx.api_url.as_deref(),
                )?;
                ctx.emit(&settings, |s| {
                    println!("api_url:      {}", s.api_url);
                    println!("timeout_secs: {}", s.timeout_secs);
                    println!("data_dir:     {}", ctx.data_dir.display());
                })
            }
        }
    }
}

impl MediaCommands {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        // Browsing works signed out; a stored session is used when present
        let session = ctx.session()?;
        let client = session.client();
        match self {
            Self::List(args) => {
                let page = client.list_media(&args.into_filter()).await?;
                ctx.emit(&page, |page| {
                    for item in &page.data {
                        println!("{}", media_line(item));
                    }
                    let info = page.pagination;
                    println!("-- page {} of {} ({} total)", info.page, info.pages, info.total);
                })
            }
            Self::Show { id } => {
                let item = client.get_media(&id).await?;
                ctx.emit(&item, |item| {
                    println!("{}", media_line(item));
                    if let Some(description) = &item.description {
                        println!();
                        println!("{description}");
                    }
                })
            }
            Self::Genres => {
                let genres = client.genres().await?;
                ctx.emit(&genres, |genres| {
                    for genre in genres {
                        println!("{genre}");
                    }
                })
            }
        }
    }
}

impl FavoriteCommands {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let session = ctx.signed_in(Guard::Protected).await?;
        let favorites = FavoritesService::new(session);
        match self {
            Self::List => {
                let items = favorites.list().await?;
                ctx.emit(&items, |items| {
                    for item in items {
                        println!("{}", media_line(item));
                    }
                })
            }
            Self::Toggle { media_id } => match favorites.toggle(&media_id).await {
                Reconciled::Applied(now_favorite) => ctx.emit(&now_favorite, |&now| {
                    if now {
                        println!("Added {media_id} to favorites");
                    } else {
                        println!("Removed {media_id} from favorites");
                    }
                }),
                Reconciled::RolledBack(err) => Err(err.into()),
            },
        }
    }
}

impl BorrowCommands {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let session = ctx.signed_in(Guard::Protected).await?;
        let client = session.client();
        match self {
            Self::Mine => {
                let records = client.my_borrows().await?;
                ctx.emit(&records, |records| {
                    for record in records {
                        println!("{}", borrow_line(record));
                    }
                })
            }
            Self::Take { media_id } => {
                let record = client.borrow_media(&media_id).await?;
                ctx.emit(&record, |r| {
                    println!("Borrowed {} (due {})", r.media_id, r.due_date.format("%Y-%m-%d"));
                })
            }
            Self::Return { borrow_id } => {
                let record = client.return_media(&borrow_id).await?;
                ctx.emit(&record, |r| println!("Returned {}", r.media_id))
            }
        }
    }
}

impl AdminCommands {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let session = ctx.signed_in(Guard::Admin).await?;
        let client = session.client();
        match self {
            Self::Users { search, role, page } => {
                let query = UserQuery {
                    search,
                    role,
                    page: page.max(1),
                    ..UserQuery::default()
                };
                let users = client.list_users(&query).await?;
                ctx.emit(&users, |users| {
                    for user in &users.data {
                        println!("{}", user_line(user));
                    }
                    let info = users.pagination;
                    println!("-- page {} of {} ({} total)", info.page, info.pages, info.total);
                })
            }
            Self::SetRole { user_id, role } => {
                let update = AccountUpdate {
                    role: Some(role),
                    ..AccountUpdate::default()
                };
                let user = client.update_account(&user_id, &update).await?;
                ctx.emit(&user, |u| println!("{}", user_line(u)))
            }
            Self::Activate { user_id } | Self::Deactivate { user_id }
                if session.user().is_some_and(|me| me.id == user_id) =>
            {
                bail!("refusing to change the active flag of your own account")
            }
            Self::Activate { user_id } => set_active(ctx, &session, &user_id, true).await,
            Self::Deactivate { user_id } => set_active(ctx, &session, &user_id, false).await,
            Self::DeleteUser { user_id } => {
                client.delete_user(&user_id).await?;
                println!("Deleted user {user_id}");
                Ok(())
            }
            Self::AddMedia {
                title,
                media_type,
                creator,
                genre,
                year,
                copies,
            } => {
                let draft = MediaDraft {
                    title,
                    media_type,
                    creator,
                    genre,
                    year,
                    description: None,
                    cover_url: None,
                    total_copies: copies.max(1),
                };
                let item = client.create_media(&draft).await?;
                ctx.emit(&item, |item| println!("{}", media_line(item)))
            }
            Self::DeleteMedia { media_id } => {
                client.delete_media(&media_id).await?;
                println!("Deleted {media_id}");
                Ok(())
            }
            Self::Borrows { page, limit } => {
                let records = client.all_borrows(page, limit).await?;
                ctx.emit(&records, |records| {
                    for record in &records.data {
                        println!("{} user={}", borrow_line(record), record.user_id);
                    }
                })
            }
        }
    }
}

async fn set_active(
    ctx: &Context,
    session: &SessionContext,
    user_id: &str,
    active: bool,
) -> Result<()> {
    let update = AccountUpdate {
        active: Some(active),
        ..AccountUpdate::default()
    };
    let user = session.client().update_account(user_id, &update).await?;
    ctx.emit(&user, |u| println!("{}", user_line(u)))
}

fn describe_session_error(err: SessionError) -> anyhow::Error {
    let form = err.form_error();
    match form.field() {
        Some(field) => anyhow::anyhow!("{field}: {}", form.message()),
        None => anyhow::Error::new(err),
    }
}

fn print_user(user: &User) {
    println!("{} <{}>", user.name, user.email);
    println!("role:      {}", user.role);
    println!("favorites: {}", user.favorites.len());
}

fn media_line(item: &MediaItem) -> String {
    let year = item.year.map(|y| format!(" ({y})")).unwrap_or_default();
    format!(
        "{:<26} [{}] {}{} by {} - {}/{} available",
        item.id, item.media_type, item.title, year, item.creator, item.available_copies, item.total_copies
    )
}

fn borrow_line(record: &BorrowRecord) -> String {
    let title = record
        .media
        .as_ref()
        .map_or(record.media_id.as_str(), |m| m.title.as_str());
    let state = if record.returned_at.is_some() {
        "returned".to_string()
    } else if record.is_overdue_at(Utc::now()) {
        format!("OVERDUE since {}", record.due_date.format("%Y-%m-%d"))
    } else {
        format!("due {}", record.due_date.format("%Y-%m-%d"))
    };
    format!("{:<26} {title} - {state}", record.id)
}

fn user_line(user: &User) -> String {
    let status = if user.active { "" } else { " (inactive)" };
    format!(
        "{:<26} {} <{}> {}{status}",
        user.id, user.name, user.email, user.role
    )
}
