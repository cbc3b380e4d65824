use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use sea_orm::DatabaseConnection;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use uniportal_appointments::{
    AppointmentDesk, BookingRequest, HttpMailHook, LogNotifier, MailHookConfig, Notifier,
};
use uniportal_auth::{AuthManager, Role, Session, SessionFile, SignupRequest};
use uniportal_chat::{
    announcements, mentions, spawn_rotation, AnnouncementDuration, ChatConfig, ChatContext,
    ChatRoom, ChatScope, ImageUpload, PollDraft, QnaBoard,
};
use uniportal_store::{connect, DirectoryFilter, StoreConfig, UserDirectory};

mod render;

/// UniPortal - university chat, announcements and appointments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// SQLite database file
    #[arg(long, env = "UNIPORTAL_DB")]
    db: Option<PathBuf>,

    /// File holding the signed-in session
    #[arg(long, env = "UNIPORTAL_SESSION")]
    session: Option<PathBuf>,

    /// Directory for uploaded images
    #[arg(long, env = "UNIPORTAL_IMAGES")]
    images: Option<PathBuf>,

    /// Endpoint that sends approval emails; logged only when unset
    #[arg(long, env = "UNIPORTAL_MAIL_HOOK")]
    mail_hook: Option<String>,

    /// Extra words for the profanity filter
    #[arg(long = "mask", value_delimiter = ',')]
    extra_profanity: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account; prints the email verification token
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to the password
        #[arg(long)]
        confirm: Option<String>,
        #[arg(long, default_value = "student")]
        role: Role,
        #[arg(long, default_value = "")]
        faculty: String,
        #[arg(long, default_value = "")]
        degree: String,
        #[arg(long, default_value = "")]
        batch: String,
    },
    /// Verify an email address with its token
    Verify { token: String },
    /// Issue a new verification token
    Resend { email: String },
    Login { email: String, password: String },
    Logout,
    Whoami,
    /// Start a password reset; prints the reset token
    ResetRequest { email: String },
    /// Finish a password reset
    Reset { token: String, password: String },
    /// List verified users
    Users {
        #[arg(long)]
        role: Option<Role>,
        #[arg(long)]
        faculty: Option<String>,
        #[arg(long)]
        degree: Option<String>,
        #[arg(long)]
        batch: Option<String>,
    },
    /// Chat in a room: faculty, degree, batch or module:<id>[:announcements]
    Chat {
        scope: String,
        #[command(subcommand)]
        action: ChatAction,
    },
    /// Polls in a room
    Poll {
        scope: String,
        #[command(subcommand)]
        action: PollAction,
    },
    /// Post an announcement (staff)
    Announce {
        scope: String,
        title: String,
        body: String,
        /// 24h, 7d, 30d or forever
        #[arg(long, default_value = "24h")]
        duration: AnnouncementDuration,
    },
    /// Active announcements in a room
    Announcements {
        scope: String,
        #[arg(long)]
        search: Option<String>,
        /// Cycle the banner until interrupted
        #[arg(long)]
        rotate: bool,
        /// Rotation step, the configured default when omitted
        #[arg(long)]
        period: Option<humantime::Duration>,
    },
    /// Module question board
    Qna {
        module: String,
        #[command(subcommand)]
        action: QnaAction,
    },
    /// Lecturer appointments
    Appointment {
        #[command(subcommand)]
        action: AppointmentAction,
    },
}

#[derive(Subcommand)]
enum ChatAction {
    Show,
    Send {
        text: String,
        /// Id of the message being answered
        #[arg(long)]
        reply_to: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Follow the room until interrupted
    Watch {
        /// How often to look for writes from other processes
        #[arg(long, default_value = "2s")]
        interval: humantime::Duration,
    },
    Delete { id: String },
    React { id: String },
    /// Mark everything in the room as seen
    Seen,
    /// Suggest members for an @mention
    Mention { fragment: String },
}

#[derive(Subcommand)]
enum PollAction {
    Create {
        question: String,
        #[arg(long = "option", required = true)]
        options: Vec<String>,
        #[arg(long)]
        multiple: bool,
    },
    Vote { id: String, option: usize },
}

#[derive(Subcommand)]
enum QnaAction {
    List,
    Ask { text: String },
    Reply { question: String, text: String },
    Up { question: String },
    UpReply { reply: String },
    Delete { question: String },
    DeleteReply { reply: String },
}

#[derive(Subcommand)]
enum AppointmentAction {
    Lecturers,
    Book {
        #[arg(long)]
        lecturer: String,
        #[arg(long)]
        module: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// HH:MM
        #[arg(long)]
        time: String,
        #[arg(long)]
        reason: String,
    },
    List,
    /// Decisions not opened yet
    Inbox,
    Approve {
        id: String,
        #[arg(long)]
        reply: Option<String>,
    },
    Reject {
        id: String,
        #[arg(long)]
        reply: Option<String>,
    },
    Viewed { id: String },
}

fn data_dir() -> PathBuf {
    let mut dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.push("uniportal");
    dir
}

struct Portal {
    db: DatabaseConnection,
    sessions: SessionFile,
    chat: ChatContext,
    chat_config: ChatConfig,
    mail_hook: Option<String>,
}

impl Portal {
    async fn open(args: &Args) -> Result<Self> {
        let base = data_dir();
        let db_path = args.db.clone().unwrap_or_else(|| base.join("uniportal.db"));
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let db = connect(&StoreConfig {
            db_path: db_path.clone(),
            ..Default::default()
        })
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

        let chat_config = ChatConfig {
            extra_profanity: args.extra_profanity.clone(),
            image_dir: args.images.clone().unwrap_or_else(|| base.join("images")),
            ..Default::default()
        };
        let chat = ChatContext::new(db.clone(), &chat_config)?;
        let sessions = SessionFile::new(
            args.session
                .clone()
                .unwrap_or_else(|| base.join("session.json")),
        );

        debug!("Using database {}", db_path.display());
        Ok(Self {
            db,
            sessions,
            chat,
            chat_config,
            mail_hook: args.mail_hook.clone(),
        })
    }

    fn auth(&self) -> AuthManager {
        AuthManager::new(self.db.clone())
    }

    fn session(&self) -> Result<Session> {
        match self.sessions.load()? {
            Some(session) => Ok(session),
            None => bail!("Not signed in, run `uniportal login <email> <password>` first"),
        }
    }

    fn room(&self, scope: &str) -> Result<ChatRoom> {
        let session = self.session()?;
        let scope = ChatScope::parse(scope, &session.profile)?;
        Ok(self.chat.room(session, scope))
    }

    fn desk(&self) -> Result<AppointmentDesk> {
        let notifier: Arc<dyn Notifier> = match &self.mail_hook {
            Some(endpoint) => Arc::new(HttpMailHook::new(&MailHookConfig {
                endpoint: endpoint.clone(),
                ..Default::default()
            })?),
            None => Arc::new(LogNotifier),
        };
        Ok(AppointmentDesk::new(self.db.clone(), notifier))
    }
}

async fn run_chat(portal: &Portal, scope: &str, action: ChatAction) -> Result<()> {
    let room = portal.room(scope)?;
    let uid = room.session().uid().to_string();

    match action {
        ChatAction::Show => {
            render::snapshot(&room.snapshot().await?, &uid);
        }
        ChatAction::Send {
            text,
            reply_to,
            image,
        } => {
            let quoted = match reply_to {
                Some(id) => Some(
                    room.snapshot()
                        .await?
                        .message(&id)
                        .cloned()
                        .with_context(|| format!("No message {} in this room", id))?,
                ),
                None => None,
            };
            let image = match image {
                Some(path) => Some(
                    ImageUpload::from_path(&path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                None => None,
            };

            match room.send_text(&text, quoted.as_ref(), image).await {
                Ok(message) => render::message(&message, &uid),
                Err(e) => {
                    if let Some(action) = room.actions().last() {
                        if let Some(draft) = room.take_failed_draft(action.id) {
                            eprintln!("✗ Not sent, your draft was: {}", draft);
                        }
                    }
                    return Err(e.into());
                }
            }
        }
        ChatAction::Watch { interval } => {
            let mut feed = Box::pin(room.subscribe().await?.into_stream());
            let mut ticker = tokio::time::interval(interval.into());
            let mut printed = 0usize;
            println!("👀 Watching {} (Ctrl+C to stop)", room.scope());

            loop {
                tokio::select! {
                    snapshot = feed.next() => {
                        let Some(snapshot) = snapshot else { break };
                        let snapshot = snapshot?;
                        if snapshot.messages.len() < printed {
                            printed = 0;
                        }
                        for message in snapshot.messages.iter().skip(printed) {
                            render::message(message, &uid);
                        }
                        printed = snapshot.messages.len();
                        render::footer(&snapshot);
                    }
                    _ = ticker.tick() => {
                        room.refresh().await?;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Stopped watching");
                        break;
                    }
                }
            }
        }
        ChatAction::Delete { id } => {
            room.delete(&id).await?;
            println!("🗑  Deleted {}", id);
        }
        ChatAction::React { id } => {
            let reacted = room.toggle_reaction(&id).await?;
            let verb = if reacted {
                "❤ Reacted to"
            } else {
                "♡ Removed reaction from"
            };
            println!("{} {}", verb, id);
        }
        ChatAction::Seen => match room.mark_seen().await? {
            Some(id) => println!("✓ Seen up to {}", id),
            None => println!("Room is empty"),
        },
        ChatAction::Mention { fragment } => {
            let members = room.members().await?;
            let query = mentions::mention_query(&fragment, fragment.len())
                .unwrap_or_else(|| fragment.trim_start_matches('@').to_lowercase());
            for user in mentions::suggest(&query, &members, &uid) {
                let (completed, _) = mentions::complete(&fragment, fragment.len(), &user.name);
                println!("{}  →  {}", user.name, completed.trim_end());
            }
        }
    }
    Ok(())
}

async fn run_poll(portal: &Portal, scope: &str, action: PollAction) -> Result<()> {
    let room = portal.room(scope)?;
    let uid = room.session().uid().to_string();

    match action {
        PollAction::Create {
            question,
            options,
            multiple,
        } => {
            let message = room
                .send_poll(PollDraft {
                    question,
                    options,
                    allow_multiple: multiple,
                })
                .await?;
            render::message(&message, &uid);
        }
        PollAction::Vote { id, option } => {
            let choices = room.vote(&id, option).await?;
            if choices.is_empty() {
                println!("Vote withdrawn");
            } else {
                println!("✓ Your choices: {:?}", choices);
            }
        }
    }
    Ok(())
}

async fn run_announcements(
    portal: &Portal,
    scope: &str,
    search: Option<String>,
    rotate: bool,
    period: Option<humantime::Duration>,
) -> Result<()> {
    let room = portal.room(scope)?;
    let uid = room.session().uid().to_string();
    let snapshot = room.snapshot().await?;

    let shown = match &search {
        Some(query) => announcements::search(&snapshot.announcements, query),
        None => snapshot.announcements.iter().collect(),
    };
    if shown.is_empty() {
        println!("No active announcements");
        return Ok(());
    }
    for message in &shown {
        render::message(message, &uid);
    }

    if rotate {
        let period = period
            .map(Into::into)
            .unwrap_or(portal.chat_config.rotation_period);
        let handle = spawn_rotation(shown.len(), period);
        let mut index = handle.subscribe();
        loop {
            let current = *index.borrow_and_update();
            if let Some(announcement) = current
                .and_then(|i| shown.get(i))
                .and_then(|message| message.announcement())
            {
                println!("📢 {} - {}", announcement.title, announcement.body);
            }
            tokio::select! {
                changed = index.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        handle.stop();
    }
    Ok(())
}

async fn run_qna(portal: &Portal, module: &str, action: QnaAction) -> Result<()> {
    let board = QnaBoard::new(&portal.chat, portal.session()?, module);

    match action {
        QnaAction::List => {
            for question in board.questions().await? {
                render::question(&question);
                for reply in board.replies(&question.id).await? {
                    render::reply(&reply);
                }
            }
        }
        QnaAction::Ask { text } => render::question(&board.ask(&text).await?),
        QnaAction::Reply { question, text } => {
            render::reply(&board.reply(&question, &text).await?)
        }
        QnaAction::Up { question } => {
            if !board.thumbs_up_question(&question).await? {
                println!("You already gave this a thumbs up");
            }
        }
        QnaAction::UpReply { reply } => {
            if !board.thumbs_up_reply(&reply).await? {
                println!("You already gave this a thumbs up");
            }
        }
        QnaAction::Delete { question } => board.delete_question(&question).await?,
        QnaAction::DeleteReply { reply } => board.delete_reply(&reply).await?,
    }
    Ok(())
}

async fn run_appointment(portal: &Portal, action: AppointmentAction) -> Result<()> {
    let desk = portal.desk()?;

    match action {
        AppointmentAction::Lecturers => {
            for lecturer in desk.lecturers().await? {
                println!("{} <{}>  ({})", lecturer.name, lecturer.email, lecturer.uid);
            }
        }
        AppointmentAction::Book {
            lecturer,
            module,
            date,
            time,
            reason,
        } => {
            let session = portal.session()?;
            let booked = desk
                .book(
                    &session,
                    BookingRequest {
                        lecturer_id: lecturer,
                        module,
                        date,
                        time,
                        reason,
                    },
                )
                .await?;
            render::appointment(&booked);
        }
        AppointmentAction::List => {
            let session = portal.session()?;
            let list = if session.is_staff() {
                desk.for_lecturer(&session).await?
            } else {
                desk.for_student(&session).await?
            };
            for appointment in &list {
                render::appointment(appointment);
            }
        }
        AppointmentAction::Inbox => {
            for appointment in desk.unviewed_responses(&portal.session()?).await? {
                render::appointment(&appointment);
            }
        }
        AppointmentAction::Approve { id, reply } => {
            let approval = desk.approve(&portal.session()?, &id, reply).await?;
            render::appointment(&approval.appointment);
            if let Some(e) = approval.notify_error {
                eprintln!("⚠ Approved, but the email was not sent: {}", e);
            }
        }
        AppointmentAction::Reject { id, reply } => {
            render::appointment(&desk.reject(&portal.session()?, &id, reply).await?);
        }
        AppointmentAction::Viewed { id } => {
            render::appointment(&desk.mark_viewed(&portal.session()?, &id).await?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let args = Args::parse();
    let portal = Portal::open(&args).await?;

    match args.command {
        Command::Signup {
            name,
            email,
            password,
            confirm,
            role,
            faculty,
            degree,
            batch,
        } => {
            let outcome = portal
                .auth()
                .sign_up(SignupRequest {
                    name,
                    email,
                    confirm_password: confirm.unwrap_or_else(|| password.clone()),
                    password,
                    role,
                    faculty,
                    degree_program: degree,
                    batch_number: batch,
                })
                .await?;
            render::profile(&outcome.profile);
            println!("📧 Verification token: {}", outcome.verification_token);
        }
        Command::Verify { token } => {
            let profile = portal.auth().verify_email(&token).await?;
            println!("✓ {} verified, you can log in now", profile.email);
        }
        Command::Resend { email } => {
            let token = portal.auth().resend_verification(&email).await?;
            println!("📧 Verification token: {}", token);
        }
        Command::Login { email, password } => {
            let session = portal.auth().login(&email, &password).await?;
            portal.sessions.save(&session)?;
            println!("✓ Signed in as {}", session.name());
        }
        Command::Logout => {
            if portal.sessions.clear()? {
                println!("👋 Signed out");
            } else {
                println!("Nobody was signed in");
            }
        }
        Command::Whoami => render::profile(&portal.session()?.profile),
        Command::ResetRequest { email } => {
            let token = portal.auth().request_password_reset(&email).await?;
            println!("📧 Reset token: {}", token);
        }
        Command::Reset { token, password } => {
            portal.auth().reset_password(&token, &password).await?;
            println!("✓ Password updated");
        }
        Command::Users {
            role,
            faculty,
            degree,
            batch,
        } => {
            let users = UserDirectory::new(portal.db.clone())
                .members(&DirectoryFilter {
                    role,
                    faculty,
                    degree_program: degree,
                    batch_number: batch,
                })
                .await?;
            for user in &users {
                println!("{} [{}] {} <{}>", user.initials(), user.role, user.name, user.email);
            }
        }
        Command::Chat { scope, action } => run_chat(&portal, &scope, action).await?,
        Command::Poll { scope, action } => run_poll(&portal, &scope, action).await?,
        Command::Announce {
            scope,
            title,
            body,
            duration,
        } => {
            let room = portal.room(&scope)?;
            let message = room.send_announcement(&title, &body, duration).await?;
            render::message(&message, room.session().uid());
        }
        Command::Announcements {
            scope,
            search,
            rotate,
            period,
        } => run_announcements(&portal, &scope, search, rotate, period).await?,
        Command::Qna { module, action } => run_qna(&portal, &module, action).await?,
        Command::Appointment { action } => {
            if let Err(e) = run_appointment(&portal, action).await {
                warn!("Appointment command failed: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}
