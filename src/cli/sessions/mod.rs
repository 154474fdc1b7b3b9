//! Sessions command - operates directly on the configured session store

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::config::AppConfig;
use crate::domain::{DomainError, Session, SystemRole, UserId};
use crate::infrastructure::auth::SessionService;

#[derive(Args)]
pub struct SessionsArgs {
    #[command(subcommand)]
    pub command: SessionsCommand,
}

#[derive(Subcommand)]
pub enum SessionsCommand {
    /// List stored sessions
    List {
        /// Only sessions of this user
        #[arg(long)]
        user: Option<i64>,
    },

    /// Print one session
    Show { token: String },

    /// Start and save a session, printing it with its token
    Start {
        #[arg(long)]
        user: i64,
        /// System role wire name (member, coach, admin)
        #[arg(long, default_value = "member")]
        role: SystemRole,
        /// Address the session is bound to
        #[arg(long, default_value = "127.0.0.1")]
        ip: String,
    },

    /// Destroy a session
    Destroy { token: String },
}

pub async fn run(config: AppConfig, args: SessionsArgs) -> anyhow::Result<()> {
    let state = crate::create_app_state(&config).await?;
    let output = execute(&state.sessions, args.command).await?;
    println!("{}", output);
    Ok(())
}

/// Runs one command and renders its result as JSON
pub async fn execute(
    sessions: &SessionService,
    command: SessionsCommand,
) -> Result<String, DomainError> {
    match command {
        SessionsCommand::List { user } => {
            let listed: Vec<Session> = sessions
                .list_sessions()
                .await?
                .into_iter()
                .filter(|session| user.is_none_or(|user| session.user_id() == UserId::new(user)))
                .collect();
            render(&listed)
        }
        SessionsCommand::Show { token } => match sessions.find_session(&token).await? {
            Some(session) => render(&session),
            None => Err(DomainError::InvalidSession),
        },
        SessionsCommand::Start { user, role, ip } => {
            let session = sessions.start_session(UserId::new(user), role, &ip).await?;
            // Saved so it stays enumerable
            sessions.save_session(&session).await?;
            render(&session)
        }
        SessionsCommand::Destroy { token } => {
            sessions.destroy_session(&token).await?;
            render(&serde_json::json!({ "success": true }))
        }
    }
}

fn render<T: Serialize>(value: &T) -> Result<String, DomainError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| DomainError::corrupt_payload("output", e.to_string()))
}
