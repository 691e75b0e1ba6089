//! Login, registration and logout.

use anyhow::{Result, bail};
use clap::Args;
use memorybank_core::session::Session;

use super::Context;
use crate::notify::{Notifier, Toast};

/// Arguments for the login command.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long, required_unless_present = "google_id_token")]
    pub email: Option<String>,

    /// Account password
    #[arg(long, env = "MEMORYBANK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Sign in with a Google ID token instead of email and password
    #[arg(long, conflicts_with = "email")]
    pub google_id_token: Option<String>,
}

/// Arguments for the register command.
#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "MEMORYBANK_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Display name
    #[arg(long)]
    pub name: Option<String>,
}

/// Run the login command.
pub async fn login(args: LoginArgs, ctx: &Context) -> Result<()> {
    let sessions = ctx.sessions()?;
    let client = ctx.client(sessions.clone())?;

    let session = match (args.google_id_token, args.email, args.password) {
        (Some(token), _, _) => client.auth().google(&token).await?,
        (None, Some(email), Some(password)) => client.auth().login(&email, &password).await?,
        (None, Some(_), None) => bail!("--password (or MEMORYBANK_PASSWORD) is required"),
        (None, None, _) => bail!("--email or --google-id-token is required"),
    };

    sessions.save(&session)?;
    report(ctx, &session, "Signed in")
}

/// Run the register command.
pub async fn register(args: RegisterArgs, ctx: &Context) -> Result<()> {
    let sessions = ctx.sessions()?;
    let client = ctx.client(sessions.clone())?;
    let session = client
        .auth()
        .register(&args.email, &args.password, args.name.as_deref())
        .await?;
    sessions.save(&session)?;
    report(ctx, &session, "Account created")
}

/// Run the logout command.
pub async fn logout(ctx: &Context) -> Result<()> {
    let sessions = ctx.sessions()?;
    let was_logged_in = sessions.is_logged_in();
    sessions.clear()?;
    if !ctx.print_json(&serde_json::json!({ "logged_out": was_logged_in }))? {
        if was_logged_in {
            ctx.notifier.notify(Toast::success("Signed out"));
        } else {
            ctx.notifier.notify(Toast::info("Not signed in"));
        }
    }
    Ok(())
}

fn report(ctx: &Context, session: &Session, title: &str) -> Result<()> {
    if !ctx.print_json(&session.user)? {
        ctx.notifier.notify(Toast::success(format!(
            "{} as {}",
            title,
            session.user.display_name()
        )));
    }
    Ok(())
}
