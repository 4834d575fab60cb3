//! Auth command handlers.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use connectify_core::Services;
use connectify_core::backend::SignUpOutcome;
use connectify_core::models::User;
use connectify_core::oauth::{OAuthFlow, mask_token};

/// Password source for non-interactive sign-in.
const PASSWORD_ENV: &str = "CONNECTIFY_PASSWORD";
/// Set to skip opening the browser during `login --oauth`.
const NO_BROWSER_ENV: &str = "CONNECTIFY_NO_BROWSER";

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV)
        && !password.is_empty()
    {
        return Ok(password);
    }

    if io::stdin().is_terminal() {
        print!("Password: ");
        io::stdout().flush()?;
    }
    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("read password from stdin")?;
    let password = input.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty (set {PASSWORD_ENV} or pipe it on stdin)");
    }
    Ok(password)
}

fn print_signed_in(services: &Services, user: &User, access_token: &str) {
    println!(
        "✓ Signed in as {} (token: {})",
        user.display_name(),
        mask_token(access_token)
    );
    println!(
        "  Session saved to: {}",
        services.session.store().path().display()
    );
}

pub async fn login_password(services: &Services, email: &str) -> Result<()> {
    let password = read_password()?;
    let session = services
        .session
        .sign_in_with_password(email, &password)
        .await?;
    print_signed_in(services, &session.user, &session.access_token);
    Ok(())
}

pub async fn login_oauth(services: &Services) -> Result<()> {
    let auth = &services.config.auth;
    let flow = OAuthFlow::new(&services.client, &auth.oauth_provider, auth.callback_port);

    println!("To sign in with {}:", auth.oauth_provider);
    println!();
    println!("  1. A browser window will open (or visit the URL below)");
    println!("  2. Sign in and authorize Connectify");
    println!("  3. If redirected to localhost, return here to continue");
    println!("  4. Otherwise, paste the code or the full redirect URL");
    println!();
    println!("Authorization URL:");
    println!("  {}", flow.url);
    println!();

    // Best effort; tests and headless machines set the opt-out.
    if std::env::var(NO_BROWSER_ENV).is_err()
        && let Err(err) = open::that(&flow.url)
    {
        tracing::warn!(error = %err, "could not open browser");
    }

    // Prefer the local callback in interactive sessions, fall back to paste.
    let local_code = if io::stdin().is_terminal() {
        let waiting = flow.clone();
        tokio::task::spawn_blocking(move || waiting.wait_for_code())
            .await
            .context("callback listener failed")?
    } else {
        None
    };
    let code = match local_code {
        Some(code) => code,
        None => {
            print!("Paste authorization code (or full redirect URL): ");
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().lock().read_line(&mut input)?;
            flow.code_from_input(&input)
                .context("Authorization code missing or state mismatch")?
        }
    };

    println!("Exchanging code for a session...");
    let session = services
        .session
        .exchange_code(&code, &flow.pkce.verifier)
        .await?;
    println!();
    print_signed_in(services, &session.user, &session.access_token);
    Ok(())
}

pub async fn signup(services: &Services, email: &str, name: Option<&str>) -> Result<()> {
    let password = read_password()?;
    match services.session.sign_up(email, &password, name).await? {
        SignUpOutcome::SignedIn(session) => {
            print_signed_in(services, &session.user, &session.access_token);
        }
        SignUpOutcome::ConfirmationRequired(user) => {
            let email = user.email.as_deref().unwrap_or(email);
            println!("✓ Account created for {email}");
            println!("  Confirm the address from your inbox, then run `connectify login`.");
        }
    }
    Ok(())
}

pub async fn logout(services: &Services) -> Result<()> {
    if services.session.sign_out().await? {
        println!("✓ Signed out");
        println!(
            "  Session removed from: {}",
            services.session.store().path().display()
        );
    } else {
        println!("Not signed in (no session found).");
    }
    Ok(())
}

pub async fn whoami(services: &Services) -> Result<()> {
    let user = services.session.get_user().await?;
    println!("{}", user.display_name());
    if let Some(email) = &user.email {
        println!("  email: {email}");
    }
    println!("  id:    {}", user.id);
    Ok(())
}
