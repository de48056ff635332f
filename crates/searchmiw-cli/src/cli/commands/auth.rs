//! Auth command handlers.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use searchmiw_core::api::{AuthClient, Dispatcher};
use searchmiw_core::session::{AuthResult, mask_token};

pub async fn login(dispatcher: &Dispatcher, email: &str, password: Option<String>) -> Result<()> {
    let password = read_password(password)?;
    let result = AuthClient::new(dispatcher).login(email, &password).await?;

    print_logged_in(dispatcher, &result);
    Ok(())
}

pub async fn register(
    dispatcher: &Dispatcher,
    email: &str,
    name: &str,
    password: Option<String>,
) -> Result<()> {
    let password = read_password(password)?;
    let result = AuthClient::new(dispatcher)
        .register(email, &password, name)
        .await?;

    println!("✓ Account created");
    print_logged_in(dispatcher, &result);
    Ok(())
}

pub fn logout(dispatcher: &Dispatcher) -> Result<()> {
    let had_session = AuthClient::new(dispatcher).logout()?;

    if had_session {
        println!("✓ Logged out");
        println!(
            "  Session removed from: {}",
            dispatcher.session().path().display()
        );
    } else {
        println!("Not logged in (no session found).");
    }
    Ok(())
}

pub fn status(dispatcher: &Dispatcher) {
    let session = dispatcher.session().get();
    let Some(token) = session.token.as_deref().filter(|t| !t.is_empty()) else {
        println!("Not logged in.");
        return;
    };

    let who = session
        .display_name
        .as_deref()
        .or(session.email.as_deref())
        .unwrap_or("unknown user");
    println!("Logged in as {who} (token: {})", mask_token(token));
    if let Some(email) = session.email.as_deref() {
        println!("  Email:   {email}");
    }
    if let Some(user_id) = session.user_id.as_deref() {
        println!("  User ID: {user_id}");
    }
    println!("  Gateway: {}", dispatcher.config().base_url);
}

fn print_logged_in(dispatcher: &Dispatcher, result: &AuthResult) {
    let who = result
        .display_name
        .as_deref()
        .or(result.email.as_deref())
        .unwrap_or("unknown user");
    println!("✓ Logged in as {who} (token: {})", mask_token(&result.token));
    println!(
        "  Session saved to: {}",
        dispatcher.session().path().display()
    );
}

/// Uses the given password, or reads one line from stdin.
fn read_password(provided: Option<String>) -> Result<String> {
    if let Some(password) = provided {
        return Ok(password);
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("Password: ");
        io::stderr().flush()?;
    }
    let mut input = String::new();
    stdin
        .lock()
        .read_line(&mut input)
        .context("read password from stdin")?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
