//! Account and session commands: `cvtailor login`, `register`, `logout`,
//! and `whoami`.

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Password};

use cvtailor::client::Client;
use cvtailor::config::Config;
use cvtailor::ui;

pub async fn cmd_login(config: &Config, email: Option<String>) -> Result<()> {
    let client = Client::new(config)?;
    let email = prompt_email(email)?;
    let password = Password::new().with_prompt("Password").interact()?;

    let spinner = ui::spinner("Signing in...");
    let result = client.session.login(&email, &password).await;
    spinner.finish_and_clear();

    let user = result.context("Login failed")?;
    ui::success(format!("Signed in as {} <{}>", user.username, user.email));
    Ok(())
}

pub async fn cmd_register(
    config: &Config,
    email: Option<String>,
    username: Option<String>,
) -> Result<()> {
    let client = Client::new(config)?;
    let email = prompt_email(email)?;
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;

    let spinner = ui::spinner("Creating account...");
    let result = client
        .session
        .register(&email, &password, username.as_deref())
        .await;
    spinner.finish_and_clear();

    let user = result.context("Registration failed")?;
    ui::success(format!(
        "Registered and signed in as {} <{}>",
        user.username, user.email
    ));
    Ok(())
}

pub fn cmd_logout(config: &Config) -> Result<()> {
    let client = Client::new(config)?;
    client.session.logout();
    ui::success("Signed out");
    Ok(())
}

pub async fn cmd_whoami(config: &Config) -> Result<()> {
    let client = Client::new(config)?;

    let spinner = ui::spinner("Checking session...");
    let result = client.session.restore().await;
    spinner.finish_and_clear();

    match result.context("Could not verify the session")? {
        Some(user) => {
            if config.json {
                println!("{}", serde_json::to_string_pretty(&user)?);
                return Ok(());
            }
            println!("{} <{}>", style(&user.username).bold(), user.email);
            if user.is_admin {
                ui::note("admin");
            }
            if let Some(created_at) = user.created_at {
                ui::note(format!("member since {}", created_at.format("%Y-%m-%d")));
            }
        }
        None => println!(
            "Not signed in. Run {} first.",
            style("cvtailor login").cyan()
        ),
    }
    Ok(())
}

fn prompt_email(email: Option<String>) -> Result<String> {
    match email {
        Some(email) => Ok(email),
        None => Ok(Input::<String>::new()
            .with_prompt("Email")
            .interact_text()?),
    }
}
