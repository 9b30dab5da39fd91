use std::io::{self, Write};

use anyhow::{anyhow, Context};

use crate::config::AppConfig;
use crate::db::{self, queries};
use crate::services::calendar::credentials::{
    authorization_url, exchange_code_for_token, OOB_REDIRECT_URI,
};

fn prompt(message: &str) -> anyhow::Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}

/// Interactive consent: print the URL, read back the code, store the
/// refresh token for `account`.
pub async fn run(config: &AppConfig, account: Option<String>) -> anyhow::Result<()> {
    anyhow::ensure!(
        !config.google_client_id.is_empty(),
        "GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET are required to authorize"
    );

    let account = account.unwrap_or_else(|| config.google_account.clone());
    let redirect_uri =
        std::env::var("GOOGLE_REDIRECT_URI").unwrap_or_else(|_| OOB_REDIRECT_URI.to_string());

    println!(
        "\nOpen the following URL in your browser and authorize calendar access:\n\n{}\n",
        authorization_url(&config.google_client_id, &redirect_uri)
    );
    let code = prompt("Paste the authorization code shown by Google here: ")?;
    anyhow::ensure!(!code.is_empty(), "no authorization code entered");

    let token = exchange_code_for_token(
        &config.google_token_url,
        &config.google_client_id,
        &config.google_client_secret,
        &code,
        &redirect_uri,
    )
    .await?;

    let refresh_token = token
        .refresh_token
        .ok_or_else(|| anyhow!("no refresh token in response; revoke access and try again"))?;

    let conn = db::init_db(&config.database_url)?;
    queries::save_refresh_token(&conn, &account, &refresh_token)?;

    tracing::info!(account = %account, "stored refresh token");
    println!("Refresh token for {account} saved.");
    Ok(())
}
