//! CLI commands

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use serde_json::Value;
use sessionguard_http::{BootstrapOutcome, LogoutScope, Method, RequestDescriptor, SessionClient};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(short, long)]
        username: String,

        /// Password; read from stdin when omitted
        #[arg(long, env = "SESSIONGUARD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Validate the stored session and show who is signed in
    Status,

    /// Send an authenticated request and print the response body
    Request {
        /// HTTP method, e.g. GET or POST
        method: String,

        /// Path relative to the API base URL
        path: String,

        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,

        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "query", value_parser = parse_key_val)]
        query: Vec<(String, String)>,
    },

    /// Sign out and revoke the session on the server
    Logout {
        /// Revoke every session of this user, not just this one
        #[arg(long)]
        all: bool,
    },
}

impl Commands {
    pub async fn execute(self, client: &SessionClient) -> Result<()> {
        match self {
            Commands::Login { username, password } => {
                let password = match password {
                    Some(password) => password,
                    None => read_password().await?,
                };
                let user = client.login(username, password).await?;
                println!("Signed in as {}", display_name(&user));
            }
            Commands::Status => match client.bootstrap().await? {
                BootstrapOutcome::Unauthenticated => {
                    println!("Not signed in");
                }
                BootstrapOutcome::Restored(user) => {
                    println!("Signed in as {}", display_name(&user));
                }
                BootstrapOutcome::Ended(reason) => {
                    bail!("stored session is no longer valid: {reason}");
                }
            },
            Commands::Request {
                method,
                path,
                data,
                query,
            } => {
                let method = Method::from_bytes(method.to_uppercase().as_bytes())
                    .with_context(|| format!("invalid HTTP method `{method}`"))?;

                let mut request = RequestDescriptor::new(method, path);
                for (key, value) in query {
                    request = request.query(key, value);
                }
                if let Some(data) = data {
                    let body: Value =
                        serde_json::from_str(&data).context("--data is not valid JSON")?;
                    request = request.json_value(body);
                }

                let response = client.send(request).await?;
                info!(status = response.status().as_u16(), "Request completed");
                let body = response.text().await?;
                println!("{}", pretty(&body));
            }
            Commands::Logout { all } => {
                let scope = if all {
                    LogoutScope::All
                } else {
                    LogoutScope::Current
                };
                if client.logout(scope).await? {
                    println!("Signed out");
                } else {
                    println!("Not signed in");
                }
            }
        }

        Ok(())
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{s}`"))?;
    Ok((key.to_string(), value.to_string()))
}

fn display_name(user: &sessionguard_http::User) -> String {
    match (&user.name, &user.email) {
        (Some(name), _) => format!("{name} ({})", user.id),
        (None, Some(email)) => format!("{email} ({})", user.id),
        (None, None) => user.id.to_string(),
    }
}

/// Pretty-print JSON bodies, pass anything else through
fn pretty(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| body.to_string())
}

async fn read_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read password from stdin")?;

    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("password must not be empty");
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sessionguard_http::User;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("status=open").unwrap(),
            ("status".to_string(), "open".to_string())
        );
        assert_eq!(
            parse_key_val("filter=a=b").unwrap(),
            ("filter".to_string(), "a=b".to_string())
        );
        assert!(parse_key_val("status").is_err());
    }

    #[test]
    fn test_pretty_passes_plain_text_through() {
        assert_eq!(pretty("ok"), "ok");
        assert_eq!(pretty(r#"{"a":1}"#), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(&User::new("7")), "7");
        assert_eq!(
            display_name(&User::new("7").with_name("Ada")),
            "Ada (7)"
        );
    }
}
