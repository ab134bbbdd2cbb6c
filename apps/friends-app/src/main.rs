//! friends — interactive terminal front-end for the friends record store.
//!
//! Reads one command per line, applies it through the list controller, and
//! re-renders the list after every command.
//! - Storage: SQLite file (default), raw object-store document, or in-memory.
//! - A store that cannot be opened still starts the front-end; the reason is
//!   shown and changes are disabled.
//!
//! Run:
//! ```bash
//! # SQLite store under ./data (default)
//! cargo run -p friends-app
//!
//! # object-store document, JSON logs at debug level on stderr
//! STORAGE_PROVIDER=kv DB_PATH=/tmp/friends.json LOG_FORMAT=json RUST_LOG=debug \
//!   cargo run -p friends-app
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod command;
mod config;
mod controller;
mod store;
mod view;

use std::io::Write;
use std::ops::ControlFlow;

use domain::service::FriendService;
use domain::FriendRepository;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::command::{Command, HELP};
use crate::controller::ListController;

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    info!(version = %domain::about(), "starting friends");

    let repo = store::open_with_timeout(&cfg).await;
    let mut ctl = ListController::new(FriendService::new(repo), cfg.store_timeout);
    let title = format!("Friends ({})", cfg.storage_provider.label());

    // Mount failures are already in the view's notice.
    let _ = ctl.mount().await;
    print!("{}", view::render(&title, &ctl.view()));
    println!("type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "failed to read input");
                break;
            }
        };
        let cmd = match command::parse(&line) {
            Ok(cmd) => cmd,
            Err(msg) => {
                println!("{}", msg);
                continue;
            }
        };
        match cmd {
            Command::Help => println!("{}", HELP),
            cmd => {
                if dispatch(&mut ctl, cmd).await.is_break() {
                    break;
                }
                print!("{}", view::render(&title, &ctl.view()));
            }
        }
    }
    info!("friends stopped");
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout belongs to the interactive view
    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

/// Apply one command. Failures are already reflected in the controller's
/// notice, so they are only logged here.
async fn dispatch<R: FriendRepository + 'static>(
    ctl: &mut ListController<R>,
    cmd: Command,
) -> ControlFlow<()> {
    let result = match cmd {
        Command::Name(v) => {
            ctl.set_add_name(v);
            Ok(())
        }
        Command::Age(v) => {
            ctl.set_add_age(v);
            Ok(())
        }
        Command::Add(fields) => {
            if let Some((name, age)) = fields {
                ctl.set_add_name(name);
                ctl.set_add_age(age);
            }
            ctl.add().await
        }
        Command::Edit(id) => ctl.begin_edit(id).await,
        Command::EditName(v) => ctl.set_edit_name(v),
        Command::EditAge(v) => ctl.set_edit_age(v),
        Command::Update => ctl.update().await,
        Command::Cancel => ctl.cancel_edit(),
        Command::Delete(id) => ctl.delete(id).await,
        Command::Refresh => ctl.refresh().await,
        Command::Dismiss => {
            ctl.dismiss_notice();
            Ok(())
        }
        Command::Help => Ok(()),
        Command::Quit => return ControlFlow::Break(()),
    };
    if let Err(e) = result {
        debug!(error = %e, "command failed");
    }
    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Mode;
    use domain::adapters::memory_repo::InMemoryRepo;
    use std::time::Duration;

    fn controller() -> ListController<InMemoryRepo> {
        ListController::new(FriendService::new(InMemoryRepo::new()), Duration::from_secs(5))
    }

    async fn run_lines(ctl: &mut ListController<InMemoryRepo>, lines: &[&str]) -> bool {
        for line in lines {
            let cmd = command::parse(line).unwrap();
            if dispatch(ctl, cmd).await.is_break() {
                return false;
            }
        }
        true
    }

    #[tokio::test]
    async fn scripted_session_reaches_expected_list() {
        let mut ctl = controller();
        let open = run_lines(
            &mut ctl,
            &[
                "name Bob",
                "age 25",
                "add",
                "add Cy 40",
                "edit 1",
                "edit-name Bobby",
                "edit-age 26",
                "update",
                "delete 2",
            ],
        )
        .await;
        assert!(open);
        let text = view::render("Friends", &ctl.view());
        assert!(text.contains("[1] Bobby (26)"));
        assert!(!text.contains("Cy"));
        assert_eq!(ctl.view().mode, &Mode::Idle);
    }

    #[tokio::test]
    async fn failed_command_shows_notice_and_continues() {
        let mut ctl = controller();
        assert!(run_lines(&mut ctl, &["add Ann abc", "update"]).await);
        let text = view::render("Friends", &ctl.view());
        assert!(text.contains("!! error:"));
    }

    #[tokio::test]
    async fn quit_breaks_the_loop() {
        let mut ctl = controller();
        assert!(!run_lines(&mut ctl, &["add Ann 30", "quit", "add Bob 1"]).await);
        assert_eq!(ctl.view().friends.len(), 1);
    }
}
