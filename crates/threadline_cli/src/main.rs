//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `threadline_core` wiring against a real database file.
//! - Print one assembled comment page as JSON.
//!
//! Usage: `threadline_cli <db_path> [page] [--seed]`
//!
//! `THREADLINE_PAGE_SIZE` overrides the number of top-level comments per page.
//! `--seed` inserts a small demo thread first. Seeding only ever happens on
//! request; opening the engine never writes data by itself.

use log::info;
use std::process::ExitCode;
use threadline_core::db::open_db;
use threadline_core::{
    core_version, default_log_level, init_logging, CommentService, SqliteCommentRepository,
    SqliteNotificationRepository, SqliteUserRepository, ThreadConfig, ThreadService, UserProfile,
    UserRepository,
};
use uuid::Uuid;

const LOG_DIR_ENV: &str = "THREADLINE_LOG_DIR";
const PAGE_SIZE_ENV: &str = "THREADLINE_PAGE_SIZE";

struct Args {
    db_path: String,
    page: u32,
    seed: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut db_path = None;
    let mut page = 1;
    let mut seed = false;

    for arg in std::env::args().skip(1) {
        if arg == "--seed" {
            seed = true;
        } else if db_path.is_none() {
            db_path = Some(arg);
        } else {
            page = arg
                .parse()
                .map_err(|_| format!("page must be a positive integer, got `{arg}`"))?;
        }
    }

    let db_path = db_path.ok_or("usage: threadline_cli <db_path> [page] [--seed]")?;
    Ok(Args {
        db_path,
        page,
        seed,
    })
}

fn thread_config() -> Result<ThreadConfig, Box<dyn std::error::Error>> {
    let mut config = ThreadConfig::default();
    if let Ok(raw) = std::env::var(PAGE_SIZE_ENV) {
        config.page_size = raw
            .trim()
            .parse()
            .map_err(|_| format!("{PAGE_SIZE_ENV} must be an integer, got `{raw}`"))?;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<String, Box<dyn std::error::Error>> {
    let config = thread_config()?;
    let conn = open_db(&args.db_path)?;

    if args.seed {
        seed_demo_thread(&conn)?;
    }

    let threads = ThreadService::with_config(SqliteCommentRepository::try_new(&conn)?, config);
    let page = threads.list_page(args.page)?;
    Ok(serde_json::to_string_pretty(&page)?)
}

fn seed_demo_thread(conn: &rusqlite::Connection) -> Result<(), Box<dyn std::error::Error>> {
    let users = SqliteUserRepository::try_new(conn)?;
    let host = UserProfile::new(Uuid::new_v4(), "Host", "host@example.com");
    let guest = UserProfile::new(Uuid::new_v4(), "Guest", "guest@example.com");
    users.upsert_user(&host)?;
    users.upsert_user(&guest)?;

    let comments = CommentService::new(
        SqliteCommentRepository::try_new(conn)?,
        SqliteNotificationRepository::try_new(conn)?,
    );
    let root = comments.create_comment(Some(host.id), "Welcome to the thread.", None)?;
    let reply = comments.create_comment(Some(guest.id), "Glad to be here.", Some(root.id))?;
    comments.create_comment(Some(host.id), "Thanks for stopping by!", Some(reply.id))?;

    info!("event=seed module=cli status=ok root_id={}", root.id);
    Ok(())
}

fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("threadline_cli: logging disabled: {err}");
        }
    }

    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    eprintln!("threadline_core version={}", core_version());
    match run(&args) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("threadline_cli: {err}");
            ExitCode::FAILURE
        }
    }
}
