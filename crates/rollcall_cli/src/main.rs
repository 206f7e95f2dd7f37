//! Command-line front end for the attendance table.
//!
//! # Responsibility
//! - Submit, list and remove attendance entries in a local store.
//! - Replay recorded change batches through the live view.
//!
//! A missing or invalid backend configuration exits with status 2.

use clap::{Parser, Subcommand};
use log::error;
use rollcall_core::db::open_db;
use rollcall_core::{
    default_log_level, init_logging, load_backend_config, AttendanceForm, AttendancePage,
    ConfigError, CurriculumTabs, LiveViewReconciler, MemorySink, MessageBody, RecordId,
    RefreshOutcome, ScriptedChangeSource, SignedInUser, Subscription, SystemClock,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend configuration object (JSON)
    #[arg(short, long, env = "ROLLCALL_CONFIG", default_value = "rollcall.json")]
    config: PathBuf,

    /// SQLite database file
    #[arg(long, env = "ROLLCALL_DB", default_value = "rollcall.sqlite3")]
    db: PathBuf,

    /// Directory for rotating log files; logging is off when unset
    #[arg(long, env = "ROLLCALL_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "ROLLCALL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Name of the signed-in user
    #[arg(short, long, env = "ROLLCALL_USER", default_value = "Anonymous")]
    user: String,

    /// Profile picture of the signed-in user
    #[arg(long)]
    photo_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record attendance for one lecture
    Submit {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        rollno: String,
        /// Defaults to the signed-in user
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the attendance table
    Show {
        /// Only show rows of this curriculum tab
        #[arg(long)]
        tab: Option<String>,
        /// JSON array of `{id, label, classes}` replacing the default tabs
        #[arg(long)]
        tabs_file: Option<PathBuf>,
    },
    /// Delete one entry by id
    Remove { id: String },
    /// Apply recorded change batches (JSON array of arrays) to an empty view
    Replay { file: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = setup_logging(&cli) {
        eprintln!("warning: {err}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("{err}");
            if err.downcast_ref::<ConfigError>().is_some() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn setup_logging(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let Some(dir) = &cli.log_dir else {
        return Ok(());
    };
    let dir = if dir.is_absolute() {
        dir.clone()
    } else {
        std::env::current_dir()?.join(dir)
    };
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, &dir.to_string_lossy())?;
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Replay { ref file } => replay(file),
        Command::Submit {
            ref subject,
            ref rollno,
            ref name,
        } => {
            let name = name.clone().unwrap_or_else(|| cli.user.clone());
            submit(&cli, &AttendanceForm::new(subject, rollno, name))
        }
        Command::Show {
            ref tab,
            ref tabs_file,
        } => show(&cli, tab.as_deref(), tabs_file.as_deref()),
        Command::Remove { ref id } => remove(&cli, id),
    }
}

fn signed_in_user(cli: &Cli) -> SignedInUser {
    let user = SignedInUser::new(&cli.user);
    match &cli.photo_url {
        Some(url) => user.with_photo(url),
        None => user,
    }
}

fn submit(cli: &Cli, form: &AttendanceForm) -> Result<(), Box<dyn Error>> {
    let config = load_backend_config(&cli.config)?;
    let conn = open_db(&cli.db)?;
    let mut page = AttendancePage::start(config, &conn, MemorySink::new(), SystemClock)?;
    page.sign_in(signed_in_user(cli));

    let submitted = page.submit(form)?;
    // A local store acknowledges its own writes.
    page.acknowledge_pending_writes()?;
    println!("{}", submitted.notice.message());
    println!("id={}", submitted.id);
    Ok(())
}

fn show(cli: &Cli, tab: Option<&str>, tabs_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let config = load_backend_config(&cli.config)?;
    let conn = open_db(&cli.db)?;
    let mut page = AttendancePage::start(config, &conn, MemorySink::new(), SystemClock)?;
    if let Some(path) = tabs_file {
        let tabs = CurriculumTabs::from_json_str(&std::fs::read_to_string(path)?)?;
        page = page.with_tabs(tabs);
    }
    page.sign_in(signed_in_user(cli));

    if let RefreshOutcome::Applied(report) = page.refresh()? {
        for rejected in &report.rejected {
            eprintln!("skipped change: {rejected}");
        }
    }
    page.tick();
    if let Some(tab) = tab {
        page.select_tab(tab)?;
    }

    let sink = page.view().sink();
    print_table(sink, |row_class| page.is_row_visible(row_class));
    page.close();
    Ok(())
}

fn remove(cli: &Cli, id: &str) -> Result<(), Box<dyn Error>> {
    let config = load_backend_config(&cli.config)?;
    let conn = open_db(&cli.db)?;
    let page = AttendancePage::start(config, &conn, MemorySink::new(), SystemClock)?;
    page.delete(&RecordId::new(id)?)?;
    println!("removed id={id}");
    Ok(())
}

fn replay(file: &Path) -> Result<(), Box<dyn Error>> {
    let source = ScriptedChangeSource::from_json_str(&std::fs::read_to_string(file)?)?;
    let mut view = LiveViewReconciler::new(MemorySink::new(), SystemClock);
    let mut subscription = Subscription::new(source);

    let mut batch = 0;
    while subscription.source().remaining() > 0 {
        batch += 1;
        if let Some(report) = subscription.pump(&mut view)? {
            println!(
                "batch={batch} applied={} rejected={}",
                report.applied,
                report.rejected.len()
            );
            for rejected in &report.rejected {
                println!("  rejected: {rejected}");
            }
        }
        view.tick();
    }
    subscription.unsubscribe();

    print_table(view.sink(), |_| true);
    Ok(())
}

fn print_table(sink: &MemorySink, visible: impl Fn(&str) -> bool) {
    println!("{}", sink.header());
    for row in sink.rows() {
        let slot = &row.slot;
        if !visible(&slot.row_class) {
            continue;
        }
        let body = match &slot.body {
            MessageBody::Text(markup) => terminal_text(markup),
            MessageBody::Image(url) => format!("[image {url}]"),
            MessageBody::Empty => String::new(),
        };
        println!(
            "{} | {} | {} | {} | {}",
            slot.profile_pic_url.as_deref().unwrap_or("-"),
            slot.name,
            slot.rollno,
            body,
            slot.record_time
        );
    }
}

/// Turns rendered slot markup back into plain terminal text.
fn terminal_text(markup: &str) -> String {
    markup
        .replace("<br>", " / ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::terminal_text;
    use rollcall_core::view::render::text_with_line_breaks;

    #[test]
    fn terminal_text_undoes_slot_escaping() {
        assert_eq!(
            terminal_text(&text_with_line_breaks("Sensors & Transducers")),
            "Sensors & Transducers"
        );
        assert_eq!(
            terminal_text(&text_with_line_breaks("a <b>\n\"c\" 'd' &lt;")),
            "a <b> / \"c\" 'd' &lt;"
        );
    }
}
