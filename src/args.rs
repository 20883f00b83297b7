//! These structs provide the CLI interface for the finsheet CLI.

use crate::model::{Amount, TransactionKind};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// finsheet: a terminal dashboard for a spreadsheet-backed personal finance sheet.
///
/// The sheet is reached through a script endpoint and a sheet id, normally handed out as a link
/// such as https://miniappshare.netlify.app/?api=URL_API&sheetId=ID_SHEET. Run `finsheet connect`
/// with that link once; later commands reuse the saved connection.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Save the connection carried by a link. The link's parameters replace any saved connection.
    Connect(ConnectArgs),
    /// Show the saved connection.
    Session,
    /// Fetch the month-to-date summary once and print it.
    Summary(LinkArgs),
    /// Add a transaction to the sheet and print the refreshed summary.
    Add(Box<AddArgs>),
    /// Keep the summary up to date and print it whenever it changes, until Ctrl-C.
    Watch(LinkArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where configuration and the saved connection are kept. Defaults to
    /// ~/finsheet
    #[arg(long, env = "FINSHEET_HOME", default_value_t = default_finsheet_home())]
    finsheet_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, finsheet_home: PathBuf) -> Self {
        Self {
            log_level,
            finsheet_home: finsheet_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn finsheet_home(&self) -> &DisplayPath {
        &self.finsheet_home
    }
}

/// Args for the `finsheet connect` command.
#[derive(Debug, Parser, Clone)]
pub struct ConnectArgs {
    /// The link with `api` and `sheetId` query parameters. A bare query such as
    /// '?api=...&sheetId=...' is accepted too.
    link: String,
}

impl ConnectArgs {
    pub fn new(link: impl Into<String>) -> Self {
        Self { link: link.into() }
    }

    pub fn link(&self) -> &str {
        &self.link
    }
}

/// Args for commands that run the dashboard engine.
#[derive(Debug, Parser, Clone, Default)]
pub struct LinkArgs {
    /// Open with this link instead of the saved connection. The link's connection is saved.
    #[arg(long)]
    link: Option<String>,
}

impl LinkArgs {
    pub fn new(link: Option<String>) -> Self {
        Self { link }
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }
}

/// Args for the `finsheet add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    #[clap(flatten)]
    link: LinkArgs,

    /// The amount, e.g. 45000 or 45,000.
    #[arg(long)]
    amount: Amount,

    /// Whether the money came in or went out: income or expense.
    #[arg(long = "type", default_value_t = TransactionKind::Expense)]
    kind: TransactionKind,

    /// The category, as named in the sheet.
    #[arg(long)]
    category: String,

    /// The date of the transaction as YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// A free-form note.
    #[arg(long, default_value = "")]
    note: String,
}

impl AddArgs {
    pub fn new(
        link: LinkArgs,
        amount: Amount,
        kind: TransactionKind,
        category: impl Into<String>,
        date: Option<NaiveDate>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            link,
            amount,
            kind,
            category: category.into(),
            date,
            note: note.into(),
        }
    }

    pub fn link(&self) -> &LinkArgs {
        &self.link
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn note(&self) -> &str {
        &self.note
    }
}

fn default_finsheet_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("finsheet"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --finsheet-home or FINSHEET_HOME instead of relying on the \
                default directory.",
            );
            PathBuf::from("finsheet")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
