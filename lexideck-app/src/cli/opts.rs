use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, ValueEnum)]
pub enum StoreKind {
    Json,
    Sqlite,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "lexideck", version, about = "LexiDeck chat vocabulary trainer")]
pub struct Cli {
    /// Card store backend
    #[arg(long, value_enum, default_value_t = StoreKind::Json, env = "LEXIDECK_STORE")]
    pub store: StoreKind,

    /// SQLite DB path when --store sqlite (defaults to app data dir)
    #[arg(long, env = "LEXIDECK_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// JSON store file when --store json (defaults to app data dir)
    #[arg(long, env = "LEXIDECK_JSON_PATH")]
    pub json_path: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, env = "LEXIDECK_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the chat webhook server
    Serve(ServeCmd),
    /// Practice in the terminal against the same dialogue engine
    Chat(DeckOpts),
    /// Card operations
    #[command(subcommand)]
    Card(CardCmd),
    /// Import cards
    #[command(subcommand)]
    Import(ImportCmd),
}

#[derive(Debug, Args, Clone)]
pub struct DeckOpts {
    /// Cards fetched per page
    #[arg(long, default_value_t = 20, env = "LEXIDECK_PAGE_SIZE")]
    pub page_size: usize,

    /// Only practice cards in this category
    #[arg(long, env = "LEXIDECK_CATEGORY")]
    pub category: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ServeCmd {
    /// Bind address (host:port)
    #[arg(long, default_value = "127.0.0.1:8080", env = "LEXIDECK_ADDR")]
    pub addr: String,

    #[command(flatten)]
    pub deck: DeckOpts,

    /// Text-to-speech endpoint; speech is off when unset
    #[arg(long, env = "LEXIDECK_TTS_URL")]
    pub tts_url: Option<String>,

    /// Where generated audio is written and served from
    #[arg(long, env = "LEXIDECK_AUDIO_DIR")]
    pub audio_dir: Option<PathBuf>,

    /// Externally reachable base URL, used to build audio links
    #[arg(long, default_value = "http://127.0.0.1:8080", env = "LEXIDECK_PUBLIC_URL")]
    pub public_url: String,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CardCmd {
    Add(CardAdd),
    List {
        /// Substring search over phrase, meaning, example and categories
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    Rm {
        card_id: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct CardAdd {
    #[arg(long)]
    pub phrase: String,
    #[arg(long)]
    pub meaning: String,
    #[arg(long)]
    pub example: Option<String>,
    #[arg(long = "category")]
    pub categories: Vec<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ImportCmd {
    /// CSV with header `phrase,meaning,example,categories` (categories `;`-separated)
    Csv { path: PathBuf },
}
