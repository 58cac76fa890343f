use crate::api::routes::AppState;
use crate::api::server as api_server;
use crate::cli::opts::*;
use crate::speech::HttpSpeech;

use anyhow::{bail, Result};
use lexideck_core::reply::{Body, ReplyBatch};
use lexideck_core::{
    filter_by_category, filter_by_text, sort_deck_order, DialogueController, InboundEvent,
    NewCard, RepoProgress, RepoSource, Repository,
};
use lexideck_json::paths::{data_root, default_audio_dir};
use lexideck_json::JsonStore;
use lexideck_sqlite::SqliteRepo;
use std::io::{stdin, stdout, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

const LOCAL_CONVERSATION: &str = "local";

pub async fn run_cli(args: Cli) -> Result<()> {
    let repo = open_repo(&args.store, args.db_path.clone(), args.json_path.clone()).await?;
    match args.cmd {
        Command::Serve(cmd) => serve_cmd(repo, cmd).await,
        Command::Chat(opts) => chat_cmd(repo, opts).await,
        Command::Card(cmd) => card_cmd(repo, cmd).await,
        Command::Import(cmd) => import_cmd(repo, cmd).await,
    }
}

pub async fn open_repo(
    store: &StoreKind,
    db_path: Option<PathBuf>,
    json_path: Option<PathBuf>,
) -> Result<Arc<dyn Repository>> {
    match store {
        StoreKind::Json => {
            let s = match json_path {
                Some(p) => {
                    let backups = p.with_extension("backups");
                    JsonStore::open_with(p, backups, 10).await?
                }
                None => JsonStore::open_default().await?,
            };
            info!(path = %s.path().display(), "opened json card store");
            Ok(Arc::new(s))
        }
        StoreKind::Sqlite => {
            let p = db_path.unwrap_or_else(|| data_root().join("lexideck.sqlite3"));
            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let s = SqliteRepo::open_file(&p).await?;
            info!(path = %p.display(), "opened sqlite card store");
            Ok(Arc::new(s))
        }
    }
}

fn build_controller(repo: Arc<dyn Repository>, deck: &DeckOpts) -> DialogueController {
    let source = RepoSource::new(repo.clone(), deck.page_size).with_category(deck.category.clone());
    DialogueController::new(Arc::new(source), Arc::new(RepoProgress::new(repo)))
}

async fn serve_cmd(repo: Arc<dyn Repository>, cmd: ServeCmd) -> Result<()> {
    let addr: std::net::SocketAddr = cmd.addr.parse()?;
    let mut controller = build_controller(repo.clone(), &cmd.deck);

    let audio_dir = match &cmd.tts_url {
        Some(url) => {
            let dir = cmd.audio_dir.clone().unwrap_or_else(default_audio_dir);
            let speech = Arc::new(HttpSpeech::new(url.clone(), dir, cmd.public_url.clone())?);
            info!(endpoint = %url, dir = %speech.audio_dir().display(), "speech enabled");
            let dir = speech.audio_dir().to_path_buf();
            controller = controller.with_audio(speech.clone(), speech);
            Some(dir)
        }
        None => {
            info!("speech disabled (no --tts-url)");
            None
        }
    };

    let state = Arc::new(AppState {
        controller: Arc::new(controller),
        repo,
    });
    api_server::run(state, audio_dir, addr).await
}

async fn chat_cmd(repo: Arc<dyn Repository>, opts: DeckOpts) -> Result<()> {
    let controller = build_controller(repo, &opts);
    println!("type a button label to answer, /quit to leave");

    let first = InboundEvent::new(LOCAL_CONVERSATION, "");
    if let Some(batch) = controller.handle(&first).await {
        print_batch(&batch);
    }
    loop {
        let Some(line) = read_line("> ")? else { break };
        let text = line.trim_end_matches(['\r', '\n']);
        if text == "/quit" {
            break;
        }
        match controller.handle(&InboundEvent::new(LOCAL_CONVERSATION, text)).await {
            Some(batch) => print_batch(&batch),
            None => println!("(ignored)"),
        }
    }
    Ok(())
}

fn print_batch(batch: &ReplyBatch) {
    for m in &batch.messages {
        match &m.body {
            Body::Text { text } => println!("{text}"),
            Body::Audio { url } => println!("[audio] {url}"),
        }
        if !m.suggested_actions.is_empty() {
            let buttons: Vec<String> = m.suggested_actions.iter().map(|a| format!("[{a}]")).collect();
            println!("{}", buttons.join(" "));
        }
    }
}

async fn card_cmd(repo: Arc<dyn Repository>, cmd: CardCmd) -> Result<()> {
    match cmd {
        CardCmd::Add(a) => {
            let c = repo
                .add_card(NewCard {
                    phrase: a.phrase,
                    meaning: a.meaning,
                    example: a.example,
                    categories: a.categories,
                })
                .await?;
            println!("{}", c.id);
        }
        CardCmd::List { query, category } => {
            let mut cards = repo.list_cards().await?;
            if let Some(q) = query {
                cards = filter_by_text(&cards, &q);
            }
            if let Some(cat) = category {
                cards = filter_by_category(&cards, &cat);
            }
            sort_deck_order(&mut cards);
            for c in cards {
                let cats = if c.categories.is_empty() { "-".to_string() } else { c.categories.join(";") };
                let last = c
                    .last_reviewed_at
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{}\t{}\t{}\tcategories={}\treviews={}\tlast={}",
                    c.id,
                    c.phrase,
                    c.meaning,
                    cats,
                    c.grades.len(),
                    last
                );
            }
        }
        CardCmd::Rm { card_id } => {
            repo.delete_card(&card_id).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn import_cmd(repo: Arc<dyn Repository>, cmd: ImportCmd) -> Result<()> {
    match cmd {
        ImportCmd::Csv { path } => {
            let mut rdr = csv::Reader::from_path(&path)?;
            let headers = rdr.headers()?.clone();
            if headers.get(0) != Some("phrase") || headers.get(1) != Some("meaning") {
                bail!("expected header row starting with phrase,meaning");
            }
            let mut imported = 0usize;
            for (line, rec) in rdr.records().enumerate() {
                let rec = rec?;
                match parse_row(&rec) {
                    Some(new) => {
                        repo.add_card(new).await?;
                        imported += 1;
                    }
                    None => warn!(row = line + 2, "skipping row without phrase or meaning"),
                }
            }
            println!("imported {imported}");
        }
    }
    Ok(())
}

fn parse_row(rec: &csv::StringRecord) -> Option<NewCard> {
    let phrase = rec.get(0).unwrap_or("").trim().to_string();
    let meaning = rec.get(1).unwrap_or("").trim().to_string();
    if phrase.is_empty() || meaning.is_empty() {
        return None;
    }
    let example = rec.get(2).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let categories = rec
        .get(3)
        .unwrap_or("")
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    Some(NewCard {
        phrase,
        meaning,
        example,
        categories,
    })
}

// ===== Helpers =====
/// `None` on end of input.
fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    stdout().flush().ok();
    let mut s = String::new();
    if stdin().read_line(&mut s)? == 0 {
        return Ok(None);
    }
    Ok(Some(s))
}
