use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use flashcards_app::clock::FixedClock;
use flashcards_app::config::QueueConfig;
use flashcards_app::export::json::{export_json_to_path, import_json};
use flashcards_app::models::sm2::format_interval;
use flashcards_app::models::{LearnerId, SetId};
use flashcards_app::{Decision, Marked, ReviewQueue, SqliteStore, StudySession};
use log::info;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flashcards", about = "Review flashcards with SM-2 scheduling")]
struct Cli {
    /// SQLite database holding decks and progress
    #[arg(long, default_value = "db.sqlite3")]
    db: PathBuf,

    #[arg(long, default_value_t = 1)]
    learner: LearnerId,

    /// JSON file with queue settings
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a deck from a JSON file
    Import { file: PathBuf },
    /// Export a deck to a JSON file
    Export { set_id: SetId, file: PathBuf },
    /// List decks
    Decks,
    /// List cards due today
    Due {
        #[arg(long)]
        set: Option<SetId>,
    },
    /// Show review statistics
    Stats,
    /// Rate a card with an SM-2 quality from 0 to 5
    Rate { card: i64, quality: u8 },
    /// Advance the simulated date by one day
    NextDay,
    /// Study the cards due today
    Study {
        #[arg(long)]
        set: Option<SetId>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let store = SqliteStore::open(&cli.db)
        .wrap_err_with(|| format!("Failed to open database {}", cli.db.display()))?;

    if store.list_decks()?.is_empty() {
        let set_id = store.create_deck("Polish Vocabulary")?;
        store.add_card(set_id, "cześć", "hello")?;
        store.add_card(set_id, "dziękuję", "thank you")?;
        store.add_card(set_id, "proszę", "please")?;
        info!("Sample data created");
    }

    let config = match &cli.config {
        Some(path) => QueueConfig::load(path)
            .wrap_err_with(|| format!("Failed to read config {}", path.display()))?,
        None => QueueConfig::default(),
    };
    let today = store.current_date()?;
    let queue = ReviewQueue::new(store)
        .with_clock(FixedClock(today))
        .with_config(config);

    match cli.command {
        Command::Import { file } => {
            let deck = import_json(&file)?;
            let set_id = queue.store().import_deck(&deck)?;
            println!("Deck '{}' imported as {} with {} cards", deck.name, set_id, deck.cards.len());
        }
        Command::Export { set_id, file } => {
            let deck = queue.store().load_deck(set_id)?;
            export_json_to_path(&deck, &file)?;
            println!("Deck '{}' exported to {}", deck.name, file.display());
        }
        Command::Decks => {
            for (set_id, name) in queue.store().list_decks()? {
                let count = queue.store().cards_for_deck(set_id)?.len();
                println!("{:>4}  {} ({} cards)", set_id, name, count);
            }
        }
        Command::Due { set } => {
            println!("Due on {}:", queue.today());
            for (card, state) in queue.due_cards(cli.learner, set) {
                println!(
                    "{:>4}  {}  (EF {:.2}, interval {})",
                    card.id,
                    card.front,
                    state.easiness_factor,
                    format_interval(state.interval_days)
                );
            }
        }
        Command::Stats => {
            let stats = queue.stats(cli.learner);
            println!("Date:        {}", queue.today());
            println!("Total cards: {}", stats.total_cards);
            println!("Due today:   {}", stats.cards_due_today);
            println!("Learned:     {}", stats.cards_learned);
            println!("Average EF:  {:.2}", stats.average_ef);
        }
        Command::Rate { card, quality } => {
            let state = queue.rate(cli.learner, card, quality)?;
            println!(
                "Card {} next review on {} ({})",
                card,
                state.next_review_date,
                format_interval(state.interval_days)
            );
        }
        Command::NextDay => {
            let date = queue.store().advance_day()?;
            println!("Current date is now {}", date);
        }
        Command::Study { set } => {
            let mut session = queue.start_session(cli.learner, set);
            if session.total_count() == 0 {
                println!("No cards due today.");
                return Ok(());
            }
            study(&mut session)?;
        }
    }

    Ok(())
}

/// Line-driven study loop over stdin.
fn study(session: &mut StudySession<'_, SqliteStore>) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut show_back = false;

    loop {
        println!();
        println!(
            "{} | known {} | unknown {} | {} left",
            session.phase_message(),
            session.known_count(),
            session.unknown_count(),
            session.remaining_count()
        );
        match session.current() {
            Some(card) => {
                println!("Front: {}", card.front);
                if show_back {
                    println!("Back:  {}", card.back);
                }
                println!("[s]how [k]nown [u]nknown [z] undo [r]etry [x] exit retry [R]eset [q]uit");
            }
            None => {
                println!("Deck exhausted.");
                println!("[z] undo [r]etry [x] exit retry [R]eset [q]uit");
            }
        }
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            return Ok(());
        };
        let outcome = match line?.trim() {
            "s" => {
                show_back = !show_back;
                continue;
            }
            "k" => session.mark(Decision::Known).map(report_mark),
            "u" => session.mark(Decision::Unknown).map(report_mark),
            "z" => session.undo().map(|_| ()),
            "r" => session.enter_retry(),
            "x" => session.exit_retry(),
            "R" => {
                session.reset_all();
                Ok(())
            }
            "q" => return Ok(()),
            other => {
                println!("Unknown command '{}'", other);
                continue;
            }
        };
        show_back = false;

        if let Err(e) = outcome {
            println!("{}", e);
        }
    }
}

fn report_mark(marked: Marked) {
    match marked.persisted {
        Ok(state) => println!(
            "Next review on {} ({})",
            state.next_review_date,
            format_interval(state.interval_days)
        ),
        Err(e) => println!("Warning: progress for card {} was not saved: {}", marked.card_id, e),
    }
}
