use crate::cli::opts::*;
use crate::seed::starter_cards;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use kelime_core::{
    filters::{due_cards, filter_by_category, filter_by_text},
    stats::summarize,
    Clock, CoreError, Difficulty, Repository, ReviewSession, SessionId, SessionOutcome,
    SessionSummary, SystemClock, VocabularyCard,
};
use kelime_json::JsonStore;
use std::collections::HashSet;
use std::io::{stdin, stdout, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run_cli(args: Cli) -> Result<()> {
    let repo = open_repo(args.store.clone()).await?;
    match args.cmd {
        Command::Card(cmd) => card_cmd(repo, cmd).await,
        Command::Review(cmd) => review_cmd(repo, cmd).await,
        Command::Stats => stats_cmd(repo, args.daily_goal).await,
        Command::Seed => seed_cmd(repo).await,
        Command::Export(cmd) => export_cmd(repo, cmd).await,
        Command::Import(cmd) => import_cmd(repo, cmd).await,
    }
}

pub async fn open_repo(store: Option<PathBuf>) -> Result<Arc<dyn Repository>> {
    let s = match store {
        Some(path) => JsonStore::open_at(path).await,
        None => JsonStore::open_default().await,
    }
    .context("opening card store")?;
    info!(path = %s.path().display(), "store ready");
    Ok(Arc::new(s))
}

async fn card_cmd(repo: Arc<dyn Repository>, cmd: CardCmd) -> Result<()> {
    match cmd {
        CardCmd::Add(a) => {
            let mut card = match a.id {
                Some(id) => VocabularyCard::with_id(id, a.turkish, a.english, Utc::now()),
                None => VocabularyCard::new(a.turkish, a.english),
            };
            card.pronunciation = a.pronunciation;
            card.category = a.category;
            card.tags = a.tags;
            let c = repo.add_card(&card).await?;
            println!("{}", c.id);
        }
        CardCmd::List { category, query } => {
            let mut cards = repo.list_cards().await?;
            if let Some(cat) = category {
                cards = filter_by_category(&cards, &cat);
            }
            if let Some(q) = query {
                cards = filter_by_text(&cards, &q);
            }
            for c in cards {
                println!(
                    "{}\t{}\t{}\tcategory={}\treps={}\tinterval={}d\tnext={}",
                    c.id,
                    c.turkish,
                    c.english,
                    c.category.as_deref().unwrap_or("-"),
                    c.schedule.repetition_level,
                    c.schedule.interval_days,
                    c.schedule.next_review.format("%Y-%m-%d %H:%M"),
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

fn select_for_review(
    mut cards: Vec<VocabularyCard>,
    cmd: &ReviewCmd,
    now: DateTime<Utc>,
) -> Vec<VocabularyCard> {
    if let Some(cat) = &cmd.category {
        cards = filter_by_category(&cards, cat);
    }
    if cmd.due_only {
        cards = due_cards(&cards, now);
    }
    if let Some(max) = cmd.max {
        cards.truncate(max);
    }
    cards
}

async fn review_cmd(repo: Arc<dyn Repository>, cmd: ReviewCmd) -> Result<()> {
    let cards = select_for_review(repo.list_cards().await?, &cmd, Utc::now());

    if cards.is_empty() {
        println!("no cards to review");
        return Ok(());
    }

    let input = stdin();
    let mut input = input.lock();
    let mut out = stdout();
    match review_loop(&*repo, cards, Arc::new(SystemClock), &mut input, &mut out).await? {
        ReviewReport::Completed(outcome) => {
            println!(
                "\nreviewed {} card(s): {} correct, {} to relearn, accuracy {}%",
                outcome.results.len(),
                outcome.correct_count(),
                outcome.incorrect_count(),
                outcome.accuracy()
            );
        }
        ReviewReport::Abandoned { answered } => {
            println!("\nstopped after {answered} card(s)");
        }
    }
    Ok(())
}

#[derive(Debug)]
pub enum ReviewReport {
    Completed(SessionOutcome),
    Abandoned { answered: usize },
}

enum Answer {
    Grade(Difficulty),
    Again,
    Quit,
    Unknown,
}

fn parse_answer(line: &str) -> Answer {
    match line.trim().to_lowercase().as_str() {
        "e" | "5" => Answer::Grade(Difficulty::Easy),
        "m" | "3" => Answer::Grade(Difficulty::Medium),
        "h" | "1" => Answer::Grade(Difficulty::Hard),
        "" | "a" | "again" => Answer::Again,
        "q" | "quit" => Answer::Quit,
        other => other.parse::<Difficulty>().map(Answer::Grade).unwrap_or(Answer::Unknown),
    }
}

/// Walks one session over `cards`, persisting every card as soon as it is graded.
///
/// Stopping early (`q` or end of input) keeps the updates already written and
/// records no session summary.
pub async fn review_loop<R: BufRead, W: Write>(
    repo: &dyn Repository,
    cards: Vec<VocabularyCard>,
    clock: Arc<dyn Clock>,
    input: &mut R,
    out: &mut W,
) -> Result<ReviewReport> {
    let mut session = ReviewSession::new(clock);
    session.start(cards)?;
    info!(session = %session.id(), cards = session.progress().1, "review started");

    while let Some(card) = session.current_card().cloned() {
        let (answered, total) = session.progress();
        writeln!(out, "\n[{}/{}] {}", answered + 1, total, card.turkish)?;
        if let Some(p) = &card.pronunciation {
            writeln!(out, "    ({p})")?;
        }

        match read_line(input, out, "[enter=show, q=quit] ")? {
            Some(line) if !matches!(parse_answer(&line), Answer::Quit) => {}
            _ => return Ok(ReviewReport::Abandoned { answered }),
        }
        session.reveal()?;
        writeln!(out, "A: {}", card.english)?;

        let difficulty = loop {
            let Some(line) = read_line(input, out, "easy/medium/hard> ")? else {
                return Ok(ReviewReport::Abandoned { answered });
            };
            match parse_answer(&line) {
                Answer::Grade(d) => break d,
                Answer::Quit => return Ok(ReviewReport::Abandoned { answered }),
                Answer::Again => {
                    session.reveal()?;
                    writeln!(out, "A: {}", card.english)?;
                }
                Answer::Unknown => writeln!(out, "enter e/m/h, or q to stop")?,
            }
        };

        let sub = session.submit_response(difficulty)?;
        repo.update_card(&sub.updated_card).await?;
        info!(
            card = %sub.updated_card.id,
            quality = %sub.result.quality_rating,
            interval = sub.updated_card.schedule.interval_days,
            "card rescheduled"
        );
        writeln!(
            out,
            "→ next review in {} day(s)",
            sub.updated_card.schedule.interval_days
        )?;
    }

    let outcome = session.outcome()?.clone();
    if !outcome.results.is_empty() {
        repo.record_session(&outcome.summary()).await?;
    }
    info!(
        session = %outcome.session_id,
        reviewed = outcome.results.len(),
        accuracy = outcome.accuracy(),
        "review finished"
    );
    Ok(ReviewReport::Completed(outcome))
}

async fn stats_cmd(repo: Arc<dyn Repository>, daily_goal: u32) -> Result<()> {
    let cards = repo.list_cards().await?;
    let sessions = repo.list_sessions().await?;
    let s = summarize(&cards, &sessions, Local::now(), daily_goal);

    println!("cards\t\t{}", cards.len());
    println!("due now\t\t{}", s.items_due);
    println!("learned\t\t{}", s.items_learned);
    println!("reviews\t\t{}", s.total_reviews);
    println!("accuracy\t{}%", s.average_accuracy);
    println!("streak\t\t{} day(s)", s.streak_days);
    println!("today\t\t{}/{}", s.daily_progress, s.daily_goal);
    match s.next_review_time {
        Some(at) => println!(
            "next review\t{}",
            at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ),
        None => println!("next review\t-"),
    }
    Ok(())
}

async fn seed_cmd(repo: Arc<dyn Repository>) -> Result<()> {
    let (added, skipped) = add_all(&*repo, starter_cards(Utc::now())).await?;
    println!("added {added}, already present {skipped}");
    Ok(())
}

/// Adds cards, counting ids that already exist instead of failing on them.
async fn add_all(repo: &dyn Repository, cards: Vec<VocabularyCard>) -> Result<(usize, usize)> {
    let (mut added, mut skipped) = (0, 0);
    for card in cards {
        match repo.add_card(&card).await {
            Ok(_) => added += 1,
            Err(CoreError::Conflict(_)) => skipped += 1,
            Err(e) => return Err(e.into()),
        }
    }
    Ok((added, skipped))
}

async fn export_cmd(repo: Arc<dyn Repository>, cmd: ExportCmd) -> Result<()> {
    let cards = repo.list_cards().await?;
    match cmd {
        ExportCmd::Json { path } => {
            let bundle = ExportBundle {
                version: 1,
                cards,
                sessions: repo.list_sessions().await?,
            };
            let s = serde_json::to_string_pretty(&bundle)?;
            std::fs::write(&path, s)?;
            info!(path = %path.display(), "exported json");
            println!("wrote {}", path.display());
        }
        ExportCmd::Csv { path } => {
            let mut wtr = csv::Writer::from_path(&path)?;
            wtr.write_record(["turkish", "english", "pronunciation", "category", "tags"])?;
            for c in cards {
                wtr.write_record([
                    c.turkish,
                    c.english,
                    c.pronunciation.unwrap_or_default(),
                    c.category.unwrap_or_default(),
                    c.tags.join(";"),
                ])?;
            }
            wtr.flush()?;
            info!(path = %path.display(), "exported csv");
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

async fn import_cmd(repo: Arc<dyn Repository>, cmd: ImportCmd) -> Result<()> {
    match cmd {
        ImportCmd::Json { path } => {
            let data = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let bundle: ExportBundle = serde_json::from_str(&data)?;
            let report = import_bundle(&*repo, bundle).await?;
            if report.skipped > 0 {
                warn!(skipped = report.skipped, "cards with existing ids were not imported");
            }
            println!(
                "imported {}, skipped {}, sessions {}",
                report.added, report.skipped, report.sessions_added
            );
        }
        ImportCmd::Csv { path } => {
            let cards = read_csv_cards(csv::Reader::from_path(&path)?)?;
            let (added, _) = add_all(&*repo, cards).await?;
            println!("imported {added}");
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
struct ImportReport {
    added: usize,
    skipped: usize,
    sessions_added: usize,
}

/// Adds the bundle's cards and any sessions whose id the store has not seen.
async fn import_bundle(repo: &dyn Repository, bundle: ExportBundle) -> Result<ImportReport> {
    let (added, skipped) = add_all(repo, bundle.cards).await?;
    let mut known: HashSet<SessionId> =
        repo.list_sessions().await?.into_iter().map(|s| s.id).collect();
    let mut sessions = bundle.sessions;
    sessions.sort_by_key(|s| s.started_at);
    let mut sessions_added = 0;
    for s in &sessions {
        if known.insert(s.id) {
            repo.record_session(s).await?;
            sessions_added += 1;
        }
    }
    Ok(ImportReport {
        added,
        skipped,
        sessions_added,
    })
}

fn read_csv_cards<R: std::io::Read>(mut rdr: csv::Reader<R>) -> Result<Vec<VocabularyCard>> {
    let mut cards = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let turkish = rec.get(0).unwrap_or("").trim();
        let english = rec.get(1).unwrap_or("").trim();
        if turkish.is_empty() || english.is_empty() {
            warn!(line = ?rec.position().map(|p| p.line()), "skipping row without turkish/english");
            continue;
        }
        let mut card = VocabularyCard::new(turkish, english);
        card.pronunciation = rec.get(2).map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        card.category = rec.get(3).map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        card.tags = rec
            .get(4)
            .unwrap_or("")
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        cards.push(card);
    }
    Ok(cards)
}

fn read_line<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<Option<String>> {
    write!(out, "{prompt}")?;
    out.flush().ok();
    let mut s = String::new();
    if input.read_line(&mut s)? == 0 {
        return Ok(None);
    }
    Ok(Some(s))
}

#[derive(serde::Serialize, serde::Deserialize)]
struct ExportBundle {
    version: u32,
    cards: Vec<VocabularyCard>,
    #[serde(default)]
    sessions: Vec<SessionSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use clap::Parser;
    use kelime_core::{memory::MemoryRepo, ManualClock};
    use std::io::Cursor;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 2, 2, 20, 0, 0).unwrap()))
    }

    async fn seeded(ids: &[&str]) -> (MemoryRepo, Vec<VocabularyCard>) {
        let repo = MemoryRepo::new();
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut cards = Vec::new();
        for (i, id) in ids.iter().enumerate() {
            let card = VocabularyCard::with_id(*id, format!("tr{i}"), format!("en{i}"), t);
            repo.add_card(&card).await.unwrap();
            cards.push(card);
        }
        (repo, cards)
    }

    #[tokio::test]
    async fn full_review_persists_cards_and_session() {
        let (repo, cards) = seeded(&["a", "b", "c"]).await;
        let mut input = Cursor::new("\ne\n\n\nh\n\nmedium\n");
        let mut out = Vec::new();

        let report = review_loop(&repo, cards, clock(), &mut input, &mut out)
            .await
            .unwrap();

        let ReviewReport::Completed(outcome) = report else {
            panic!("expected completed session");
        };
        let ratings: Vec<u8> = outcome.results.iter().map(|r| r.quality_rating.value()).collect();
        assert_eq!(ratings, [5, 1, 3]);
        assert_eq!(outcome.results[1].attempts, 2);

        let a = repo.get_card("a").await.unwrap();
        assert_eq!(a.schedule.repetition_level, 1);
        assert_eq!(a.correct_count, 1);
        let b = repo.get_card("b").await.unwrap();
        assert_eq!(b.incorrect_count, 1);

        let sessions = repo.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].items_reviewed, 3);
        assert_eq!(sessions[0].correct_answers, 2);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[1/3] tr0"));
        assert!(text.contains("A: en2"));
    }

    #[tokio::test]
    async fn quitting_keeps_graded_cards_without_a_session() {
        let (repo, cards) = seeded(&["a", "b"]).await;
        let clock = clock();
        let mut input = Cursor::new("\ne\nq\n");
        let mut out = Vec::new();

        let report = review_loop(&repo, cards, clock.clone(), &mut input, &mut out)
            .await
            .unwrap();
        assert!(matches!(report, ReviewReport::Abandoned { answered: 1 }));

        let a = repo.get_card("a").await.unwrap();
        assert_eq!(a.schedule.next_review, clock.now() + Duration::days(1));
        assert!(repo.get_card("b").await.unwrap().last_reviewed_at.is_none());
        assert!(repo.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn end_of_input_abandons() {
        let (repo, cards) = seeded(&["a"]).await;
        let mut input = Cursor::new("\nwhat\n");
        let mut out = Vec::new();

        let report = review_loop(&repo, cards, clock(), &mut input, &mut out)
            .await
            .unwrap();
        assert!(matches!(report, ReviewReport::Abandoned { answered: 0 }));
        assert!(String::from_utf8(out).unwrap().contains("enter e/m/h"));
    }

    #[test]
    fn answer_aliases() {
        assert!(matches!(parse_answer("E\n"), Answer::Grade(Difficulty::Easy)));
        assert!(matches!(parse_answer("3"), Answer::Grade(Difficulty::Medium)));
        assert!(matches!(parse_answer(" Hard "), Answer::Grade(Difficulty::Hard)));
        assert!(matches!(parse_answer("\n"), Answer::Again));
        assert!(matches!(parse_answer("quit"), Answer::Quit));
        assert!(matches!(parse_answer("4"), Answer::Unknown));
    }

    #[test]
    fn csv_rows_become_cards() {
        let data = "turkish,english,pronunciation,category,tags\n\
                    elma,apple,el-MA,food,fruit;basic\n\
                    ,missing,,,\n\
                    mor,purple,,colors,\n";
        let cards = read_csv_cards(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].pronunciation.as_deref(), Some("el-MA"));
        assert_eq!(cards[0].tags, ["fruit", "basic"]);
        assert_eq!(cards[1].pronunciation, None);
        assert_eq!(cards[1].category.as_deref(), Some("colors"));
    }

    #[tokio::test]
    async fn reimporting_a_bundle_does_not_duplicate_sessions() {
        let (source, cards) = seeded(&["a", "b"]).await;
        let mut input = Cursor::new("\ne\n\nm\n");
        let mut out = Vec::new();
        review_loop(&source, cards, clock(), &mut input, &mut out)
            .await
            .unwrap();

        let bundle = ExportBundle {
            version: 1,
            cards: source.list_cards().await.unwrap(),
            sessions: source.list_sessions().await.unwrap(),
        };
        let text = serde_json::to_string(&bundle).unwrap();

        let target = MemoryRepo::new();
        let first = import_bundle(&target, serde_json::from_str(&text).unwrap())
            .await
            .unwrap();
        assert_eq!(
            first,
            ImportReport {
                added: 2,
                skipped: 0,
                sessions_added: 1
            }
        );

        let second = import_bundle(&target, serde_json::from_str(&text).unwrap())
            .await
            .unwrap();
        assert_eq!(
            second,
            ImportReport {
                added: 0,
                skipped: 2,
                sessions_added: 0
            }
        );
        assert_eq!(target.list_sessions().await.unwrap(), bundle.sessions);
    }

    #[test]
    fn review_takes_every_selected_card_unless_capped() {
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let cards: Vec<VocabularyCard> = (0..25)
            .map(|i| VocabularyCard::with_id(format!("c{i:02}"), "tr", "en", t))
            .collect();

        let Cli { cmd: Command::Review(all), .. } =
            Cli::try_parse_from(["kelime", "review"]).unwrap()
        else {
            panic!("expected review command");
        };
        assert_eq!(all.max, None);
        assert_eq!(select_for_review(cards.clone(), &all, t).len(), 25);

        let Cli { cmd: Command::Review(capped), .. } =
            Cli::try_parse_from(["kelime", "review", "--max", "7"]).unwrap()
        else {
            panic!("expected review command");
        };
        let picked = select_for_review(cards, &capped, t);
        assert_eq!(picked.len(), 7);
        assert_eq!(picked[0].id, "c00");
    }

    #[tokio::test]
    async fn seeding_twice_adds_nothing_new() {
        let repo = MemoryRepo::new();
        let first = add_all(&repo, starter_cards(Utc::now())).await.unwrap();
        let second = add_all(&repo, starter_cards(Utc::now())).await.unwrap();
        assert_eq!(first.1, 0);
        assert_eq!(second, (0, first.0));
    }
}
