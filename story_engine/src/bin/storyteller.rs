//! Storyteller - write and play branching stories in the terminal.
//!
//! Reads one command per line from stdin. Story text goes to stdout; logs go
//! to stderr and are filtered by `RUST_LOG` or the configured level.

use std::error::Error;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use story_engine::command::HELP;
use story_engine::{
    Command, FileStore, KeyValueStore, PlaySession, StoryConfig, StoryEvent, StoryObserver,
    Storybook,
};
use story_graph::StoryGraph;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the storyteller.
#[derive(Parser, Debug)]
#[command(name = "storyteller")]
#[command(about = "Write and play branching stories")]
#[command(version)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "storyteller.toml")]
    config: PathBuf,

    /// Path to the story store, overriding the configuration
    #[arg(short, long, env = "STORYTELLER_STORE")]
    store: Option<PathBuf>,
}

/// Prints the scene whenever play moves.
struct TerminalRenderer;

impl StoryObserver for TerminalRenderer {
    fn on_event(&mut self, event: &StoryEvent, graph: &StoryGraph, session: &PlaySession) {
        match event {
            StoryEvent::PlayStarted | StoryEvent::ChoiceTaken { .. } => {
                print_scene(graph, session);
            }
            StoryEvent::EndingReached { .. } => {
                println!("\n--- The End ---");
                if let Some(story) = session.final_story(graph) {
                    if !story.is_empty() {
                        println!("\n{story}");
                    }
                }
            }
            StoryEvent::StoryImported { parts } => println!("Story loaded, {parts} parts."),
            StoryEvent::StoryReset => println!("Started a new story."),
            StoryEvent::DarkModeChanged { enabled } => {
                println!("Dark mode {}.", if *enabled { "on" } else { "off" });
            }
            _ => {}
        }
    }
}

fn print_scene(graph: &StoryGraph, session: &PlaySession) {
    let Some(part) = session.current(graph) else {
        return;
    };
    println!("\n[{}] {}", session.progress(graph), part.name);
    if !part.text.is_empty() {
        println!("{}", part.text);
    }
    for (index, choice) in part.choices.iter().enumerate() {
        println!("  {}. {}", index + 1, choice.text);
    }
}

fn print_parts(graph: &StoryGraph) {
    for (index, part) in graph.parts().iter().enumerate() {
        println!("{}. {}", index + 1, part.name);
        if !part.text.is_empty() {
            println!("   {}", part.text);
        }
        for (choice_index, choice) in part.choices.iter().enumerate() {
            let target = graph
                .part(choice.next_part)
                .map(|p| p.name.as_str())
                .unwrap_or("(missing part)");
            println!(
                "   {}.{} \"{}\" -> {}",
                index + 1,
                choice_index + 1,
                choice.text,
                target
            );
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = StoryConfig::from_file(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level)),
        )
        .with_writer(io::stderr)
        .init();

    let store_path = args.store.unwrap_or_else(|| config.storage.path.clone());
    info!(store = %store_path.display(), "Opening story");

    let store = FileStore::open(&store_path)?;
    let mut book = Storybook::open(store)?.with_pretty_export(config.export.pretty);
    book.subscribe(TerminalRenderer);

    println!("Storyteller - type \"help\" for commands.");
    if book.dark_mode() {
        println!("Dark mode on.");
    }
    print_parts(book.graph());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("! {err}");
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }
        if command == Command::Reset {
            print!("Reset the story? This cannot be undone. Type \"yes\" to confirm: ");
            io::stdout().flush()?;
            let answer = lines.next().transpose()?.unwrap_or_default();
            if answer.trim() != "yes" {
                println!("Kept the story.");
                continue;
            }
        }

        if let Err(err) = execute(&mut book, command) {
            error!("{err}");
            println!("! {err}");
        }
    }

    Ok(())
}

fn execute<S: KeyValueStore>(book: &mut Storybook<S>, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Parts => print_parts(book.graph()),
        Command::AddPart => {
            let part = book.add_part()?;
            println!("Added {}.", book.parts()[part].name);
        }
        Command::RemovePart(part) => {
            let removed = book.remove_part(part)?;
            println!("Removed {}.", removed.name);
        }
        Command::Rename(part, name) => book.rename_part(part, &name)?,
        Command::Text(part, text) => book.set_part_text(part, &text)?,
        Command::AddChoice(part) => {
            let choice = book.add_choice(part)?;
            println!("Added choice {}.{}.", part + 1, choice + 1);
        }
        Command::RemoveChoice(part, choice) => book.remove_choice(part, choice)?,
        Command::ChoiceText(part, choice, text) => book.set_choice_text(part, choice, &text)?,
        Command::Target(part, choice, next) => book.set_choice_target(part, choice, next)?,
        Command::Validate => {
            let report = book.validate();
            if report.is_clean() {
                println!("No problems found.");
            }
            for issue in &report.issues {
                println!("{:?}: {issue}", issue.severity());
            }
        }
        Command::Play | Command::Replay => {
            let report = book.start_play()?;
            for issue in report.errors() {
                println!("Note: {issue}");
            }
        }
        Command::Choose(choice) => {
            book.choose(choice)?;
        }
        Command::History => {
            let transcript = book.transcript();
            if transcript.is_empty() {
                println!("No choices made yet.");
            }
            for line in transcript {
                println!("{line}");
            }
        }
        Command::Export(path) => {
            fs::write(&path, book.export_json()?)?;
            println!("Saved story to {}.", path.display());
        }
        Command::Import(path) => {
            let bytes = fs::read(&path)?;
            book.import_json(&bytes)?;
        }
        Command::Reset => book.reset_story()?,
        Command::Dark => {
            book.toggle_dark_mode()?;
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}
