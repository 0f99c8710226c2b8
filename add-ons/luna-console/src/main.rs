//! Luna console: line-based terminal chat.
//! Run: cargo run -p luna-console
//! Commands: :help, :reset, :quit. Everything else goes through the pipeline.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use luna_core::{ChatPipeline, Turn, TurnOutcome};

const HELP: &str = "commands: :help (this), :reset (forget the conversation), :quit (exit)";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pipeline = ChatPipeline::from_env();
    for issue in pipeline.config().preflight() {
        eprintln!("note: {}", issue);
    }

    println!("🌙 Luna console. {}", HELP);
    println!("If you're in crisis: call/text 988, text HOME to 741741, or call 911.\n");

    let mut history: Vec<Turn> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };

        match line.trim() {
            ":quit" | ":q" => break,
            ":help" => {
                println!("{}", HELP);
                continue;
            }
            ":reset" => {
                history.clear();
                println!("luna> fresh start 🌙");
                continue;
            }
            message => {
                let (reply, outcome) = pipeline.respond_traced(message, &history).await;
                println!("luna> {}\n", reply);
                if outcome == TurnOutcome::Generated || outcome == TurnOutcome::Crisis {
                    history.push(Turn::new(message, reply));
                }
            }
        }
    }

    println!("take care 🌙");
    Ok(())
}
