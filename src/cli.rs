use color_eyre::eyre::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::chat::reply;
use crate::message::SessionId;
use crate::poet::PoetryPipeline;

pub const BANNER: &str = "Poetry Agent ready (Urdu + English). Type 'exit' to quit.\n";
pub const FAREWELL: &str = "Agent: Khuda hafiz! See you next time!\n";
const EXIT_WORDS: [&str; 3] = ["exit", "quit", "q"];
const FORGET_COMMAND: &str = "/forget";

/// Interactive loop: one line in, one poem (or the fallback) out, until an exit word or EOF.
pub async fn run<R, W>(
    pipeline: &PoetryPipeline,
    session: &SessionId,
    input: R,
    mut output: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    output.write_all(format!("{BANNER}\n").as_bytes()).await?;

    loop {
        output.write_all(b"You: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        if EXIT_WORDS.contains(&line.to_lowercase().as_str()) {
            output.write_all(FAREWELL.as_bytes()).await?;
            break;
        }
        if line == FORGET_COMMAND {
            pipeline.store().clear(session).await?;
            output.write_all(b"\nAgent: Forgot our conversation.\n\n").await?;
            continue;
        }

        let response = reply(pipeline, session, line).await.response;
        output
            .write_all(format!("\nAgent:\n{response}\n\n").as_bytes())
            .await?;
    }
    output.flush().await?;
    Ok(())
}
