//! Line-oriented console transport.
//!
//! Each stdin line is `<guild> <channel> <user> <text...>`; replies are printed as
//! `[#channel] text`. Ctrl-C or end of input stops the loop.
use anyhow::Result;
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::{log_event, Bot, TextEvent};

/// Run the console loop over stdin and stdout.
pub async fn run(bot: &mut Bot) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    run_lines(bot, stdin, &mut stdout).await
}

/// Drive the router from any line source; used by [`run`] and by tests.
pub async fn run_lines<R, W>(bot: &mut Bot, input: R, out: &mut W) -> Result<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    info!("console transport ready");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("console input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let Some(event) = TextEvent::from_console_line(&line) else {
                    warn!("ignored console line without <guild> <channel> <user> <text>");
                    continue;
                };
                log_event(&event);
                for reply in bot.route_text_event(&event) {
                    out.write_all(format!("[#{}] {}\n", reply.channel_id, reply.text).as_bytes())
                        .await?;
                }
                out.flush().await?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn routes_each_line() {
        let mut bot = Bot::in_memory(Config::default(), 3).unwrap();
        let input: &[u8] = b"g c alice !balance\nnot enough fields\n\ng c alice !help\n";
        let mut out = Vec::new();
        run_lines(&mut bot, input, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[#c] 💰 <@alice>"));
        assert!(text.contains("!coinflip"));
    }
}
