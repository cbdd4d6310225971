use std::sync::Arc;

use futures_util::StreamExt;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

use cafe_service::CafeService;

const PROMPT: &str = "you> ";

#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
	Skip,
	Quit,
	Clear,
	Ask(&'a str),
}
impl<'a> Command<'a> {
	pub fn parse(line: &'a str) -> Self {
		match line.trim() {
			"" => Self::Skip,
			"quit" | "exit" | "/quit" | "/exit" => Self::Quit,
			"/clear" => Self::Clear,
			message => Self::Ask(message),
		}
	}
}

/// Streams one answer to stdout as fragments arrive.
pub async fn answer(
	service: &Arc<CafeService>,
	session_id: &str,
	message: &str,
) -> color_eyre::Result<()> {
	let mut stdout = io::stdout();
	let mut stream = service.chat_stream(message, session_id);

	while let Some(fragment) = stream.next().await {
		stdout.write_all(fragment.as_bytes()).await?;
		stdout.flush().await?;
	}

	let outcome = stream.outcome().await?;

	if !outcome.grounded {
		stdout.write_all(format!("\n\n{}", outcome.recorded).as_bytes()).await?;
	}

	stdout.write_all(b"\n").await?;
	stdout.flush().await?;

	Ok(())
}

pub async fn run_loop(service: Arc<CafeService>, session_id: String) -> color_eyre::Result<()> {
	let mut stdout = io::stdout();
	let mut lines = BufReader::new(io::stdin()).lines();

	tracing::info!(session_id = %session_id, "Session started.");

	loop {
		stdout.write_all(PROMPT.as_bytes()).await?;
		stdout.flush().await?;

		let Some(line) = lines.next_line().await? else {
			break;
		};

		match Command::parse(&line) {
			Command::Skip => continue,
			Command::Quit => break,
			Command::Clear => {
				service.clear(&session_id).await?;
				stdout.write_all(b"Conversation cleared.\n").await?;
			},
			Command::Ask(message) => answer(&service, &session_id, message).await?,
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn commands_are_recognized_before_questions() {
		assert_eq!(Command::parse("   "), Command::Skip);
		assert_eq!(Command::parse("exit"), Command::Quit);
		assert_eq!(Command::parse(" /clear "), Command::Clear);
		assert_eq!(Command::parse(" vegan drinks? "), Command::Ask("vegan drinks?"));
	}
}
