use std::env;
use std::path::PathBuf;

use barfeed::{BarMessage, Feed, FeedConfig, LogObserver, channel};
use tokio::io::AsyncReadExt;

fn print_usage() {
    eprintln!("Usage: barfeed [OPTIONS] [script.jsonl]");
    eprintln!();
    eprintln!("Replays a JSON-lines file of bar messages (stdin if no file is given)");
    eprintln!("through the feed loop and logs each bar event. Set RUST_LOG=debug for");
    eprintln!("per-update output.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --strict            Stop at the first rejected message");
    eprintln!("  --config <FILE>     Load feed settings from a TOML file");
    eprintln!("  -h, --help          Show this help");
}

/// Parses one message per line. Blank lines and `#` comments are skipped.
fn parse_script(text: &str) -> barfeed::Result<Vec<BarMessage>> {
    let mut messages = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let message = serde_json::from_str(line).map_err(|source| barfeed::Error::Script {
            line: index + 1,
            source,
        })?;
        messages.push(message);
    }
    Ok(messages)
}

async fn read_script(path: Option<&PathBuf>) -> barfeed::Result<String> {
    if let Some(path) = path {
        return Ok(tokio::fs::read_to_string(path).await?);
    }
    let mut text = String::new();
    tokio::io::stdin().read_to_string(&mut text).await?;
    Ok(text)
}

#[tokio::main]
async fn main() -> barfeed::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut strict = false;
    let mut config_path: Option<PathBuf> = None;
    let mut script: Option<PathBuf> = None;

    let args: Vec<String> = env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--strict" => strict = true,
            "--config" => {
                i += 1;
                if i < args.len() {
                    config_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: --config requires a value");
                    std::process::exit(1);
                }
            }
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other if other.starts_with('-') => {
                eprintln!("Error: unknown option {other}");
                print_usage();
                std::process::exit(1);
            }
            other => script = Some(PathBuf::from(other)),
        }
        i += 1;
    }

    let mut config = match &config_path {
        Some(path) => FeedConfig::load(path)?,
        None => FeedConfig::default(),
    };
    if strict {
        config = config.with_strict(true);
    }

    let messages = parse_script(&read_script(script.as_ref()).await?)?;
    log::info!("Replaying {} message(s)", messages.len());

    let feed = Feed::new(config);
    let (tx, rx) = channel(feed.config());

    let producer = tokio::spawn(async move {
        let total = messages.len();
        for (sent, message) in messages.into_iter().enumerate() {
            if tx.send(message).await.is_err() {
                log::debug!("Feed finished with {} message(s) unsent", total - sent);
                break;
            }
        }
    });

    let summary = feed.run(rx, &LogObserver).await?;
    if let Err(e) = producer.await {
        log::error!("Producer task failed: {e}");
    }

    println!(
        "{} bar(s): {} finished, {} closed ({} required)",
        summary.created, summary.finished, summary.closed, summary.required
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_script_skips_blanks_and_comments() {
        let text = r#"
# two bars
{"type":"minimum_required_bars","count":1}
{"type":"required_bar","bar_name":"a","total_entities":2}

{"type":"close","bar_name":"a"}
"#;
        let messages = parse_script(text).unwrap();
        assert_eq!(
            messages,
            vec![
                BarMessage::minimum_required_bars(1),
                BarMessage::required_bar("a", 2),
                BarMessage::close("a"),
            ]
        );
    }

    #[test]
    fn parse_script_reports_failing_line() {
        let text = "# header\n{\"type\":\"close\",\"bar_name\":\"a\"}\n\n{\"type\":\"nope\"}\n";
        let err = parse_script(text).unwrap_err();
        assert!(matches!(err, barfeed::Error::Script { line: 4, .. }));
        assert!(err.to_string().starts_with("Script line 4:"));
    }
}
