//! `relaydesk chat`: Terminal client for a running gateway.

use relaydesk_client::{APOLOGY, ChatClient, ChatSession, render};
use relaydesk_config::AppConfig;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    url: Option<String>,
    message: Option<String>,
    html: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let base_url = match url {
        Some(url) => url,
        None => {
            let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
            format!("http://{}:{}", config.gateway.host, config.gateway.port)
        }
    };
    let session = ChatSession::new(ChatClient::new(&base_url));

    if let Some(msg) = message {
        ask(&session, &msg, html).await;
        return Ok(());
    }

    println!();
    println!("  RelayDesk Chat");
    println!("  Gateway:  {base_url}");
    println!("  Type your message and press Enter. Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }

        print!("  Assistant > ");
        std::io::stdout().flush()?;
        ask(&session, line, html).await;
        println!();
    }

    println!("  Goodbye!");
    Ok(())
}

/// Send one message and print the answer. Plain mode prints each new
/// fragment as it arrives; HTML mode prints the rendered answer once.
async fn ask(session: &ChatSession, text: &str, html: bool) {
    let mut shown = 0;
    let result = session
        .send(text, |answer| {
            if html {
                return;
            }
            print!("{}", &answer[shown..]);
            let _ = std::io::stdout().flush();
            shown = answer.len();
        })
        .await;

    match result {
        Ok(answer) if html => println!("{}", render(&answer)),
        Ok(_) => println!(),
        Err(e) => {
            if shown > 0 {
                println!();
            }
            eprintln!("  [Error] {e}");
            println!("{APOLOGY}");
        }
    }
}
