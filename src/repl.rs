use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::dispatcher::{Dispatcher, Mode};

const EXIT_WORDS: [&str; 3] = ["salir", "exit", "quit"];

/// What the loop should do with one line of input.
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Exit,
    Skip,
    Query(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let query = line.trim();
    if query.is_empty() {
        Input::Skip
    } else if EXIT_WORDS.contains(&query.to_lowercase().as_str()) {
        Input::Exit
    } else {
        Input::Query(query)
    }
}

/// Interactive loop on stdin/stdout. Errors are printed and the loop goes on.
pub async fn run(dispatcher: &Dispatcher) -> Result<()> {
    println!("🤖 Agente de Gestión de Tareas con Gemini");
    println!("Conectando con el gateway de tareas...\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout
            .write_all("💬 ¿Qué quieres hacer? (o 'salir' para terminar): ".as_bytes())
            .await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match classify(&line) {
            Input::Exit => {
                println!("👋 ¡Hasta luego!");
                break;
            }
            Input::Skip => continue,
            Input::Query(query) => {
                if let Err(e) = dispatcher.handle(query, Mode::Verbose).await {
                    log::error!("REPL: query failed: {}", e);
                    println!("\n❌ Error: {}", e);
                }
                println!();
            }
        }
    }

    Ok(())
}
