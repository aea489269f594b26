use anyhow::Context;
use bikefinder::data_models::{ADD_CLASS, ADD_LABEL, ButtonView, UiEvent};
use bikefinder::page::{ClickTarget, Page};
use bikefinder::suggestions::QueryOutcome;
use bikefinder::wishlist::{WishlistButton, scan_wishlist_buttons};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "bikefinder", about = "Drive the bike finder page clients from a terminal")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Type each value in turn into the search box and print the dropdown
    Suggest {
        #[arg(required = true)]
        keystrokes: Vec<String>,
        /// Pause between keystrokes
        #[arg(long, default_value_t = 50)]
        interval_ms: u64,
        /// Print the dropdown as the HTML fragment the page would insert
        #[arg(long, conflicts_with = "json")]
        html: bool,
        /// Print the dropdown as JSON
        #[arg(long)]
        json: bool,
    },
    /// Click a wishlist button for a make/model pair
    Wishlist {
        #[arg(long)]
        make: String,
        #[arg(long)]
        model: String,
        /// Number of concurrent clicks on the same button
        #[arg(long, default_value_t = 1)]
        clicks: usize,
    },
    /// List the wishlist buttons found in an HTML page
    Buttons { html_file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber (also picks up records from the log crate)
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(true)
        .init();

    match cli.command {
        Command::Suggest {
            keystrokes,
            interval_ms,
            html,
            json,
        } => {
            let format = if html {
                Output::Html
            } else if json {
                Output::Json
            } else {
                Output::Text
            };
            suggest(keystrokes, Duration::from_millis(interval_ms), format).await
        }
        Command::Wishlist {
            make,
            model,
            clicks,
        } => wishlist(&make, &model, clicks).await,
        Command::Buttons { html_file } => {
            let html = std::fs::read_to_string(&html_file)
                .with_context(|| format!("Failed to read {}", html_file.display()))?;
            for (i, button) in scan_wishlist_buttons(&html).iter().enumerate() {
                let view = button.view();
                println!(
                    "{i}: make={:?} model={:?} label={:?} state={:?}",
                    button.make(),
                    button.model(),
                    view.label,
                    view.state()
                );
            }
            Ok(())
        }
    }
}

#[derive(Clone, Copy)]
enum Output {
    Text,
    Html,
    Json,
}

async fn suggest(keystrokes: Vec<String>, interval: Duration, format: Output) -> anyhow::Result<()> {
    let page = Page::init_global()?;
    let client = page.suggestions();

    let mut last = None;
    for value in &keystrokes {
        last = Some(client.on_input(value));
        tokio::time::sleep(interval).await;
    }

    let outcome = match last {
        Some(pending) => pending.outcome().await,
        None => QueryOutcome::Cleared,
    };

    let dropdown = client.dropdown();
    match format {
        Output::Html => println!("{}", dropdown.to_html()),
        Output::Json => println!("{}", serde_json::to_string_pretty(&dropdown)?),
        Output::Text => {
            println!("outcome: {outcome:?}");
            if !dropdown.visible {
                println!("(no suggestions)");
            }
            for link in &dropdown.links {
                println!("{}\t{}", link.label, link.href);
            }
        }
    }
    Ok(())
}

async fn wishlist(make: &str, model: &str, clicks: usize) -> anyhow::Result<()> {
    let page = Page::init_global()?;
    let mut events = page
        .take_events()
        .context("UI events already taken")?;

    let index = page.add_button(WishlistButton::new(
        Some(make),
        Some(model),
        ButtonView::new(ADD_LABEL, &["btn", ADD_CLASS, "add-to-wishlist"]),
    ));

    let clicks = (0..clicks.max(1)).map(|_| page.dispatch_click(ClickTarget::WishlistButton(index)));
    for result in futures::future::join_all(clicks).await {
        println!("click: {result:?}");
    }

    if let Some(button) = page.button(index) {
        let view = button.view();
        println!("button: {:?} {:?}", view.label, view.classes);
    }

    while let Ok(event) = events.try_recv() {
        match event {
            UiEvent::Toast(toast) => println!("[{}] {}", toast.kind.as_str(), toast.message),
            UiEvent::Reload => println!("(page reload)"),
        }
    }
    Ok(())
}
