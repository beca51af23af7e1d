use proxydeck::app::{App, AppMessage};
use proxydeck::cli::{parse_args, usage, CliCommand, RunOptions};
use proxydeck::client::ProxyClient;
use proxydeck::poller::{spawn_status_poller, DEFAULT_POLL_PERIOD};
use proxydeck::ui;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Send tracing output to a file; stdout belongs to the alternate screen.
/// Controlled by `PROXYDECK_LOG` (env-filter syntax), off by default.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("PROXYDECK_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    let Ok(file) = std::fs::File::create("proxydeck.log") else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(file)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    match parse_args(std::env::args()) {
        CliCommand::Version => {
            println!("proxydeck {VERSION}");
            Ok(())
        }
        CliCommand::Help => {
            println!("{}", usage());
            Ok(())
        }
        CliCommand::Invalid(message) => {
            eprintln!("error: {message}\n\n{}", usage());
            std::process::exit(2);
        }
        CliCommand::Run(options) => run_console(options).await,
    }
}

async fn run_console(options: RunOptions) -> Result<()> {
    init_tracing();

    // Consume the auth token from the URL before anything is displayed or
    // logged; the stripped URL is the one the console keeps, and the token
    // rides along on every request the client makes from here on.
    let (client, token) = ProxyClient::from_url(&options.url).map_err(|e| eyre!(e.to_string()))?;
    info!("connecting to proxy at {}", client.base_url());
    let client = Arc::new(client);

    let (tx, mut rx) = mpsc::unbounded_channel::<AppMessage>();
    let mut app = App::new(Arc::clone(&client), tx.clone(), token);
    app.start();

    let poll_period = options.poll_period.unwrap_or(DEFAULT_POLL_PERIOD);
    let poller = spawn_status_poller(Arc::clone(&client), poll_period, tx);

    // Terminal bring-up.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = run_event_loop(&mut terminal, &mut app, &mut rx).await;

    // Teardown cancels all pending countdowns before the terminal goes back
    // to normal; no timer may fire into a dead console.
    app.shutdown();
    poller.abort();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Some(url) = &app.farewell_url {
        println!("Session terminated. Continue at: {url}");
    }

    run_result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mut mpsc::UnboundedReceiver<AppMessage>,
) -> Result<()> {
    let mut events = EventStream::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(frame, app))?;

        tokio::select! {
            // Messages apply fully to the store before the next draw; the
            // overlay selector never sees a half-applied poll response.
            message = rx.recv() => {
                match message {
                    Some(message) => app.handle_message(message),
                    None => break,
                }
            }
            event = events.next() => {
                match event {
                    Some(Ok(Event::Key(key))) => {
                        if key.kind != crossterm::event::KeyEventKind::Release {
                            app.handle_key(key);
                        }
                    }
                    Some(Ok(Event::Mouse(mouse))) => app.handle_mouse(mouse),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }
        }
    }
    Ok(())
}
