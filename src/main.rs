use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::runtime::Runtime;
use tokio::sync::oneshot;
use tracing::{error, info};

mod controller;
mod domain;
mod filter;
mod html;
mod inputter;
mod logging;
mod model;
mod pager;
mod sort;
mod source;
mod table;
mod ui;
mod view;

use controller::Controller;
use domain::{DEFAULT_ENDPOINT, DEFAULT_PAGE_SIZE, JVConfig, JVError, Message};
use filter::FilterMode;
use model::{Model, Status};
use ui::TableUI;

#[derive(Parser, Debug)]
#[command(version, about = "View a remote JSON collection as a table")]
struct Args {
    /// Endpoint returning a JSON array of objects
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    url: String,

    /// How filters are entered
    #[arg(short, long, value_enum, default_value_t = FilterMode::Columns)]
    mode: FilterMode,

    /// Rows per page
    #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Jump back to the first page whenever a filter changes
    #[arg(long)]
    reset_page_on_filter: bool,

    /// Write the rendered HTML page to this path ("-" for stdout) and exit
    #[arg(long)]
    html: Option<String>,

    /// Log file
    #[arg(long, default_value = "~/.jv.log")]
    log_file: String,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Err(e) => {
            error!("{e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn expand_path(path: &str) -> Result<PathBuf, JVError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| JVError::InvalidConfig(e.to_string()))
}

fn run(args: Args) -> Result<(), JVError> {
    logging::init(&expand_path(&args.log_file)?)?;

    let config = JVConfig::default()
        .with_endpoint(args.url)
        .with_filter_mode(args.mode)
        .with_page_size(args.page_size)
        .with_reset_page_on_filter(args.reset_page_on_filter)
        .with_event_poll_time(args.poll_ms)
        .validate()?;
    info!("Starting jv with {:?}", config);

    let runtime = Runtime::new()?;
    let client = reqwest::Client::new();

    match args.html {
        Some(target) => {
            let state = runtime.block_on(source::load(&client, &config.endpoint));
            let mut model = Model::init(&config, 0);
            model.update(Some(Message::Loaded(state)));
            let page = html::render_page(&model);
            if target == "-" {
                io::stdout().write_all(page.as_bytes())?;
            } else {
                let path = expand_path(&target)?;
                fs::write(&path, page)?;
                info!("Wrote {}", path.display());
            }
            Ok(())
        }
        None => {
            let (tx, rx) = oneshot::channel();
            let endpoint = config.endpoint.clone();
            runtime.spawn(async move {
                let state = source::load(&client, &endpoint).await;
                // The receiver is gone if the user quit before loading finished
                let _ = tx.send(state);
            });

            let mut terminal = ratatui::init();
            let result = run_tui(&config, rx, &mut terminal);
            ratatui::restore();
            result
        }
    }
}

fn run_tui(
    config: &JVConfig,
    rx: oneshot::Receiver<source::LoadState>,
    terminal: &mut ratatui::DefaultTerminal,
) -> Result<(), JVError> {
    let size = terminal.size()?;
    let mut model = Model::init(config, size.width as usize);
    let ui = TableUI::new(config);
    let mut controller = Controller::new(config, rx);

    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message);
    }
    Ok(())
}
