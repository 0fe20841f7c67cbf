use color_eyre::eyre::{Result, WrapErr};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
};
use revtui::{App, AppConfig, DirectorySink, ProcessClient, logging, run_config_wizard};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Run our real async entrypoint
    let result = async_main().await;

    // Restore the terminal state
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

// Load or create the config, then hand over to the UI
async fn async_main() -> Result<()> {
    logging::init(&AppConfig::config_dir().join("revtui.log"))
        .wrap_err("Could not open the log file")?;

    let config = match AppConfig::load() {
        Some(cfg) => cfg,
        None => {
            // No config file found -> run the wizard
            let mut wiz_term = ratatui::init();
            let cfg = run_config_wizard(&mut wiz_term)?;
            ratatui::restore();
            match cfg {
                Some(cfg) => {
                    cfg.save().wrap_err("Could not save the config file")?;
                    cfg
                }
                // Aborted with <Esc>, nothing to do
                None => return Ok(()),
            }
        }
    };

    tracing::info!(server = %config.base_url(), "starting");
    let client = ProcessClient::new(&config.base_url());
    let mut sink = DirectorySink::new(config.download_dir.clone());

    let mut terminal = ratatui::init();
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let mut app = App::new();
    app.run(&mut terminal, &client, &mut sink).await?;

    tracing::info!("bye");
    Ok(())
}
