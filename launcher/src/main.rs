use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use guacview_keybinds::{Gsettings, KeyOverrideManager, RecoveryFile};
use std::io::BufReader;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use guacview::clipboard::SystemClipboard;
use guacview::config::{self, LauncherConfig};
use guacview::console;
use guacview::constants::WINDOW_TITLE;
use guacview::display::ExternalBrowser;
use guacview::events::{AppEvent, UiHandle};
use guacview::redirect::RedirectListener;
use guacview::session::SessionController;
use guacview::utils::command_exists;

/// Guacamole remote desktop launcher with fullscreen keybinding passthrough
#[derive(Parser, Debug)]
#[command(name = "guacview")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Authentication mode
    #[arg(long, value_enum, default_value = "app")]
    auth: AuthMode,

    /// Configuration file (defaults to ~/.config/guacview/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Display detailed diagnostic information
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Only one mode exists; the flag is kept so scripts can pin it
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum AuthMode {
    /// Log in inside the launcher window
    App,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Restore keybindings left disabled by a previous run, then exit
    Restore,
    /// Manage configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate and install shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: Shell,

        /// Print to stdout instead of installing
        #[arg(long)]
        print: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Display current configuration
    Show,
    /// Show configuration file path
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        None => run_launcher(cli.auth, cli.config.as_deref()),
        Some(Commands::Restore) => cmd_restore(cli.config.as_deref()),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => config::cmd_config_show(cli.config.as_deref()),
            ConfigCommands::Path => config::cmd_config_path(),
        },
        Some(Commands::Completions { shell, print }) => handle_completions_command(shell, print),
    }
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

/// Create the override manager; this repairs any earlier unclean exit
fn open_manager(config: &LauncherConfig) -> Result<KeyOverrideManager<Gsettings>> {
    let cache_dir = config.cache_dir()?;
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;

    if !command_exists(&config.gsettings_program.to_string_lossy()) {
        eprintln!(
            "{} {} not found; host shortcuts cannot be disabled or restored",
            "Warning:".yellow().bold(),
            config.gsettings_program.display()
        );
    }

    let manager = KeyOverrideManager::new(
        Gsettings::new(&config.gsettings_program),
        config.registry()?,
        RecoveryFile::new(config.recovery_file_path()?),
    );
    if manager.recovered_at_startup() {
        eprintln!(
            "{} Restored keybindings left disabled by a previous session",
            "Warning:".yellow().bold()
        );
    }
    Ok(manager)
}

fn run_launcher(auth: AuthMode, config_path: Option<&Path>) -> Result<()> {
    log::debug!("Authentication mode: {auth:?}");
    let config = LauncherConfig::load(config_path)?;

    let (app_tx, app_rx) = crossbeam_channel::unbounded::<AppEvent>();
    let ui = UiHandle::new(app_tx);

    // Before any key is touched: without the handler a signal would skip restore
    install_signal_handler(ui.clone())?;
    let manager = open_manager(&config)?;

    let mut session = SessionController::new(
        manager,
        ExternalBrowser::default(),
        SystemClipboard,
        ui.clone(),
    );

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, config.redirect_port));
    let listener = RedirectListener::bind(addr, &config.client_url_template, session.handoff())
        .with_context(|| format!("Failed to bind redirect listener on {addr}"))?;
    listener
        .spawn()
        .context("Failed to start redirect listener thread")?;

    console::spawn(BufReader::new(std::io::stdin()), ui).context("Failed to start console thread")?;

    log::info!("{WINDOW_TITLE} starting");
    eprintln!("Type 'help' for console commands.");
    session.start(&config.login_url);
    session.run(&app_rx);

    log::info!("Shutdown complete");
    Ok(())
}

/// Ctrl-C, SIGTERM and SIGHUP all end the UI loop so keys get restored
fn install_signal_handler(ui: UiHandle) -> Result<()> {
    ctrlc::set_handler(move || {
        log::info!("Received termination signal, shutting down...");
        ui.post(AppEvent::Shutdown);
    })
    .context("Failed to set signal handler")
}

fn cmd_restore(config_path: Option<&Path>) -> Result<()> {
    let config = LauncherConfig::load(config_path)?;
    let recovery_path = config.recovery_file_path()?;
    let manager = open_manager(&config)?;

    if manager.recovered_at_startup() {
        println!("{} Keybindings restored", "✓".green());
    } else if manager.recovery_file().exists() {
        anyhow::bail!(
            "Recovery file {} could not be applied; inspect it and restore keys manually",
            recovery_path.display()
        );
    } else {
        println!("{} Nothing to restore", "✓".green());
    }
    Ok(())
}

fn install_completions(shell: Shell) -> Result<()> {
    let (completions_dir, filename) = match shell {
        Shell::Bash => {
            let data_dir = dirs::data_dir().context("Could not determine XDG_DATA_HOME")?;
            (data_dir.join("bash-completion/completions"), "guacview")
        }
        Shell::Zsh => {
            let data_dir = dirs::data_dir().context("Could not determine XDG_DATA_HOME")?;
            (data_dir.join("zsh/completions"), "_guacview")
        }
        Shell::Fish => {
            let config_dir = dirs::config_dir().context("Could not determine XDG_CONFIG_HOME")?;
            (config_dir.join("fish/completions"), "guacview.fish")
        }
        _ => {
            anyhow::bail!(
                "Auto-install not supported for {shell:?}. Use --print to output to stdout."
            );
        }
    };

    std::fs::create_dir_all(&completions_dir)?;

    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut Cli::command(), "guacview", &mut buf);

    let file_path = completions_dir.join(filename);
    std::fs::write(&file_path, &buf)
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    println!(
        "{} Installed {} completions to {}",
        "✓".green(),
        format!("{shell:?}").to_lowercase(),
        file_path.display()
    );
    Ok(())
}

fn handle_completions_command(shell: Shell, print: bool) -> Result<()> {
    if print {
        clap_complete::generate(
            shell,
            &mut Cli::command(),
            "guacview",
            &mut std::io::stdout(),
        );
    } else {
        install_completions(shell)?;
    }
    Ok(())
}
