use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use gldefs_preview::{
    locate_viewer, view, PreviewError, RewriteOptions, Session, ViewerConfig, DEFAULT_VIEWER,
};

/// Preview the hardware shaders of a GZDoom mod in an external shader viewer
#[derive(Parser, Debug)]
#[command(name = "gldefs-preview")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Mod directory containing GLDEFS lumps
    mod_path: PathBuf,

    /// 3D model to show texture shaders on
    #[arg(short, long, value_name = "PATH")]
    model: Option<PathBuf>,

    /// Shader viewer executable
    #[arg(long, value_name = "PATH", env = "GLDEFS_PREVIEW_VIEWER", default_value = DEFAULT_VIEWER)]
    viewer: PathBuf,

    /// Compatibility shim to include instead of the bundled one
    #[arg(long, value_name = "PATH")]
    shim: Option<PathBuf>,

    /// Preview this shader instead of asking
    #[arg(long, value_name = "NAME")]
    shader: Option<String>,

    /// List the shaders found and exit
    #[arg(long)]
    list: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .try_init();
}

/// Ask for a 1-based choice until a valid one is entered. `None` on an empty
/// line or end of input.
fn prompt_choice(count: usize) -> Result<Option<usize>> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("Shader to preview [1-{}]: ", count);
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => return Ok(None),
        };
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        match line.parse::<usize>() {
            Ok(choice) if (1..=count).contains(&choice) => return Ok(Some(choice - 1)),
            _ => println!("Please enter a number between 1 and {}.", count),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let viewer = match locate_viewer(&cli.viewer) {
        Ok(viewer) => viewer,
        Err(err) => {
            eprintln!("gldefs-preview: {}", err);
            std::process::exit(1);
        }
    };
    log::debug!("using viewer {}", viewer.display());

    let mut session = Session::load(&cli.mod_path)
        .with_context(|| format!("could not read mod directory {}", cli.mod_path.display()))?;

    if session.definitions.is_empty() {
        println!("No hardware shaders found in {}.", cli.mod_path.display());
        return Ok(());
    }

    if cli.list {
        for identifier in session.identifiers() {
            println!("{}", identifier);
        }
        return Ok(());
    }

    let selected = match &cli.shader {
        Some(name) => session
            .definitions
            .iter()
            .position(|d| d.identifier == name.to_lowercase())
            .with_context(|| format!("no shader is bound to {:?}", name))?,
        None => {
            for (i, identifier) in session.identifiers().enumerate() {
                println!("{:3}. {}", i + 1, identifier);
            }
            match prompt_choice(session.definitions.len())? {
                Some(selected) => selected,
                None => return Ok(()),
            }
        }
    };

    let rewrite_options = match cli.shim {
        Some(shim) => RewriteOptions::new(shim),
        None => RewriteOptions::with_bundled_shim()?,
    };
    let config = ViewerConfig::new(viewer);

    let definition = &mut session.definitions[selected];
    match view(definition, &rewrite_options, &config, cli.model.as_deref()) {
        Ok(_) => {}
        Err(err @ PreviewError::ProcessFailed { .. })
        | Err(err @ PreviewError::ProcessLaunch { .. }) => {
            eprintln!("gldefs-preview: viewer failed: {:#}", anyhow::Error::from(err));
        }
        Err(err) => {
            return Err(err).with_context(|| format!("could not preview {}", definition.identifier));
        }
    }

    Ok(())
}
