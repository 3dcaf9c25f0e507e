//! Launching the external shader viewer.
//!
//! The viewer is invoked as
//!
//! ```text
//! <viewer> -vFlip <generated.frag> <texture> [<aux texture>...] [<model>] [-D<name>,<value>...]
//! ```
//!
//! and waited on. There is no timeout: a viewer that never exits blocks the
//! calling thread.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::{rewrite, PreviewError, RewriteOptions, ShaderDefinition, ShaderKind};

pub const DEFAULT_VIEWER: &str = "glslViewer";
pub const FLIP_FLAG: &str = "-vFlip";

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub executable: PathBuf,

    /// Environment overrides for the viewer process only
    pub env: Vec<(OsString, OsString)>,
}

impl ViewerConfig {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        ViewerConfig {
            executable: executable.into(),
            env: vec![("MESA_GL_VERSION_OVERRIDE".into(), "3.3".into())],
        }
    }

    pub fn with_env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        let key = key.into();
        self.env.retain(|(existing, _)| *existing != key);
        self.env.push((key, value.into()));
        self
    }
}

fn executable_candidates(name: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![name.to_path_buf()];
    if !std::env::consts::EXE_SUFFIX.is_empty() && name.extension().is_none() {
        let mut with_suffix = name.as_os_str().to_owned();
        with_suffix.push(std::env::consts::EXE_SUFFIX);
        candidates.push(PathBuf::from(with_suffix));
    }
    candidates
}

/// Find the viewer: `name` as given (relative to the current directory),
/// then in each directory of `PATH`.
pub fn locate_viewer(name: impl AsRef<Path>) -> Result<PathBuf, PreviewError> {
    let name = name.as_ref();

    if let Some(found) = executable_candidates(name).into_iter().find(|c| c.is_file()) {
        return Ok(found);
    }

    if name.components().count() == 1 {
        if let Some(path) = std::env::var_os("PATH") {
            for dir in std::env::split_paths(&path) {
                if let Some(found) = executable_candidates(&dir.join(name))
                    .into_iter()
                    .find(|c| c.is_file())
                {
                    return Ok(found);
                }
            }
        }
    }

    Err(PreviewError::ExternalToolMissing {
        name: name.display().to_string(),
    })
}

/// Assemble the viewer's argument vector, executable first.
///
/// The model is only passed for texture shaders. `definition` must have been
/// rewritten already.
pub fn build_args(
    definition: &ShaderDefinition,
    viewer: &Path,
    model: Option<&Path>,
) -> Result<Vec<OsString>, PreviewError> {
    let generated = definition
        .generated_shader()
        .ok_or_else(|| PreviewError::NotRewritten {
            identifier: definition.identifier.clone(),
        })?;

    let mut args: Vec<OsString> = vec![
        viewer.into(),
        FLIP_FLAG.into(),
        generated.into(),
        definition.texture.as_os_str().into(),
    ];

    args.extend(definition.textures.iter().map(|(_, path)| path.into()));

    if let Some(model) = model {
        if definition.kind != ShaderKind::PostProcess {
            args.push(model.into());
        }
    }

    args.extend(
        definition
            .defines
            .iter()
            .map(|(name, value)| format!("-D{},{}", name, value).into()),
    );

    Ok(args)
}

/// Run the viewer described by `args` (as built by [`build_args`]) and wait
/// for it to exit. `args` must start with the program to run.
pub fn invoke(args: &[OsString], config: &ViewerConfig) -> Result<ExitStatus, PreviewError> {
    let (program, rest) = args
        .split_first()
        .ok_or_else(|| PreviewError::ProcessLaunch {
            program: config.executable.clone(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "empty argument list"),
        })?;

    log::info!(
        "running {}",
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let status = Command::new(program)
        .args(rest)
        .envs(config.env.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str())))
        .status()
        .map_err(|source| PreviewError::ProcessLaunch {
            program: PathBuf::from(program),
            source,
        })?;

    if status.success() {
        Ok(status)
    } else {
        Err(PreviewError::ProcessFailed {
            program: PathBuf::from(program),
            status,
        })
    }
}

/// Rewrite `definition`, show it in the viewer and remove the generated
/// shader again, whether or not the viewer succeeded.
pub fn view(
    definition: &mut ShaderDefinition,
    rewrite_options: &RewriteOptions,
    config: &ViewerConfig,
    model: Option<&Path>,
) -> Result<ExitStatus, PreviewError> {
    let result = rewrite_and_invoke(definition, rewrite_options, config, model);
    definition.cleanup();
    result
}

fn rewrite_and_invoke(
    definition: &mut ShaderDefinition,
    rewrite_options: &RewriteOptions,
    config: &ViewerConfig,
    model: Option<&Path>,
) -> Result<ExitStatus, PreviewError> {
    rewrite(definition, rewrite_options)?;
    let args = build_args(definition, &config.executable, model)?;
    invoke(&args, config)
}
