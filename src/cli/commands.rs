//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands, ThresholdArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::infrastructure::{InfraError, ServiceContainer};
use crate::tree_traits::LineageTreeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        Cli::command()
            .print_help()
            .map_err(|e| InfraError::io("print help", e))?;
        return Ok(());
    };

    match command {
        Commands::Completion { shell } => cmd_completion(*shell),
        Commands::Count {
            tree,
            meta,
            threshold,
            parallel,
            per_tree,
        } => cmd_count(
            &load_container(cli)?.0,
            tree.as_deref(),
            meta.as_deref(),
            threshold,
            *parallel,
            *per_tree,
        ),
        Commands::Tree {
            tree,
            meta,
            threshold,
        } => cmd_tree(&load_container(cli)?.0, tree, meta, threshold),
        Commands::Channels { meta } => cmd_channels(&load_container(cli)?.0, meta),
        Commands::Config { command } => {
            let (container, project_dir) = load_container(cli)?;
            cmd_config(&container, command, &project_dir)
        }
    }
}

/// Resolve the project directory and wire services from the merged settings.
fn load_container(cli: &Cli) -> CliResult<(ServiceContainer, PathBuf)> {
    let project_dir = resolve_project_dir(cli.project_dir.as_deref())?;
    let settings = Settings::load(Some(&project_dir))?;
    debug!("settings: {:?}", settings);
    Ok((ServiceContainer::new(settings), project_dir))
}

fn resolve_project_dir(project_dir: Option<&Path>) -> CliResult<PathBuf> {
    match project_dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => std::env::current_dir()
            .map_err(|e| InfraError::io("resolve current directory", e).into()),
    }
}

#[instrument(skip(container))]
fn cmd_count(
    container: &ServiceContainer,
    tree: Option<&Path>,
    meta: Option<&Path>,
    args: &ThresholdArgs,
    parallel: bool,
    per_tree: bool,
) -> CliResult<()> {
    let service = container.count_service();
    let options = service.options(args.threshold, args.channel.as_deref())?;
    let (tree, meta) = service.resolve_inputs(tree, meta)?;
    let parallel = parallel || container.settings.parallel;

    let report = service.count(&tree, &meta, &options, parallel)?;

    if per_tree {
        for phylogeny in &report.phylogenies {
            output::detail(&format!(
                "{}: {} of {} cells over {:.1}",
                phylogeny.name, phylogeny.above_threshold, phylogeny.visited, report.threshold
            ));
        }
    }
    if report.missing_channel() > 0 {
        output::warning(&format!(
            "{} cells have no '{}' channel and were not counted",
            report.missing_channel(),
            report.channel
        ));
    }
    output::info(&report);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tree(
    container: &ServiceContainer,
    tree: &Path,
    meta: &Path,
    args: &ThresholdArgs,
) -> CliResult<()> {
    let service = container.count_service();
    let options = service.options(args.threshold, args.channel.as_deref())?;
    let forest = service.load(tree, meta)?;
    output::info(&forest.to_tree_string(&options));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_channels(container: &ServiceContainer, meta: &Path) -> CliResult<()> {
    let document = container.loader().load_meta(meta)?;
    if document.channels.is_empty() {
        output::warning(&format!("no channels declared in {}", meta.display()));
    }
    for channel in &document.channels {
        output::info(channel);
    }
    Ok(())
}

fn cmd_config(
    container: &ServiceContainer,
    command: &ConfigCommands,
    project_dir: &Path,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::action("global", "unavailable (no home directory)"),
            }
            output::action("local", &local_config_path(project_dir).display());
            Ok(())
        }
        ConfigCommands::Init { global, force } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?
            } else {
                local_config_path(project_dir)
            };
            if container.fs.exists(&path) && !force {
                return Err(CliError::Usage(format!(
                    "config already exists: {} (use --force to overwrite)",
                    path.display()
                )));
            }
            container
                .fs
                .ensure_parent(&path)
                .map_err(|e| InfraError::io(format!("create directory for {}", path.display()), e))?;
            container
                .fs
                .write(&path, &Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("created {}", path.display()));
            Ok(())
        }
    }
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
