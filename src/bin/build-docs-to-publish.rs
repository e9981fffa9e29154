//! Build every documentation version in the version list and lay the results
//! out for publication.
//!
//! Run from the documentation directory (the one holding the Makefile):
//!
//! ```bash
//! build-docs-to-publish --site-root https://example.org/docs
//! build-docs-to-publish --site-root /var/www/docs -d --container-cli-tool docker
//! ```

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use doc_builder::config::{
    resolve_path, validate_publish_dir, validate_site_root, DocSourceLayout, DEFAULT_PUBLISH_DIR,
    DEFAULT_REPO_ROOT,
};
use doc_builder::container::ContainerToolPolicy;
use doc_builder::{
    preflight, ArtifactPublisher, BuildInvoker, ExternalGenerator, FailurePolicy,
    GitWorkingCopy, Orchestrator, SharedBuildOptions, VersionCatalog,
};

#[derive(Parser, Debug)]
#[command(
    name = "build-docs-to-publish",
    about = "Build all versions of the documentation and arrange them for publishing",
    version
)]
struct CliArgs {
    /// Directory the generator builds into.
    #[arg(short = 'r', long, value_name = "DIR", default_value = DEFAULT_REPO_ROOT)]
    repo_root: PathBuf,

    /// URL or absolute path of the directory holding the top-level index.html.
    #[arg(long, value_name = "URL_OR_PATH")]
    site_root: String,

    /// Path to conf.py, or the directory containing it.
    #[arg(long, value_name = "PATH")]
    conf_py_path: Option<PathBuf>,

    /// Static assets directory, relative to conf.py's directory.
    #[arg(long, value_name = "PATH")]
    static_path: Option<PathBuf>,

    /// Templates directory, relative to conf.py's directory.
    #[arg(long, value_name = "PATH")]
    templates_path: Option<PathBuf>,

    /// Run the generator inside a container.
    #[arg(short = 'd', long)]
    build_with_container: bool,

    /// Container CLI to use; implies --build-with-container.
    #[arg(long, value_name = "TOOL", value_parser = ["docker", "podman"])]
    container_cli_tool: Option<String>,

    /// Where built versions are moved for publication.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_PUBLISH_DIR)]
    publish_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging()?;
    run(args)
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("parsing log filter")?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("initializing tracing: {}", e))
}

fn run(args: CliArgs) -> Result<()> {
    preflight::check_host_tools()?;
    validate_site_root(&args.site_root)?;

    let cwd = env::current_dir()
        .and_then(|dir| dir.canonicalize())
        .context("reading current directory")?;
    let repo_root = resolve_path(&cwd, &args.repo_root);
    let publish_root = resolve_path(&cwd, &args.publish_dir);
    validate_publish_dir(&publish_root, &repo_root)?;

    let mut layout = DocSourceLayout::new(&cwd);
    if let Some(conf) = &args.conf_py_path {
        layout = layout.with_conf_path(conf);
    }
    layout.static_path = args.static_path.clone();
    layout.templates_path = args.templates_path.clone();

    let catalog = VersionCatalog::load(&layout.version_list)?;

    let mut options = SharedBuildOptions {
        repo_root,
        site_root: args.site_root,
        conf_path: args.conf_py_path,
        static_path: args.static_path,
        templates_path: args.templates_path,
        clean: true,
        build_with_container: args.build_with_container,
        container_tool: None,
    };
    let container_policy = ContainerToolPolicy::for_host();
    options
        .apply_container_policy(&container_policy, args.container_cli_tool.as_deref())
        .context("selecting container tool")?;

    let vcs = GitWorkingCopy::discover(&cwd)
        .with_context(|| format!("'{}' is not inside a git working copy", cwd.display()))?;
    let generator = ExternalGenerator::locate(&cwd)?;

    info!(
        versions = catalog.len(),
        canonical_ref = catalog.canonical_ref(),
        root = %vcs.root().display(),
        "starting documentation build"
    );

    let report = Orchestrator::new(
        &vcs,
        layout,
        BuildInvoker::new(options, generator),
        ArtifactPublisher::new(&publish_root),
    )
    .with_policy(FailurePolicy::HaltOnFirstError)
    .with_container_policy(container_policy)
    .run(catalog)
    .context("building documentation versions")?;

    println!(
        "[docs] published {} version(s) to {}",
        report.published().count(),
        publish_root.display()
    );
    Ok(())
}
