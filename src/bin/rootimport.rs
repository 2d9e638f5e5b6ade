use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use is_terminal::IsTerminal;
use rayon::prelude::*;
use rootimport::{
    FileReport, ParserSet, ProjectOptions, ResolverConfig, ResolvingVisitor, SourceKind,
    SpecifierResolver, importing_dir, rewrite_source,
};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "rootimport", version, about = "Rewrite import specifiers into root-absolute, extension-complete form")]
struct Args {
    /// Project root (directory holding node_modules, imports, tsconfig.json)
    #[arg(long = "root", global = true, default_value = ".")]
    root: PathBuf,

    /// Output format (json or yaml)
    #[arg(short = 'f', long = "format", global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Directory indexed for .ts/.tsx files (env: ROOTIMPORT_IMPORTS_DIR)
    #[arg(long = "imports-dir", global = true)]
    imports_dir: Option<String>,

    /// Dependency installation directory (env: ROOTIMPORT_DEPS_DIR)
    #[arg(long = "deps-dir", global = true)]
    deps_dir: Option<String>,

    /// Alias configuration file, relative to root (env: ROOTIMPORT_TSCONFIG)
    #[arg(long = "tsconfig", global = true)]
    tsconfig: Option<String>,

    /// Specifier prefix of host packages, never rewritten (env: ROOTIMPORT_RESERVED_PREFIX)
    #[arg(long = "reserved-prefix", global = true)]
    reserved_prefix: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rewrite specifiers in files (all sources under root when none given)
    Rewrite {
        paths: Vec<PathBuf>,
        /// Save rewritten files in place
        #[arg(long = "write", default_value_t = false)]
        write: bool,
        /// Exit with an error when any file would change
        #[arg(long = "check", default_value_t = false)]
        check: bool,
        /// Exit with an error when any specifier fails to resolve
        #[arg(long = "strict", default_value_t = false)]
        strict: bool,
    },
    /// Rewrite source read from stdin and print it
    Transform {
        /// Path the source belongs to (selects grammar and context)
        #[arg(long = "path")]
        path: PathBuf,
    },
    /// Resolve a single specifier
    Resolve {
        specifier: String,
        /// Project-relative directory of the importing file
        #[arg(long = "from", default_value = "")]
        from: String,
    },
    /// Show the scanned project context
    Context,
    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize logger once; default level comes from RUST_LOG
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(""))
        .format_timestamp(None)
        .try_init();
    let args = Args::parse();
    let opts = project_options(&args);

    match args.cmd {
        Command::Rewrite { paths, write, check, strict } => {
            run_rewrite(args.format, &opts, &paths, write, check, strict)
        }
        Command::Transform { path } => run_transform(&opts, &path),
        Command::Resolve { specifier, from } => run_resolve(args.format, &opts, &specifier, &from),
        Command::Context => run_context(args.format, &opts),
        Command::Completions { shell } => {
            let mut cmd = Args::command();
            clap_complete::generate(shell, &mut cmd, "rootimport", &mut io::stdout());
            Ok(())
        }
    }
}

fn project_options(args: &Args) -> ProjectOptions {
    let mut opts = ProjectOptions::from_env(&args.root);
    if let Some(v) = &args.imports_dir {
        opts.imports_dir = v.clone();
    }
    if let Some(v) = &args.deps_dir {
        opts.deps_dir = v.clone();
    }
    if let Some(v) = &args.tsconfig {
        opts.tsconfig = v.clone();
    }
    if let Some(v) = &args.reserved_prefix {
        opts.reserved_prefix = v.clone();
    }
    opts
}

fn print_output<T: Serialize>(fmt: OutputFormat, value: &T) -> anyhow::Result<()> {
    match fmt {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

/// Supported sources under `root`, skipping dependency directories at any depth
/// and dot entries.
fn discover_sources(root: &Path, deps_dir: &str) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            let name = e.file_name().to_str().unwrap_or("");
            !(name.starts_with('.') || name == deps_dir)
        })
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && SourceKind::from_path(e.path()).is_some())
        .map(|e| e.into_path())
        .collect()
}

struct FileOutcome {
    path: PathBuf,
    report: FileReport,
    rewritten: Option<String>,
}

/// Canonical form of `p`. A path that does not exist yet is anchored on its
/// canonical parent directory.
fn absolute_path(p: &Path) -> anyhow::Result<PathBuf> {
    if let Ok(canon) = fs::canonicalize(p) {
        return Ok(canon);
    }
    let abs = if p.is_absolute() { p.to_path_buf() } else { std::env::current_dir()?.join(p) };
    if let (Some(dir), Some(name)) = (abs.parent(), abs.file_name())
        && let Ok(dir) = fs::canonicalize(dir)
    {
        return Ok(dir.join(name));
    }
    Ok(abs)
}

/// `None` when a discovered file cannot be read; named files must be readable.
fn rewrite_file(
    parsers: &mut ParserSet,
    resolver: &SpecifierResolver<'_>,
    root: &Path,
    path: &Path,
    discovered: bool,
) -> anyhow::Result<Option<FileOutcome>> {
    let kind = SourceKind::from_path(path)
        .ok_or_else(|| anyhow::anyhow!("unsupported source file: {}", path.display()))?;
    let src = match fs::read_to_string(path) {
        Ok(src) => src,
        Err(err) if discovered => {
            log::warn!("skip unreadable source {}: {}", path.display(), err);
            return Ok(None);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("read source: {}", path.display()));
        }
    };
    let context = importing_dir(root, path);
    let display = path.strip_prefix(root).unwrap_or(path).to_string_lossy().replace('\\', "/");
    let mut visitor = ResolvingVisitor::new(resolver, display);
    let rewritten = rewrite_source(parsers.get(kind)?, &src, &context, &mut visitor)
        .with_context(|| format!("parse source: {}", path.display()))?;
    Ok(Some(FileOutcome { path: path.to_path_buf(), report: visitor.into_report(), rewritten }))
}

fn run_rewrite(
    fmt: OutputFormat,
    opts: &ProjectOptions,
    paths: &[PathBuf],
    write: bool,
    check: bool,
    strict: bool,
) -> anyhow::Result<()> {
    let config: ResolverConfig = opts.load()?;
    let resolver = SpecifierResolver::new(&config);
    let root = fs::canonicalize(&opts.root)
        .with_context(|| format!("resolve root: {}", opts.root.display()))?;
    let discovered = paths.is_empty();
    let files = if discovered {
        discover_sources(&root, &opts.deps_dir)
    } else {
        paths.iter().map(|p| absolute_path(p)).collect::<anyhow::Result<Vec<_>>>()?
    };
    log::info!("mode=rewrite files={} write={} check={} strict={}", files.len(), write, check, strict);

    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map_init(ParserSet::new, |parsers, path| {
            rewrite_file(parsers, &resolver, &root, path, discovered)
        })
        .collect::<anyhow::Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();

    let reports: Vec<&FileReport> =
        outcomes.iter().map(|o| &o.report).filter(|r| !r.is_clean()).collect();
    print_output(fmt, &reports)?;

    let failures: usize = outcomes.iter().map(|o| o.report.failures.len()).sum();
    if strict && failures > 0 {
        anyhow::bail!("{} specifier(s) could not be resolved", failures);
    }
    let changed: Vec<&FileOutcome> = outcomes.iter().filter(|o| o.rewritten.is_some()).collect();
    if write {
        for o in &changed {
            if let Some(text) = &o.rewritten {
                fs::write(&o.path, text).with_context(|| format!("write source: {}", o.path.display()))?;
            }
        }
        eprintln!("rewrote {} file(s)", changed.len());
    } else if check && !changed.is_empty() {
        anyhow::bail!("{} file(s) need rewriting", changed.len());
    }
    Ok(())
}

fn run_transform(opts: &ProjectOptions, path: &Path) -> anyhow::Result<()> {
    if io::stdin().is_terminal() {
        anyhow::bail!("no stdin detected: please pipe source text into rootimport transform");
    }
    let mut src = String::new();
    io::stdin().read_to_string(&mut src)?;
    let kind = SourceKind::from_path(path)
        .ok_or_else(|| anyhow::anyhow!("unsupported source file: {}", path.display()))?;
    let config = opts.load()?;
    let resolver = SpecifierResolver::new(&config);
    let mut parsers = ParserSet::new();
    let root = fs::canonicalize(&opts.root)
        .with_context(|| format!("resolve root: {}", opts.root.display()))?;
    let context = importing_dir(&root, &absolute_path(path)?);
    let mut visitor = ResolvingVisitor::new(&resolver, path.to_string_lossy());
    let out = rewrite_source(parsers.get(kind)?, &src, &context, &mut visitor)?;
    io::stdout().write_all(out.as_deref().unwrap_or(&src).as_bytes())?;
    Ok(())
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    input: &'a str,
    context: &'a str,
    #[serde(flatten)]
    resolution: rootimport::Resolution,
}

fn run_resolve(fmt: OutputFormat, opts: &ProjectOptions, specifier: &str, from: &str) -> anyhow::Result<()> {
    let config = opts.load()?;
    let resolution = SpecifierResolver::new(&config).resolve(specifier, from)?;
    print_output(fmt, &ResolveOutput { input: specifier, context: from, resolution })
}

fn run_context(fmt: OutputFormat, opts: &ProjectOptions) -> anyhow::Result<()> {
    let config = opts.load()?;
    print_output(fmt, &config)
}
