use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use gitlet_rs::commands;
use gitlet_rs::objects::Store;
use gitlet_rs::state::Repo;

#[derive(Debug, Parser)]
#[command(name = "gitlet")]
#[command(about = "A miniature content-addressed version-control system", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a new repository in the current directory (or the given one).
    Init { repo_dir: Option<String> },

    /// Stage a file for the next commit.
    Add { filepath: PathBuf },

    /// Stage a tracked file for removal.
    Rm { filepath: PathBuf },

    /// Record a new commit from the staged changes.
    Commit { message: String },

    /// First-parent history starting at HEAD.
    Log,

    /// Every commit in the object store, in unspecified order.
    #[command(name = "global-log")]
    GlobalLog,

    /// Print the hashes of commits with the given exact message.
    Find { message: String },

    /// Branches, staged/removed files, unstaged modifications, untracked files.
    Status,

    /// `-- <file>`, `<commit> -- <file>`, or `<branch>`.
    #[command(trailing_var_arg = true, allow_hyphen_values = true)]
    Checkout { args: Vec<String> },

    /// Create a new branch pointing at HEAD.
    Branch { name: String },

    /// Delete a branch (refusing the currently checked-out one).
    #[command(name = "rm-branch")]
    RmBranch { name: String },

    /// Move the current branch's tip to the given commit.
    Reset { commit: String },

    /// Merge the given branch into the current one.
    Merge { branch: String },

    /// Register a remote repository directory under a name.
    #[command(name = "add-remote")]
    AddRemote { name: String, path: String },

    /// Forget a registered remote.
    #[command(name = "rm-remote")]
    RmRemote { name: String },

    /// Push the local branch's tip to a remote, if it fast-forwards.
    Push { remote: String, branch: String },

    /// Fetch a remote branch into a local remote-tracking branch.
    Fetch { remote: String, branch: String },

    /// Fetch then merge a remote branch.
    Pull { remote: String, branch: String },
}

fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("GITLET_LOG"))
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let args = Cli::parse();

    if let Commands::Init { repo_dir } = &args.command {
        return commands::init(repo_dir.clone());
    }

    let repo = Repo::discover()?;
    let store = Store::new(repo.gitlet_dir());

    match args.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Add { filepath } => commands::add(&repo, &store, relative(&repo, &filepath)?),
        Commands::Rm { filepath } => commands::rm(&repo, &store, relative(&repo, &filepath)?),
        Commands::Commit { message } => commands::commit(&repo, &store, message),
        Commands::Log => commands::log(&repo, &store),
        Commands::GlobalLog => commands::global_log(&store),
        Commands::Find { message } => commands::find(&store, &message),
        Commands::Status => commands::status(&repo, &store),
        Commands::Checkout { args } => dispatch_checkout(&repo, &store, &args),
        Commands::Branch { name } => commands::branch(&repo, &name),
        Commands::RmBranch { name } => commands::rm_branch(&repo, &name),
        Commands::Reset { commit } => commands::reset(&repo, &store, &commit),
        Commands::Merge { branch } => commands::merge_branch(&repo, &store, &branch),
        Commands::AddRemote { name, path } => commands::add_remote(&repo, &name, &path),
        Commands::RmRemote { name } => commands::rm_remote(&repo, &name),
        Commands::Push { remote, branch } => commands::push(&repo, &store, &remote, &branch),
        Commands::Fetch { remote, branch } => commands::fetch(&repo, &remote, &branch),
        Commands::Pull { remote, branch } => commands::pull(&repo, &store, &remote, &branch),
    }
}

/// `filepath` may be given as an absolute path or one relative to the
/// caller's cwd; repository operations want it relative to `repo.root`.
fn relative<'a>(repo: &Repo, filepath: &'a Path) -> anyhow::Result<&'a Path> {
    if filepath.is_relative() {
        return Ok(filepath);
    }
    filepath
        .strip_prefix(&repo.root)
        .map_err(|_| anyhow::anyhow!("path is outside the repository"))
}

/// `checkout` has three forms distinguished by arity and a literal `--`
/// separator (spec.md §4.8); clap's derive doesn't model that union well, so
/// it's parsed by hand from the raw trailing args.
fn dispatch_checkout(repo: &Repo, store: &Store, args: &[String]) -> anyhow::Result<()> {
    match args {
        [dash, file] if dash == "--" => {
            commands::checkout_file_from_head(repo, store, Path::new(file))
        }
        [commit, dash, file] if dash == "--" => {
            commands::checkout_file_from_commit(repo, store, commit, Path::new(file))
        }
        [branch] => commands::checkout_branch(repo, store, branch),
        _ => Err(gitlet_rs::error::GitletError::BadArgs.into()),
    }
}

fn main() {
    if let Err(err) = run() {
        println!("{err}");
    }
}
