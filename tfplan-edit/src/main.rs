mod logging;

use anyhow::{bail, Result};
use clap::{ColorChoice, CommandFactory as _, Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tfplan::session::{self, Config};

fn main() {
    let args = Args::parse();
    handle_result(run_args(args));
}

fn run_args(args: Args) -> Result<()> {
    logging::set_up(&logging::Options {
        verbose: args.options.verbose,
        color: args.options.color,
    })?;

    match &args.command {
        Commands::Edit(subargs) => edit(subargs),
        Commands::Show { source } => {
            print!("{}", session::show_plan_file(source)?);
            Ok(())
        }
        Commands::GenerateMan => (|| {
            let cmd = Args::command();
            let man = clap_mangen::Man::new(cmd);
            let mut buffer: Vec<u8> = Default::default();
            man.render(&mut buffer)?;
            println!("{}", String::from_utf8(buffer)?);
            Ok(())
        })(),
        Commands::GenerateMarkdown => {
            let opts = clap_markdown::MarkdownOptions::new().show_footer(false);
            let markdown: String = clap_markdown::help_markdown_custom::<Args>(&opts);
            println!("{}", markdown);
            Ok(())
        }
        Commands::GenerateCompletion { shell } => {
            let mut cmd = Args::command();
            clap_complete::generate(*shell, &mut cmd, "tfplan-edit", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn edit(args: &EditArgs) -> Result<()> {
    let config = to_config(args)?;
    let destination = match (&args.destination, args.in_place) {
        (Some(destination), false) => destination,
        (None, true) => &args.source,
        _ => bail!("give either a destination or --in-place"),
    };
    session::edit_plan_file(&config, &args.source, destination)
}

/// The value editor defaults to the text editor.
fn to_config(args: &EditArgs) -> Result<Config> {
    let Some(text_editor) = args.editor.as_deref().filter(|e| !e.trim().is_empty()) else {
        bail!("you must set the editor with the '--editor' flag or set $EDITOR");
    };
    let value_editor = args
        .value_editor
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or(text_editor);
    Ok(Config {
        text_editor: text_editor.to_string(),
        value_editor: value_editor.to_string(),
        plan_only: args.plan_only,
    })
}

fn handle_result(r: Result<()>) {
    match r {
        Ok(()) => {}
        Err(e) => {
            eprintln!("tfplan-edit error: {}, {}", e.root_cause(), e);
            exit(1);
        }
    }
}

/// Edit Terraform plan files, including the dynamic values encoded in them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    options: Options,
}

#[derive(Parser, Debug, Clone)]
struct Options {
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,

    #[arg(long, global = true, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,
}

#[derive(Parser, Debug)]
struct EditArgs {
    /// The plan file to edit
    source: PathBuf,

    /// Where to write the edited plan file
    #[arg(required_unless_present = "in_place")]
    destination: Option<PathBuf>,

    /// Overwrite the source plan file
    #[arg(long, conflicts_with = "destination")]
    in_place: bool,

    /// The editor for the plan and the other files in the plan archive
    #[arg(long, env = "EDITOR")]
    editor: Option<String>,

    /// The editor for values whose type cannot be determined, shown as tagged
    /// JSON. Defaults to the editor.
    #[arg(long, visible_alias = "bin-editor")]
    value_editor: Option<String>,

    /// Only edit the plan, not the state and configuration stored with it
    #[arg(long)]
    plan_only: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Edit a plan file interactively
    #[command()]
    Edit(EditArgs),

    /// Print a plan file as it would be presented for editing
    Show {
        /// The plan file to show
        source: PathBuf,
    },

    /// Generate markdown documentation for tfplan-edit
    #[command(hide = true)]
    GenerateMarkdown,

    /// Generate a manpage for tfplan-edit
    #[command(hide = true)]
    GenerateMan,

    /// Generate shell completion for tfplan-edit
    #[command(hide = true)]
    GenerateCompletion {
        /// The shell to generate completion for
        #[arg(long)]
        shell: clap_complete::Shell,
    },
}
