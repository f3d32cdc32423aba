use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use tapestry::{
    Application, ClassDef, ClientDataEncoder, ComponentClass, Settings,
    form::action_stream::ActionReader, workers::default_pipeline,
};

#[derive(Parser, Debug)]
#[command(name = "tapestry", version)]
struct Cli {
    /// Settings JSON; defaults apply when omitted.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transform class descriptions and print their component models.
    Model(ModelArgs),
    /// Print the transformation workers in the order they run.
    Pipeline,
    /// Decode a form data action stream and print its entries.
    Formdata(FormdataArgs),
}

#[derive(Parser, Debug)]
struct ModelArgs {
    /// Class description JSON files; superclasses must be listed too.
    #[arg(long = "in", required = true, num_args = 1..)]
    in_paths: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct FormdataArgs {
    /// Encoded value of the form data field.
    #[arg(long)]
    data: String,

    /// HMAC passphrase; overrides the one from the settings file.
    #[arg(long)]
    passphrase: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = match &cli.settings {
        Some(path) => Settings::from_path(path)?,
        None => Settings::default(),
    };
    match cli.cmd {
        Command::Model(args) => cmd_model(settings, args),
        Command::Pipeline => cmd_pipeline(),
        Command::Formdata(args) => cmd_formdata(settings, args),
    }
}

fn cmd_model(settings: Settings, args: ModelArgs) -> anyhow::Result<()> {
    let mut names = Vec::with_capacity(args.in_paths.len());
    let mut builder = Application::builder().settings(settings);
    for path in &args.in_paths {
        let def = ClassDef::from_path(path)
            .with_context(|| format!("load class description '{}'", path.display()))?;
        names.push(def.name.clone());
        builder = builder.class(ComponentClass::descriptive(def));
    }
    let app = builder.build()?;
    for name in names {
        let model = app
            .model(&name)
            .with_context(|| format!("transform class '{name}'"))?;
        println!("{}", model.to_json_pretty()?);
    }
    Ok(())
}

fn cmd_pipeline() -> anyhow::Result<()> {
    let pipeline = default_pipeline()?;
    for (i, name) in pipeline.worker_names().into_iter().enumerate() {
        println!("{:>2} {name}", i + 1);
    }
    Ok(())
}

fn cmd_formdata(settings: Settings, args: FormdataArgs) -> anyhow::Result<()> {
    let passphrase = args.passphrase.or(settings.hmac_passphrase);
    let encoder = ClientDataEncoder::new(passphrase.as_deref());
    let bytes = encoder
        .decode(args.data.trim())
        .context("decode form data")?;
    let entries = ActionReader::new(&bytes).read_all()?;
    for entry in entries {
        println!(
            "{} {}",
            entry.component_id,
            serde_json::to_string(&entry.action).context("serialize action")?
        );
    }
    Ok(())
}
