use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use extname::config::Config;
use extname::external_name::{
    ContextDocument, ExternalNameTable, IdentifierStrategy, ParameterBag, Registry,
    RegistryBuilder, ResolveContext, ResolveError, Resolver,
};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Exit code when the identifier is provider-assigned and not known yet
const EXIT_NOT_YET_KNOWN: u8 = 3;

/// Environment variable holding a `tracing` filter directive
const LOG_ENV: &str = "EXTNAME_LOG";

/// Resolve external names and remote identifiers for managed cloud resources
#[derive(Parser, Debug)]
#[command(name = "extname", version, about, long_about = None)]
struct Args {
    /// Provider region (setup.configuration.region)
    #[arg(long, global = true)]
    region: Option<String>,

    /// Account id (setup.client_metadata.account_id)
    #[arg(long, global = true)]
    account_id: Option<String>,

    /// Additional external name table (JSON or YAML); may be repeated
    #[arg(long = "table", global = true)]
    tables: Vec<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the remote identifier of a resource
    RemoteId {
        resource_type: String,
        /// External name currently known for the resource
        #[arg(short, long)]
        external_name: Option<String>,
        /// Desired parameters (JSON or YAML, `-` for stdin)
        #[arg(short, long)]
        params: Option<PathBuf>,
        /// Full context document; replaces --external-name and --params
        #[arg(long, conflicts_with_all = ["external_name", "params"])]
        context: Option<PathBuf>,
    },
    /// Compute the external name from observed remote state
    ExternalName {
        resource_type: String,
        /// Remote state (JSON or YAML, `-` for stdin)
        #[arg(short, long)]
        state: PathBuf,
    },
    /// Inject the external name into the parameters and print them
    Initialize {
        resource_type: String,
        #[arg(short, long)]
        external_name: String,
        /// Desired parameters (JSON or YAML, `-` for stdin)
        #[arg(short, long)]
        params: Option<PathBuf>,
    },
    /// Show the strategy configured for a resource type
    Show { resource_type: String },
    /// List resource types with a configured strategy
    List {
        /// Only list resource types containing this substring
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Persist --region and --account-id as defaults
    Configure,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    // EXTNAME_LOG replaces --log-level, e.g. `extname::external_name=trace`
    let filter = match (EnvFilter::try_from_env(LOG_ENV), level.to_tracing_level()) {
        (Ok(filter), _) => filter,
        (Err(_), Some(tracing_level)) => EnvFilter::new(tracing_level.as_str().to_lowercase()),
        (Err(_), None) => return None,
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: cannot open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("extname started with log level: {:?}", level);
    if std::env::var_os(LOG_ENV).is_some() {
        tracing::info!("Log filter taken from {}", LOG_ENV);
    }
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("extname").join("extname.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".extname").join("extname.log");
    }
    PathBuf::from("extname.log")
}

fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let deferred = err
                .downcast_ref::<ResolveError>()
                .is_some_and(ResolveError::is_not_yet_known);
            if deferred {
                ExitCode::from(EXIT_NOT_YET_KNOWN)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = Config::load();
    if let Some(region) = &args.region {
        config.region = Some(region.clone());
    }
    if let Some(account_id) = &args.account_id {
        config.account_id = Some(account_id.clone());
    }

    if let Command::Configure = args.command {
        return configure(&args, config);
    }

    let mut tables = config.tables.clone();
    tables.extend(args.tables.iter().cloned());
    let registry = load_registry(&tables)?;
    let resolver = Resolver::new(&registry);

    match args.command {
        Command::RemoteId {
            resource_type,
            external_name,
            params,
            context,
        } => {
            let document = match context {
                Some(path) => read_document::<ContextDocument>(&path)?,
                None => ContextDocument {
                    parameters: read_optional_bag(params.as_deref())?,
                    external_name: external_name.unwrap_or_default(),
                    ..Default::default()
                },
            };

            // Setup layers from the document win over configured defaults
            let mut configuration = config.setup_configuration();
            configuration.extend(document.setup.configuration.clone());
            let mut client_metadata = config.client_metadata();
            client_metadata.extend(document.setup.client_metadata.clone());

            let ctx = ResolveContext::new(&document.external_name, &document.parameters)
                .with_configuration(&configuration)
                .with_client_metadata(&client_metadata);

            println!("{}", resolver.resolve_remote_id(&resource_type, &ctx)?);
        }
        Command::ExternalName {
            resource_type,
            state,
        } => {
            let state: ParameterBag = read_document(&state)?;
            println!("{}", resolver.resolve_external_name(&resource_type, &state)?);
        }
        Command::Initialize {
            resource_type,
            external_name,
            params,
        } => {
            let mut bag = read_optional_bag(params.as_deref())?;
            resolver.initialize(&resource_type, &mut bag, &external_name)?;
            println!("{}", serde_json::to_string_pretty(&bag)?);
        }
        Command::Show { resource_type } => show(&resolver, &resource_type),
        Command::List { filter } => {
            for resource_type in registry.resource_types() {
                if filter.as_deref().map_or(true, |f| resource_type.contains(f)) {
                    println!("{}", resource_type);
                }
            }
        }
        Command::Configure => unreachable!("handled before the registry is loaded"),
    }

    Ok(())
}

fn configure(args: &Args, mut config: Config) -> Result<()> {
    if let Some(region) = &args.region {
        config.set_region(region)?;
    }
    if let Some(account_id) = &args.account_id {
        config.set_account_id(account_id)?;
    }

    let path = Config::config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    println!("config:     {}", path);
    println!("region:     {}", config.effective_region());
    println!(
        "account_id: {}",
        config.effective_account_id().unwrap_or_else(|| "-".to_string())
    );
    Ok(())
}

fn show(resolver: &Resolver<'_>, resource_type: &str) {
    let registered = resolver.registry().contains(resource_type);
    let strategy = resolver.strategy(resource_type);
    let fields = strategy.identifier_fields();

    println!("resource:     {}", resource_type);
    println!("registered:   {}", registered);
    println!("kind:         {}", strategy.kind());
    match strategy {
        IdentifierStrategy::TemplatedString { template, .. } => {
            println!("template:     {}", template.as_str());
            println!("embeds_name:  {}", template.references_external_name());
        }
        IdentifierStrategy::Custom(custom) => println!("custom:       {}", custom.name()),
        _ => {}
    }
    println!("user_defined: {}", strategy.name_is_user_defined());
    println!(
        "fields:       {}",
        if fields.is_empty() {
            "-".to_string()
        } else {
            fields.join(", ")
        }
    );
}

/// Built-in tables plus any extra table files
fn load_registry(tables: &[PathBuf]) -> Result<Registry> {
    let mut builder =
        RegistryBuilder::with_builtin().context("Failed to load built-in external name tables")?;

    for path in tables {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read table {}", path.display()))?;
        let table = if is_yaml(path) {
            ExternalNameTable::from_yaml(&content)
        } else {
            ExternalNameTable::from_json(&content)
        }
        .with_context(|| format!("Failed to parse table {}", path.display()))?;

        builder
            .load_table(table)
            .with_context(|| format!("Failed to load table {}", path.display()))?;
        tracing::info!("Loaded external name table {}", path.display());
    }

    Ok(builder.build())
}

fn read_optional_bag(path: Option<&Path>) -> Result<ParameterBag> {
    match path {
        Some(path) => read_document(path),
        None => Ok(ParameterBag::new()),
    }
}

/// Read a JSON or YAML document; `-` reads JSON from stdin
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read stdin")?;
        return serde_json::from_str(&content).context("Failed to parse JSON from stdin");
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if is_yaml(path) {
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    } else {
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
