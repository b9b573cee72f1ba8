//! i18n-cache 命令行入口

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use i18n_cache::env::{self, EnvVar};
use i18n_cache::i18n::config::constants;
use i18n_cache::i18n::core::chain_for;
use i18n_cache::network::{HttpResourceClient, MissingKeyBeacon};
use i18n_cache::{
    Bundle, Clock, ConfigManager, FallbackResolver, I18nConfig, I18nError, I18nResult,
    KeyValueStore, Language, LanguagePreferenceStore, LanguageSwitcher, MissingKeyReporter,
    NamespaceLoader, RedbStore, ResourceCache, ResourceFetcher, StaticFetcher, SwitchOutcome,
    SystemClock, TranslationEngine,
};

#[derive(Debug, Parser)]
#[command(
    name = "i18n-cache",
    about = "Inspect and drive the translation bundle cache",
    version
)]
struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<String>,

    /// On-disk store, overrides the configured storage path
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print cache usage as JSON.
    Stats,

    /// Remove cached bundles.
    Clear(ClearArgs),

    /// Load namespaces into the cache.
    Fetch(FetchArgs),

    /// Resolve a key through the fallback chain.
    Resolve(ResolveArgs),

    /// Switch the active language and persist the preference.
    Switch(SwitchArgs),

    /// Read or change the stored language preference.
    #[command(subcommand)]
    Preference(PreferenceCommand),

    /// Flatten a JSON file and bulk-import it.
    Import(ImportArgs),

    /// Print the supported environment variables.
    #[command(name = "env-docs")]
    EnvDocs,

    /// Write an example configuration file.
    #[command(name = "init-config")]
    InitConfig { path: String },
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Read bundles from `{dir}/{lang}/{namespace}.json` instead of the API
    #[arg(long)]
    from_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ClearArgs {
    /// Only remove expired entries
    #[arg(long)]
    expired: bool,
}

#[derive(Debug, Args)]
struct FetchArgs {
    #[arg(long)]
    lang: String,

    /// Namespaces to load; defaults to the common set
    #[arg(long = "namespace", short = 'n')]
    namespaces: Vec<String>,

    /// Load the namespaces of a role instead
    #[arg(long, conflicts_with = "namespaces")]
    role: Option<String>,

    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Debug, Args)]
struct ResolveArgs {
    key: String,

    #[arg(long)]
    lang: String,

    #[arg(long)]
    default: Option<String>,

    /// Interpolation parameter `name=value`
    #[arg(long = "param", short = 'p', value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Extra namespaces to load before resolving
    #[arg(long = "namespace", short = 'n')]
    namespaces: Vec<String>,

    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Debug, Args)]
struct SwitchArgs {
    lang: String,

    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Debug, Subcommand)]
enum PreferenceCommand {
    /// Print the stored language, if any.
    Get,
    /// Store a language.
    Set { lang: String },
    /// Remove the stored language.
    Clear,
}

#[derive(Debug, Args)]
struct ImportArgs {
    file: PathBuf,

    #[arg(long)]
    lang: String,

    #[arg(long, default_value = constants::DEFAULT_NAMESPACE)]
    namespace: String,

    /// Print the request body instead of sending it
    #[arg(long)]
    dry_run: bool,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))
}

/// 命令运行时共享的组件
struct Context {
    config: I18nConfig,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl Context {
    fn open(cli: &Cli) -> I18nResult<Self> {
        let manager = match &cli.config {
            Some(path) => ConfigManager::from_path(path)?,
            None => ConfigManager::new()?,
        };
        let config = manager.into_config();

        let path = match &cli.store {
            Some(path) => path.clone(),
            None => PathBuf::from(config.resolved_storage_path()),
        };
        let store: Arc<dyn KeyValueStore> = Arc::new(RedbStore::open(&path)?);

        Ok(Self {
            config,
            store,
            clock: Arc::new(SystemClock),
        })
    }

    fn cache(&self) -> Arc<ResourceCache> {
        Arc::new(ResourceCache::new(
            self.store.clone(),
            self.clock.clone(),
            self.config.cache_options(),
        ))
    }

    fn preferences(&self) -> Arc<LanguagePreferenceStore> {
        Arc::new(LanguagePreferenceStore::with_expiry(
            self.store.clone(),
            self.clock.clone(),
            self.config.preference_expiry(),
        ))
    }

    fn client(&self) -> I18nResult<Arc<HttpResourceClient>> {
        Ok(Arc::new(HttpResourceClient::from_config(&self.config)?))
    }

    fn fetcher(&self, source: &SourceArgs) -> I18nResult<Arc<dyn ResourceFetcher>> {
        match &source.from_dir {
            Some(dir) => Ok(Arc::new(StaticFetcher::from_dir(dir)?)),
            None => Ok(self.client()?),
        }
    }

    fn loader(&self, language: Language, fetcher: Arc<dyn ResourceFetcher>) -> Arc<NamespaceLoader> {
        Arc::new(NamespaceLoader::new(
            Arc::new(TranslationEngine::new(language)),
            self.cache(),
            fetcher,
        ))
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> I18nResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> I18nResult<()> {
    match &cli.command {
        Commands::EnvDocs => {
            print!("{}", env::generate_env_docs());
            return Ok(());
        }
        Commands::InitConfig { path } => {
            ConfigManager::generate_example_config(path)?;
            println!("{}", path);
            return Ok(());
        }
        _ => {}
    }

    let context = Context::open(&cli)?;

    match cli.command {
        Commands::Stats => print_json(&context.cache().stats()),
        Commands::Clear(args) => {
            let cache = context.cache();
            let removed = if args.expired {
                cache.cleanup_expired()
            } else {
                cache.invalidate_all()
            };
            println!("{}", removed);
            Ok(())
        }
        Commands::Fetch(args) => run_fetch(&context, args).await,
        Commands::Resolve(args) => run_resolve(&context, args).await,
        Commands::Switch(args) => run_switch(&context, args).await,
        Commands::Preference(command) => run_preference(&context, command),
        Commands::Import(args) => run_import(&context, args).await,
        Commands::EnvDocs | Commands::InitConfig { .. } => Ok(()),
    }
}

async fn run_fetch(context: &Context, args: FetchArgs) -> I18nResult<()> {
    let language = Language::parse(&args.lang)?;
    let loader = context.loader(language, context.fetcher(&args.source)?);

    match (&args.role, args.namespaces.is_empty()) {
        (Some(role), _) => loader.preload_role(language, role).await?,
        (None, true) => loader.preload_common(language).await?,
        (None, false) => {
            let namespaces: Vec<&str> = args.namespaces.iter().map(String::as_str).collect();
            loader.ensure_loaded(language, &namespaces).await?
        }
    }

    for namespace in loader.engine().loaded_namespaces(language) {
        println!("{}/{}", language, namespace);
    }
    Ok(())
}

async fn run_resolve(context: &Context, args: ResolveArgs) -> I18nResult<()> {
    let language = Language::parse(&args.lang)?;
    let loader = context.loader(language, context.fetcher(&args.source)?);

    let mut namespaces: Vec<&str> = constants::COMMON_NAMESPACES.to_vec();
    namespaces.extend(args.namespaces.iter().map(String::as_str));

    for candidate in chain_for(language) {
        if let Err(error) = loader.ensure_loaded(candidate, &namespaces).await {
            tracing::warn!("{}", error);
        }
    }

    // 只有连接真实接口时才上报缺失翻译
    let beacon = if context.config.report_missing && args.source.from_dir.is_none() {
        let (reporter, receiver) = MissingKeyReporter::channel(
            constants::MISSING_KEY_CHANNEL_CAPACITY,
            context.clock.clone(),
        );
        Some((reporter, MissingKeyBeacon::spawn(context.client()?, receiver)))
    } else {
        None
    };

    let engine = loader.engine().clone();
    let (resolver, handle) = match beacon {
        Some((reporter, handle)) => (FallbackResolver::with_reporter(engine, reporter), Some(handle)),
        None => (FallbackResolver::new(engine), None),
    };

    let params: Vec<(&str, &str)> = args
        .params
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    let value = resolver.resolve(
        &args.key,
        language,
        args.default.as_deref().unwrap_or(""),
        None,
        &params,
    );
    println!("{}", value);

    drop(resolver);
    if let Some(handle) = handle {
        if let Err(e) = handle.await {
            tracing::debug!("上报任务异常结束: {}", e);
        }
    }
    Ok(())
}

async fn run_switch(context: &Context, args: SwitchArgs) -> I18nResult<()> {
    let remote = args.source.from_dir.is_none();
    let loader = context.loader(context.config.default_language, context.fetcher(&args.source)?);

    let mut switcher = LanguageSwitcher::new(loader, context.preferences());
    if remote {
        switcher = switcher.with_sync(context.client()?);
    }

    switcher.restore(context.config.default_language).await;
    match switcher.switch_language(&args.lang).await? {
        SwitchOutcome::Applied(language) => println!("{}", language),
        SwitchOutcome::Superseded { active, .. } => println!("{}", active),
    }
    Ok(())
}

fn run_preference(context: &Context, command: PreferenceCommand) -> I18nResult<()> {
    let preferences = context.preferences();
    match command {
        PreferenceCommand::Get => {
            if let Some(language) = preferences.read() {
                println!("{}", language);
            }
        }
        PreferenceCommand::Set { lang } => {
            let language = preferences.store(&lang)?;
            println!("{}", language);
        }
        PreferenceCommand::Clear => preferences.clear(),
    }
    Ok(())
}

async fn run_import(context: &Context, args: ImportArgs) -> I18nResult<()> {
    let language = Language::parse(&args.lang)?;
    let content = read_file(&args.file)?;
    let bundle = Bundle::from_json(&content).map_err(|e| e.with_context(args.file.display()))?;
    let resources = bundle.to_bulk_resources(language, &args.namespace);

    if args.dry_run {
        return print_json(&resources);
    }

    let created = context.client()?.bulk_import(&resources).await?;
    println!("{}", created);
    Ok(())
}

fn read_file(path: &Path) -> I18nResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| I18nError::ParseError(format!("无法读取 {}: {}", path.display(), e)))
}

fn init_tracing() {
    let level = env::core::LogLevel::get().unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::try_new(format!("i18n_cache={}", level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    // 日志级别可能只写在 .env 中，必须先加载
    let env_file = ConfigManager::load_dotenv();
    init_tracing();
    if let Some(env_file) = env_file {
        tracing::debug!("日志初始化前已加载环境变量文件: {}", env_file);
    }
    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("Error: {}", error);
        process::exit(1);
    }
}
