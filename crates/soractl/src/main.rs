mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use soractl_api::{ApiClient, TransportConfig, authenticate};

use crate::cli::{Cli, Command};
use crate::error::{CliError, map_api_error};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // These never talk to the API.
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),
        Command::Cache(args) => commands::cache_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "soractl", &mut std::io::stdout());
            Ok(())
        }

        // Everything else needs an authenticated client.
        cmd => {
            let ctx = build_context(&cli.global).await?;
            tracing::debug!(command = ?cmd, profile = ctx.profile_name, "dispatching command");
            commands::dispatch(cmd, &ctx, &cli.global).await
        }
    }
}

/// Everything a command handler needs besides its own arguments.
pub struct AppContext {
    pub api: ApiClient,
    pub profile_name: String,
    pub endpoint: String,
    pub timeout: u64,
    pub use_cache: bool,
    pub ssh_password: Option<secrecy::SecretString>,
}

impl AppContext {
    /// Translate an API error with this invocation's context attached.
    pub fn map_api(&self, err: soractl_api::Error) -> CliError {
        map_api_error(err, &self.profile_name, &self.endpoint, self.timeout)
    }

    /// Translate a core error with this invocation's context attached.
    pub fn map_core(&self, err: soractl_core::CoreError) -> CliError {
        error::map_core_error(err, &self.profile_name, &self.endpoint, self.timeout)
    }
}

/// Load config, resolve credentials, and build the authenticated client.
async fn build_context(global: &cli::GlobalOpts) -> Result<AppContext, CliError> {
    let cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);
    let profile = cfg.profiles.get(&profile_name);

    // An explicitly named profile must exist unless a direct credential
    // pair makes the profile irrelevant.
    if global.profile.is_some()
        && profile.is_none()
        && (global.api_key.is_none() || global.token.is_none())
    {
        let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }

    let endpoint = config::resolve_endpoint(global, profile);
    let base_url: url::Url = endpoint.parse().map_err(|_| CliError::Validation {
        field: "endpoint".into(),
        reason: format!("invalid URL: {endpoint}"),
    })?;

    let transport = TransportConfig {
        timeout: std::time::Duration::from_secs(global.timeout),
    };

    let credentials = match config::resolve_auth(global, profile, &profile_name)? {
        config::AuthSource::Direct(credentials) => credentials,
        config::AuthSource::Login { email, password } => {
            authenticate(&base_url, &email, &password, &transport)
                .await
                .map_err(|e| map_api_error(e, &profile_name, &endpoint, global.timeout))?
        }
    };

    let api = ApiClient::new(base_url, &credentials, &transport)
        .map_err(|e| map_api_error(e, &profile_name, &endpoint, global.timeout))?;

    let use_cache = cfg.defaults.use_cache && !global.no_cache;
    let ssh_password = config::resolve_ssh_password(profile, &profile_name);

    Ok(AppContext {
        api,
        profile_name,
        endpoint,
        timeout: global.timeout,
        use_cache,
        ssh_password,
    })
}
