//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, DEFAULT_ENDPOINT, Profile};
use crate::error::CliError;
use crate::output;

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "use_cache = {}", cfg.defaults.use_cache);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        if let Some(ref endpoint) = p.endpoint {
            let _ = writeln!(out, "endpoint = \"{endpoint}\"");
        }
        if let Some(ref email) = p.email {
            let _ = writeln!(out, "email = \"{email}\"");
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if let Some(ref user) = p.ssh_user {
            let _ = writeln!(out, "ssh_user = \"{user}\"");
        }
        if p.ssh_password.is_some() {
            let _ = writeln!(out, "ssh_password = \"****\"");
        }
    }

    out
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            output::print_output(&format_config_redacted(&cfg), global.quiet);
            Ok(())
        }

        ConfigCommand::Init => init(global),

        ConfigCommand::SetPassword => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let password =
                rpassword::prompt_password("Account password: ").map_err(prompt_err)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            config::store_in_keyring(&profile_name, "password", &password)?;
            output::print_output(
                &format!("Password stored in keyring for profile '{profile_name}'."),
                global.quiet,
            );
            Ok(())
        }
    }
}

/// Interactively create or update a profile.
fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);

    let endpoint: String = Input::new()
        .with_prompt("API endpoint")
        .default(DEFAULT_ENDPOINT.to_owned())
        .interact_text()
        .map_err(prompt_err)?;

    let email: String = Input::new()
        .with_prompt("Account email")
        .interact_text()
        .map_err(prompt_err)?;
    if email.is_empty() {
        return Err(CliError::Validation {
            field: "email".into(),
            reason: "email cannot be empty".into(),
        });
    }

    let password = rpassword::prompt_password("Account password: ").map_err(prompt_err)?;

    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where should the password be stored?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let plaintext_password = if selection == 0 {
        config::store_in_keyring(&profile_name, "password", &password)?;
        None
    } else {
        Some(password)
    };

    let ssh_user: String = Input::new()
        .with_prompt("Device SSH username")
        .default("pi".to_owned())
        .interact_text()
        .map_err(prompt_err)?;

    let ssh_password = if Confirm::new()
        .with_prompt("Store a device SSH password?")
        .default(false)
        .interact()
        .map_err(prompt_err)?
    {
        let pw = rpassword::prompt_password("Device SSH password: ").map_err(prompt_err)?;
        config::store_in_keyring(&profile_name, "ssh-password", &pw)?;
        None
    } else {
        None
    };

    cfg.profiles.insert(
        profile_name.clone(),
        Profile {
            endpoint: (endpoint != DEFAULT_ENDPOINT).then_some(endpoint),
            email: Some(email),
            password: plaintext_password,
            password_env: None,
            ssh_user: Some(ssh_user),
            ssh_password,
        },
    );
    if cfg.default_profile.is_none() {
        cfg.default_profile = Some(profile_name.clone());
    }

    config::save_config(&cfg)?;
    output::print_output(
        &format!(
            "Profile '{profile_name}' saved to {}",
            config::config_path().display()
        ),
        global.quiet,
    );
    Ok(())
}
