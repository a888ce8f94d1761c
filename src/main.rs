use clap::{Arg, ArgAction, Command};
use contact_relay::client::{ContactClient, ContactForm, SubmitOutcome};
use contact_relay::detection::SpamFilter;
use contact_relay::server::ContactServer;
use contact_relay::{Config, SubmissionHandler, SubmissionInput};
use log::LevelFilter;
use std::collections::HashMap;
use std::process;
use std::str::FromStr;

#[tokio::main]
async fn main() {
    let matches = Command::new("contact-relay")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Contact form endpoint with validation, spam screening and rate limiting")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/contact-relay.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("test-submission")
                .long("test-submission")
                .value_name("FILE")
                .help("Run a YAML map of form fields through validation and spam screening")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("send")
                .long("send")
                .value_name("URL")
                .help("Submit a form to a running endpoint, validating it locally first")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("field")
                .long("field")
                .value_name("NAME=VALUE")
                .help("Form field for --send (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("bind")
                .short('b')
                .long("bind")
                .value_name("ADDR")
                .help("Override the configured bind address")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("/etc/contact-relay.yaml");

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        config
            .logging
            .as_ref()
            .and_then(|l| LevelFilter::from_str(&l.level).ok())
            .unwrap_or(LevelFilter::Info)
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    if matches.get_flag("test-config") {
        test_config(&config);
        return;
    }

    if let Some(path) = matches.get_one::<String>("test-submission") {
        test_submission(&config, path);
        return;
    }

    if let Some(endpoint) = matches.get_one::<String>("send") {
        let fields: Vec<String> = matches
            .get_many::<String>("field")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        send_form(endpoint, &fields).await;
        return;
    }

    let bind_address = matches
        .get_one::<String>("bind")
        .cloned()
        .unwrap_or_else(|| config.server.bind_address.clone());

    log::info!("Starting contact-relay...");
    let server = match ContactServer::new(&config) {
        Ok(server) => server,
        Err(e) => {
            log::error!("Failed to initialise endpoint: {e:#}");
            process::exit(1);
        }
    };
    if let Err(e) = server.run(&bind_address).await {
        log::error!("Server error: {e:#}");
        process::exit(1);
    }
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        // The logger is not up yet at this point.
        eprintln!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn test_config(config: &Config) {
    println!("🔍 Testing configuration...");
    println!();
    println!("Endpoint: {} on {}", config.server.endpoint_path, config.server.bind_address);
    println!("Recipient: {}", config.delivery.recipient);
    match &config.delivery.sendmail_path {
        Some(path) if std::path::Path::new(path).exists() => {
            println!("Mail transport: {path}")
        }
        Some(path) => println!("⚠️  Mail transport {path} not found, fallback log only"),
        None => println!("Mail transport: not configured, fallback log only"),
    }
    println!("Fallback log: {}", config.delivery.fallback_log_path);
    println!(
        "Limits: {} characters, one message per {}s per client",
        config.limits.max_message_length, config.limits.rate_limit_seconds
    );

    match SpamFilter::from_config(&config.spam) {
        Ok(filter) => println!(
            "✅ {} spam pattern groups compiled successfully",
            filter.pattern_count()
        ),
        Err(e) => {
            println!("❌ Configuration validation failed:");
            println!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn test_submission(config: &Config, path: &str) {
    println!("🧪 Testing submission file: {path}");
    println!();

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("❌ Error reading submission file: {e}");
            process::exit(1);
        }
    };
    let fields: HashMap<String, String> = match serde_yaml::from_str(&content) {
        Ok(fields) => fields,
        Err(e) => {
            eprintln!("❌ Submission file must be a map of field names to strings: {e}");
            process::exit(1);
        }
    };

    let handler = match SubmissionHandler::new(config) {
        Ok(handler) => handler,
        Err(e) => {
            eprintln!("❌ Error creating submission handler: {e:#}");
            process::exit(1);
        }
    };

    match handler.screen(&SubmissionInput::from_pairs(fields)) {
        Ok(submission) => {
            println!("✅ Result: ACCEPT");
            println!("   Name: {}", submission.name());
            println!("   Email: {}", submission.email());
            println!("   Subject: {}", submission.subject());
        }
        Err(e) => {
            println!("❌ Result: REJECT");
            println!("   Message: {e}");
            if let contact_relay::ContactError::ValidationFailed(errors) = &e {
                for (field, messages) in errors.iter() {
                    for message in messages {
                        println!("     - {field}: {message}");
                    }
                }
            }
        }
    }
}

async fn send_form(endpoint: &str, fields: &[String]) {
    let mut client = match ContactClient::new(endpoint) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    };

    let mut form = ContactForm::new();
    for field in fields {
        let Some((name, value)) = field.split_once('=') else {
            eprintln!("❌ Expected NAME=VALUE, got '{field}'");
            process::exit(1);
        };
        if !form.set(name.trim(), value) {
            eprintln!("⚠️  Ignoring unknown field '{name}'");
        }
    }

    let outcome = client.submit(&mut form).await;
    if let Some(banner) = client.notifications.latest() {
        println!("{:?}: {}", banner.kind, banner.message);
    }
    for field in form.fields() {
        if !field.error_text().is_empty() {
            println!("   {}: {}", field.name, field.error_text());
        }
    }
    if !matches!(outcome, SubmitOutcome::Sent(_)) {
        process::exit(1);
    }
}
