use aiterm::config::{Config, Overrides};
use aiterm::error::Failure;
use aiterm::http_client::ReqwestHttpClient;
use aiterm::provider::{CommandProvider, MockProvider, OpenAiProvider};
use aiterm::resolution::{Outcome, ResolutionLoop};
use clap::{Arg, ArgAction, Command};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let matches = Command::new("aiterm")
        .about("Turn a natural language request into a shell command")
        .long_about("aiterm asks a chat completion API for the shell command matching your request, then lets you run it, copy it, edit it, or ask again")
        .arg(Arg::new("request")
            .help("What you want to do, in plain words")
            .num_args(1))
        .arg(Arg::new("key")
            .long("key")
            .help("API key (overrides the OPENAI_KEY environment variable)")
            .value_name("API_KEY")
            .num_args(1))
        .arg(Arg::new("url")
            .long("url")
            .help("Completion endpoint to send requests to")
            .num_args(1))
        .arg(Arg::new("model")
            .long("model")
            .help("Model to ask")
            .num_args(1))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("Show debug logs and stderr of executed commands")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("set-api-key")
            .long("set-api-key")
            .help("Save the API key to the config file")
            .value_name("API_KEY")
            .num_args(1))
        .arg(Arg::new("config")
            .long("config")
            .help("Show configuration information")
            .action(ArgAction::SetTrue))
        .get_matches();

    let verbose = matches.get_flag("verbose");
    let default_filter = if verbose { "aiterm=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Handle configuration commands
    if let Some(api_key) = matches.get_one::<String>("set-api-key") {
        let mut config = Config::load_saved();
        config.set_api_key(api_key.clone())?;
        println!("✅ API key saved successfully");
        return Ok(ExitCode::SUCCESS);
    }

    if matches.get_flag("config") {
        Config::show_config_info()?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(request) = matches.get_one::<String>("request").cloned() else {
        println!("No prompt was provided.");
        return Ok(ExitCode::SUCCESS);
    };

    let mut config = Config::load()?;
    config.apply(Overrides {
        api_key: matches.get_one::<String>("key").cloned(),
        url: matches.get_one::<String>("url").cloned(),
        model: matches.get_one::<String>("model").cloned(),
    });

    info!("Processing request: {}", request);

    let result = if config.is_mock_mode() {
        run(MockProvider::new(config.api_key()), request, verbose).await
    } else {
        match ReqwestHttpClient::with_timeout(config.timeout()) {
            Ok(client) => {
                let provider = OpenAiProvider::with_client(
                    client,
                    config.endpoint(),
                    config.api_key(),
                    config.request_parameters(),
                );
                run(provider, request, verbose).await
            }
            Err(error) => Err(Failure::Transport(error)),
        }
    };

    match result {
        Ok(outcome) => {
            info!("Finished with {:?}", outcome);
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            error!(kind = failure.kind(), error = ?failure, "Run failed");
            eprintln!("❌ {}", failure);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run<P: CommandProvider>(provider: P, request: String, verbose: bool) -> Result<Outcome, Failure> {
    ResolutionLoop::new(provider, request, verbose).run().await
}
