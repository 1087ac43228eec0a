use caretaker::{
    Result,
    channel::InProcessChannel,
    cli::{Args, Command},
    command::{self, common, migrate::MigrateRequest},
    config::Config,
    engine::types::{MigrationRequest, MigrationResult},
    forge::factory::HostFactory,
    reporter::LogReporter,
};
use clap::Parser;
use std::{process::ExitCode, sync::Arc};

fn initialize_logger(debug: bool) -> Result<()> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("caretaker")
        .build();

    // stdout carries JSON results and worker responses
    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli_args = Args::parse();

    initialize_logger(cli_args.debug)?;

    let config = Config::load(cli_args.config.as_deref()).await?;

    let results = match &cli_args.command {
        Command::List => {
            print!("{}", command::list::execute());
            return Ok(ExitCode::SUCCESS);
        }
        Command::Worker => {
            let host = HostFactory::create(&cli_args.remote_config(None)?)?;
            let channel = InProcessChannel::new(host);
            let response =
                command::worker::execute(&channel, tokio::io::stdin()).await?;
            println!("{}", serde_json::to_string(&response)?);
            return Ok(ExitCode::SUCCESS);
        }
        Command::Apply { target, changes } => {
            let repo_target = target.target()?;
            let host =
                HostFactory::create(&cli_args.remote_config(Some(&repo_target))?)?;
            let engine = common::create_engine(host, &config);
            vec![
                command::apply::execute(
                    &engine,
                    &config,
                    target,
                    &repo_target.repo,
                    changes,
                )
                .await?,
            ]
        }
        Command::Migrate {
            migration,
            target,
            params,
        } => {
            let repo_target = target.target()?;
            let host =
                HostFactory::create(&cli_args.remote_config(Some(&repo_target))?)?;
            let channel = common::create_channel(host.clone(), &config);
            let engine = common::create_engine(host, &config);
            vec![
                command::migrate::execute(
                    &engine,
                    channel.as_ref(),
                    &LogReporter,
                    &config,
                    MigrateRequest {
                        migration: *migration,
                        target,
                        repo: &repo_target.repo,
                        params,
                    },
                )
                .await?,
            ]
        }
        Command::Batch { requests } => {
            let requests: Vec<MigrationRequest> =
                common::read_json_file(requests).await?;
            let host = HostFactory::create(&cli_args.remote_config(None)?)?;
            let engine = Arc::new(common::create_engine(host, &config));
            command::batch::execute(engine, &config, requests).await?
        }
    };

    println!("{}", common::render_results(&results)?);

    Ok(exit_code(&results))
}

fn exit_code(results: &[MigrationResult]) -> ExitCode {
    if common::any_failed(results) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
