use clap::Parser;

use linkwatch::cli::{Cli, Commands};
use linkwatch::config::{StaticConfig, get_config, init_config_from};
use linkwatch::runtime::modes;
use linkwatch::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Serve);
    if command == Commands::GenerateConfig {
        print!("{}", StaticConfig::generate_sample_config());
        return Ok(());
    }

    let config_path = cli
        .config
        .as_deref()
        .unwrap_or(linkwatch::config::DEFAULT_CONFIG_PATH);
    init_config_from(config_path);

    let config = get_config();
    let _guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    match command {
        Commands::Serve => modes::run_server().await,
        Commands::CheckOnce => modes::run_check_once().await,
        Commands::Add {
            short_code,
            target_url,
            expire,
        } => modes::run_add(short_code, target_url, expire).await,
        Commands::Remove { short_code } => modes::run_remove(short_code).await,
        Commands::List => modes::run_list().await,
        Commands::GenerateConfig => Ok(()),
    }
}
