use color_eyre::Result;
use log::LevelFilter;
use nanobanana::{cli::parse_cli, load_config, resolve_api_key, run};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .init();
    color_eyre::install()?;

    let cli = match parse_cli(std::env::args_os()) {
        Ok(cli) => cli,
        Err((e, code)) => {
            e.print()?;
            std::process::exit(code);
        }
    };
    let (request, output) = cli.into_request();
    let cfg = load_config()?;

    run(&request, output, &cfg, |model| {
        let key = resolve_api_key(|var| std::env::var(var).ok(), &cfg)?;
        Ok(model.make(key))
    })
    .await?;
    Ok(())
}
