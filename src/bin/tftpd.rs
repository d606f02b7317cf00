use std::net::SocketAddr;
use std::str::FromStr;
use tftpd::Config;
use tftpd::Server;

fn init_logging() {
    const LOG_ENV: &str = "RUST_LOG";
    use tracing::Level;
    use tracing_subscriber::EnvFilter;

    let filter = std::env::var(LOG_ENV)
        .map(|env| {
            EnvFilter::from_str(env.to_uppercase().as_str())
                .unwrap_or_else(|err| panic!("invalid `{}` environment variable {}", LOG_ENV, err))
        })
        .unwrap_or(EnvFilter::default().add_directive(Level::INFO.into()));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let matches = clap::App::new(clap::crate_name!())
        .bin_name(clap::crate_name!())
        .version(clap::crate_version!())
        .about("Read-only TFTP-style file server")
        .arg(
            clap::Arg::with_name("address")
                .short("a")
                .long("address")
                .help("Listen address")
                .default_value("127.0.0.1:69")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("payload")
                .short("p")
                .long("payload")
                .help("File served to every read request")
                .required(true)
                .takes_value(true),
        )
        .get_matches();

    let address = SocketAddr::from_str(matches.value_of("address").unwrap())?;
    let payload = std::fs::read(matches.value_of("payload").unwrap())?;

    let server = Server::new(Config::new(payload))?;
    server.listen(address).await?;
    Ok(())
}
