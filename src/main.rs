use std::collections::BTreeMap;

use anyhow::Result;
use clap::Parser;
use geoclient::commands::{self, ClientOptions, parse_component};
use geoclient::{GeocodeRequest, ReverseGeocodeRequest};

/// geoclient - command line client for the geocoding API
///
/// Credentials are taken from flags or from GEOCLIENT_API_KEY, or from
/// GEOCLIENT_CLIENT_ID and GEOCLIENT_CLIENT_SECRET for enterprise accounts.
///
/// Examples:
///   geoclient geocode "1600 Amphitheatre Parkway"
///   geoclient reverse-geocode 40.714224,-73.961452
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API key (must start with AIza)
    #[arg(long, env = "GEOCLIENT_API_KEY", global = true, hide_env_values = true)]
    key: Option<String>,

    /// Enterprise client id
    #[arg(long, env = "GEOCLIENT_CLIENT_ID", global = true)]
    client_id: Option<String>,

    /// Enterprise client secret (URL-safe base64)
    #[arg(
        long,
        env = "GEOCLIENT_CLIENT_SECRET",
        global = true,
        hide_env_values = true
    )]
    client_secret: Option<String>,

    /// Usage reporting channel (requires a client id)
    #[arg(long, global = true)]
    channel: Option<String>,

    /// API base URL (defaults to https://maps.googleapis.com)
    #[arg(long = "base-url", value_name = "URL", global = true)]
    base_url: Option<String>,

    /// Maximum requests per second
    #[arg(long = "qps", value_name = "N", global = true)]
    queries_per_second: Option<usize>,

    /// Give up retrying after this many seconds
    #[arg(long = "retry-timeout", value_name = "SECS", global = true)]
    retry_timeout: Option<u64>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<u64>,

    /// Fail instead of retrying when the query quota is exhausted
    #[arg(long, global = true)]
    no_retry_over_query_limit: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Look up coordinates for an address
    Geocode(GeocodeArgs),

    /// Look up addresses for coordinates or a place id
    ReverseGeocode(ReverseGeocodeArgs),
}

#[derive(clap::Args, Debug)]
struct GeocodeArgs {
    /// Address to geocode
    #[arg(value_name = "ADDRESS")]
    address: Option<String>,

    /// Component filter, e.g. country:US (repeatable)
    #[arg(long = "component", value_name = "NAME:VALUE")]
    components: Vec<String>,

    /// Viewport bias as south,west|north,east
    #[arg(long)]
    bounds: Option<String>,

    /// Region bias (ccTLD)
    #[arg(long)]
    region: Option<String>,

    /// Result language
    #[arg(long)]
    language: Option<String>,
}

#[derive(clap::Args, Debug)]
struct ReverseGeocodeArgs {
    /// "lat,lng" or a place id
    #[arg(value_name = "LATLNG|PLACE_ID")]
    latlng: String,

    /// Restrict to these result types (repeatable)
    #[arg(long = "result-type")]
    result_type: Vec<String>,

    /// Restrict to these location types (repeatable)
    #[arg(long = "location-type")]
    location_type: Vec<String>,

    /// Result language
    #[arg(long)]
    language: Option<String>,
}

impl Cli {
    fn client_options(&self) -> ClientOptions {
        ClientOptions {
            key: self.key.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            channel: self.channel.clone(),
            base_url: self.base_url.clone(),
            queries_per_second: self.queries_per_second,
            retry_timeout_secs: self.retry_timeout,
            timeout_secs: self.timeout,
            no_retry_over_query_limit: self.no_retry_over_query_limit,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let client = cli.client_options().build()?;

    let output = match cli.command {
        Commands::Geocode(args) => {
            let components = args
                .components
                .iter()
                .map(|c| parse_component(c))
                .collect::<Result<BTreeMap<_, _>>>()?;
            let request = GeocodeRequest {
                address: args.address,
                components,
                bounds: args.bounds,
                region: args.region,
                language: args.language,
            };
            commands::geocode(&client, request).await?
        }
        Commands::ReverseGeocode(args) => {
            let request = ReverseGeocodeRequest {
                latlng: args.latlng,
                result_type: args.result_type,
                location_type: args.location_type,
                language: args.language,
            };
            commands::reverse_geocode(&client, request).await?
        }
    };

    println!("{}", output);
    Ok(())
}
