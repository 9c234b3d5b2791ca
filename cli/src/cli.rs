use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "vitrina",
    about = "Query a local-business video catalog the way the discovery feed does",
    version
)]
pub struct Cli {
    /// Catalog of content items (.json, .yaml or .yml)
    #[arg(short, long, global = true)]
    pub fixture: Option<PathBuf>,

    /// Engine configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print YAML instead of JSON
    #[arg(long, global = true)]
    pub yaml: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the general search with the given filters
    Search(SearchArgs),

    /// Items carrying any of the given tags
    Tags {
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Items whose business name starts with the given text
    Business { name: String },

    /// Items with an active coupon
    Coupons {
        #[arg(long)]
        category: Option<String>,
    },

    /// Items within a radius of a point
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Radius in kilometres; the configured default when omitted
        #[arg(long)]
        radius: Option<f64>,
    },
}

#[derive(Args, Default)]
pub struct SearchArgs {
    /// Free text matched against titles and descriptions
    #[arg(short, long)]
    pub query: Option<String>,

    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Exact business name
    #[arg(long)]
    pub business: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// Only items whose business runs a coupon
    #[arg(long)]
    pub coupon: bool,

    #[arg(long)]
    pub min_rating: Option<f32>,

    /// Price tiers, by name or as $ .. $$$$
    #[arg(long = "price")]
    pub prices: Vec<String>,

    /// Search centre as LAT,LNG
    #[arg(long, allow_hyphen_values = true)]
    pub near: Option<String>,

    #[arg(long)]
    pub radius: Option<f64>,

    /// Extra pages to load after the first
    #[arg(long, default_value_t = 0)]
    pub pages: usize,
}
