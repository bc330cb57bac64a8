use std::path::PathBuf;

use anyhow::Context;
use futures::{stream, StreamExt};
use serde::Serialize;
use structopt::StructOpt;
use url::Url;

use preisblatt::{Config, Product, ProductParser, ProfileStore};

#[allow(missing_docs)]
#[derive(Debug, StructOpt)]
#[structopt(name = "preisblatt", about = "Product extraction from shop pages.")]
#[structopt(setting = structopt::clap::AppSettings::ColoredHelp)]
enum App {
    #[structopt(name = "url", about = "Download pages and extract their products.")]
    Url {
        #[structopt(name = "urls", help = "The urls of the product pages to download.")]
        urls: Vec<Url>,
        #[structopt(flatten)]
        opts: Opts,
    },
    #[structopt(name = "file", about = "Extract the product of a stored page.")]
    File {
        #[structopt(name = "site", help = "The site whose selectors to use, e.g. www.emag.ro")]
        site: String,
        #[structopt(name = "path", help = "The html file.", parse(from_os_str))]
        path: PathBuf,
        #[structopt(flatten)]
        opts: Opts,
    },
}

/// A single extraction result.
#[derive(Debug, Serialize)]
struct Extracted {
    source: String,
    product: Option<Product>,
}

impl App {
    async fn run(self) -> anyhow::Result<()> {
        let (out, products) = match self {
            App::Url { urls, opts } => {
                let parser = opts.parser()?;
                let client = reqwest::Client::new();
                let parser = &parser;
                let client = &client;
                let products = stream::iter(urls.into_iter().map(|url| async move {
                    let product = match Self::fetch(client, &url).await {
                        Ok(html) => parser.parse_url(&url, &html),
                        Err(err) => {
                            log::error!("Failed to download '{}': {:?}", url, err);
                            None
                        }
                    };
                    Extracted {
                        source: url.to_string(),
                        product,
                    }
                }))
                .buffer_unordered(10)
                .collect::<Vec<_>>()
                .await;
                (opts.output, products)
            }
            App::File { site, path, opts } => {
                let parser = opts.parser()?;
                let html = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let product = parser.parse_html(&site, &html);
                (
                    opts.output,
                    vec![Extracted {
                        source: path.display().to_string(),
                        product,
                    }],
                )
            }
        };
        Self::write(out, products).await
    }

    async fn fetch(client: &reqwest::Client, url: &Url) -> anyhow::Result<String> {
        Ok(client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    }

    /// Writes the products as json.
    ///
    /// If a output file is configured, then the products will be stored there,
    /// otherwise to std::out.
    async fn write(out: Option<PathBuf>, products: Vec<Extracted>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&products)?;
        if let Some(out) = out {
            tokio::fs::write(out, json).await?;
        } else {
            println!("{}", json);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, StructOpt)]
pub struct Opts {
    #[structopt(
        long = "config",
        short = "c",
        help = "The parser mappings to use instead of the bundled ones.",
        parse(from_os_str)
    )]
    mappings: Option<PathBuf>,
    #[structopt(
        long = "meta-delimiter",
        help = "Separates several details selectors of one site."
    )]
    meta_delimiter: Option<String>,
    #[structopt(
        long = "key-suffix",
        help = "Suffix stripped from the labels of details."
    )]
    key_suffix: Option<String>,
    #[structopt(
        long = "output",
        short = "o",
        help = "The file to store extracted products as json.",
        parse(from_os_str)
    )]
    output: Option<PathBuf>,
}

impl Opts {
    fn as_config(&self) -> Config {
        let mut config = Config::builder();
        if let Some(meta_delimiter) = self.meta_delimiter.clone() {
            config = config.meta_delimiter(meta_delimiter);
        }
        if let Some(key_suffix) = self.key_suffix.clone() {
            config = config.key_suffix(key_suffix);
        }
        config.build()
    }

    fn parser(&self) -> anyhow::Result<ProductParser> {
        let config = self.as_config();
        let profiles = match &self.mappings {
            Some(path) => ProfileStore::from_path(path, &config)?,
            None => ProfileStore::bundled(&config),
        };
        Ok(ProductParser::new(config, profiles))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    Ok(App::from_args().run().await?)
}
