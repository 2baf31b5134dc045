use std::path::PathBuf;
use std::time::Duration;

use envconfig::Envconfig;

use crate::feeds::Site;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(
        from = "BASE_URL",
        default = "https://raw.githubusercontent.com/gayanvoice/top-github-users/main/cache"
    )]
    pub base_url: String,

    #[envconfig(from = "OUTPUT_DIR", default = "country_files")]
    pub output_dir: PathBuf,

    /// JSON file shaped like `countries.json`; the embedded list is used when unset.
    #[envconfig(from = "COUNTRIES_PATH")]
    pub countries_path: Option<PathBuf>,

    #[envconfig(from = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    #[envconfig(from = "CONCURRENCY", default = "1")]
    pub concurrency: usize,

    #[envconfig(from = "FAIL_FAST", default = "false")]
    pub fail_fast: bool,

    /// When set, feeds and the sitemap are written here after the update.
    #[envconfig(from = "PUBLIC_DIR")]
    pub public_dir: Option<PathBuf>,

    #[envconfig(from = "SITE_URL", default = "https://rang-forge.netlify.app")]
    pub site_url: String,
}

impl Config {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Number of requests allowed in flight; zero is read as one.
    pub fn workers(&self) -> usize {
        self.concurrency.max(1)
    }

    pub fn site(&self) -> Option<Site> {
        self.public_dir.as_ref().map(|public_dir| Site {
            url: self.site_url.clone(),
            public_dir: public_dir.clone(),
        })
    }
}
