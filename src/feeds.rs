//! RSS feeds, sitemap and robots.txt for the ranking site.
//!
//! Everything here is derived from the records already written to the output
//! directory; nothing is fetched. Records are either a bare array of users or
//! an object with a `users` array.

use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use serde_json::Value;

use crate::countries::{slugify, CountryList};

/// Users listed per country feed.
const FEED_LIMIT: usize = 50;

const STATIC_PAGES: [(&str, &str, &str); 4] = [
    ("/", "weekly", "1.0"),
    ("/ranking", "daily", "0.9"),
    ("/about", "monthly", "0.5"),
    ("/contact", "monthly", "0.3"),
];

#[derive(Clone, Debug)]
pub struct Site {
    /// Public address of the site, without a trailing slash.
    pub url: String,
    pub public_dir: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Developer {
    pub login: String,
    pub name: String,
    pub bio: Option<String>,
    pub followers: u64,
    pub public_contributions: u64,
}

impl Developer {
    fn from_value(value: &Value) -> Option<Self> {
        let login = value.get("login")?.as_str()?.to_string();
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Some(Self {
            name: text("name").unwrap_or_else(|| login.clone()),
            bio: text("bio"),
            followers: count(value.get("followers")),
            public_contributions: count(value.get("publicContributions")),
            login,
        })
    }
}

/// Counts arrive as numbers or numeric strings; anything else is zero.
fn count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

/// Users of one record, most followed first. Entries without a login are dropped.
pub fn ranked_developers(record: &Value) -> Vec<Developer> {
    let entries = match record {
        Value::Array(entries) => entries.as_slice(),
        Value::Object(map) => match map.get("users") {
            Some(Value::Array(entries)) => entries.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    let mut developers: Vec<Developer> = entries.iter().filter_map(Developer::from_value).collect();
    developers.sort_by(|a, b| b.followers.cmp(&a.followers));
    developers
}

/// 1234567 -> "1,234,567"
fn grouped(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn rfc822(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn main_feed(site: &str, countries: &CountryList, now: DateTime<Utc>) -> String {
    let date = rfc822(now);
    let mut items = String::new();
    for country in countries.iter() {
        let slug = slugify(country);
        let country = escape(country);
        let _ = write!(
            items,
            "
    <item>
      <title>Top GitHub Developers in {country}</title>
      <link>{site}/ranking/{slug}</link>
      <guid>{site}/ranking/{slug}</guid>
      <description>Discover the most talented GitHub developers from {country}. View comprehensive rankings based on followers, contributions, and community impact.</description>
      <pubDate>{date}</pubDate>
    </item>"
        );
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" ?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
<channel>
  <title>GitHub Developer Rankings | Rang Forge</title>
  <link>{site}</link>
  <description>Explore GitHub rankings and discover top developers worldwide. Compare developers by country, contributions, and influence.</description>
  <language>en-us</language>
  <lastBuildDate>{date}</lastBuildDate>
  <atom:link href="{site}/rss.xml" rel="self" type="application/rss+xml" />
  {items}
</channel>
</rss>"#
    )
}

pub fn country_feed(
    site: &str,
    country: &str,
    developers: &[Developer],
    now: DateTime<Utc>,
) -> String {
    let date = rfc822(now);
    let slug = slugify(country);
    let country = escape(country);
    let mut items = String::new();
    for (rank, dev) in developers.iter().take(FEED_LIMIT).enumerate() {
        let login = escape(&dev.login);
        let name = escape(&dev.name);
        let about = match &dev.bio {
            Some(bio) => escape(bio).into_owned(),
            None => format!("GitHub developer from {country}"),
        };
        let _ = write!(
            items,
            "
    <item>
      <title>{name} - Rank #{rank} GitHub Developer from {country}</title>
      <link>{site}/ranking/{slug}/{login}</link>
      <guid>{site}/ranking/{slug}/{login}</guid>
      <description>{about}. {name} has {followers} followers and {contributions} contributions on GitHub.</description>
      <author>info@rang-forge.app (Rang Forge)</author>
      <pubDate>{date}</pubDate>
      <category>GitHub Developers</category>
      <category>{country}</category>
    </item>",
            rank = rank + 1,
            followers = grouped(dev.followers),
            contributions = grouped(dev.public_contributions),
        );
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" ?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
<channel>
  <title>Top GitHub Developers in {country} | Rang Forge</title>
  <link>{site}/ranking/{slug}</link>
  <description>Discover the most talented GitHub developers from {country}. Rankings based on followers, contributions, and community impact.</description>
  <language>en-us</language>
  <lastBuildDate>{date}</lastBuildDate>
  <atom:link href="{site}/feeds/{slug}.xml" rel="self" type="application/rss+xml" />
  {items}
</channel>
</rss>"#
    )
}

/// `users` holds `(country slug, login)` pairs.
pub fn sitemap(
    site: &str,
    countries: &CountryList,
    users: &[(String, String)],
    now: DateTime<Utc>,
) -> String {
    let lastmod = now.to_rfc3339();
    let pages = STATIC_PAGES
        .iter()
        .map(|(url, freq, prio)| (url.to_string(), *freq, *prio))
        .chain(
            countries
                .iter()
                .map(|c| (format!("/ranking/{}", slugify(c)), "daily", "0.8")),
        )
        .chain(users.iter().map(|(slug, login)| {
            (
                format!("/ranking/{slug}/{}", login.to_lowercase()),
                "weekly",
                "0.6",
            )
        }));

    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for (url, freq, prio) in pages {
        let loc = escape(&format!("{site}{url}")).into_owned();
        let _ = writeln!(
            out,
            "  <url>\n    <loc>{loc}</loc>\n    <changefreq>{freq}</changefreq>\n    \
             <priority>{prio}</priority>\n    <lastmod>{lastmod}</lastmod>\n  </url>"
        );
    }
    out.push_str("</urlset>\n");
    out
}

pub fn robots(site: &str) -> String {
    format!("# robots.txt for Rang Forge\nUser-agent: *\nAllow: /\n\n# Sitemaps\nSitemap: {site}/sitemap.xml\n")
}

#[derive(Debug, Default)]
pub struct Published {
    pub country_feeds: usize,
    pub user_pages: usize,
}

async fn write_file(path: &Path, contents: String) -> anyhow::Result<()> {
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("cannot write {}", path.display()))
}

/// Writes `rss.xml`, `feeds/<slug>.xml`, `sitemap.xml` and `robots.txt` under
/// the public directory. Countries without a readable record get no feed.
pub async fn publish(
    site: &Site,
    countries: &CountryList,
    records: &Path,
) -> anyhow::Result<Published> {
    let now = Utc::now();
    let url = site.url.trim_end_matches('/');
    let feeds_dir = site.public_dir.join("feeds");
    tokio::fs::create_dir_all(&feeds_dir)
        .await
        .with_context(|| format!("cannot create {}", feeds_dir.display()))?;

    let mut published = Published::default();
    let mut users = Vec::new();
    for country in countries.iter() {
        let slug = slugify(country);
        let path = records.join(format!("{slug}.json"));
        let record: Value = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(record) => record,
                Err(err) => {
                    tracing::warn!("Error generating RSS feed for {country}: {err}");
                    continue;
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => continue,
            Err(err) => {
                tracing::warn!("Error generating RSS feed for {country}: {err}");
                continue;
            }
        };

        let developers = ranked_developers(&record);
        let feed = country_feed(url, country, &developers, now);
        write_file(&feeds_dir.join(format!("{slug}.xml")), feed).await?;
        tracing::debug!("RSS feed for {country} generated");

        published.country_feeds += 1;
        users.extend(developers.into_iter().map(|d| (slug.clone(), d.login)));
    }
    published.user_pages = users.len();

    write_file(&site.public_dir.join("rss.xml"), main_feed(url, countries, now)).await?;
    write_file(
        &site.public_dir.join("sitemap.xml"),
        sitemap(url, countries, &users, now),
    )
    .await?;
    write_file(&site.public_dir.join("robots.txt"), robots(url)).await?;

    tracing::info!(
        "Published {} country feeds and {} user pages to {}",
        published.country_feeds,
        published.user_pages,
        site.public_dir.display()
    );
    Ok(published)
}
