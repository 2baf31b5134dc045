use std::path::Path;

use anyhow::Context;

const EMBEDDED: &str = include_str!("../countries.json");

/// On-disk shape of a country list: `{"countries": ["Afghanistan", ...]}`.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct CountryList {
    pub countries: Vec<String>,
}

impl CountryList {
    #[cfg(test)]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            countries: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn embedded() -> anyhow::Result<Self> {
        serde_json::from_str(EMBEDDED).context("embedded country list is malformed")
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open country list {}", path.display()))?;

        serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("cannot parse country list {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.countries.iter().map(String::as_str)
    }
}

/// Loads the list from `path` when given, otherwise the one compiled into the binary.
pub fn get_countries(path: Option<&Path>) -> anyhow::Result<CountryList> {
    match path {
        Some(path) => CountryList::from_file(path),
        None => CountryList::embedded(),
    }
}

/// "South Korea" -> "south_korea". Only spaces are replaced.
pub fn slugify(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("South Korea"), "south_korea");
        assert_eq!(slugify("New Zealand"), "new_zealand");
        assert_eq!(slugify("Bosnia And Herzegovina"), "bosnia_and_herzegovina");
        assert_eq!(slugify("Chad"), "chad");
    }

    #[test]
    fn embedded_slugs_are_lowercase_and_distinct() {
        let list = CountryList::embedded().unwrap();
        assert!(!list.is_empty());

        let mut seen = HashSet::new();
        for name in list.iter() {
            let slug = slugify(name);
            assert!(!slug.contains(' '), "{slug}");
            assert_eq!(slug, slug.to_lowercase());
            assert!(seen.insert(slug.clone()), "duplicate slug {slug}");
        }
        assert_eq!(seen.len(), list.len());
    }

    #[test]
    fn embedded_list_keeps_source_order() {
        let list = CountryList::embedded().unwrap();
        assert_eq!(list.countries.first().map(String::as_str), Some("Afghanistan"));
        assert_eq!(list.countries.last().map(String::as_str), Some("Zimbabwe"));
    }

    #[test]
    fn loads_fixture_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"countries": ["Andorra", "United States", "Andorra"]}}"#).unwrap();

        let list = get_countries(Some(file.path())).unwrap();
        assert_eq!(list.countries, ["Andorra", "United States", "Andorra"]);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"["Andorra"]"#).unwrap();

        assert!(get_countries(Some(file.path())).is_err());
        assert!(get_countries(Some(Path::new("/nonexistent/countries.json"))).is_err());
    }
}
