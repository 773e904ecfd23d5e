//! Client identity and credentials derived once at construction

use std::path::Path;

use indexmap::IndexMap;

use crate::config::ApiData;
use crate::payload::filter::folder_of;

/// Identity of the plugin this updater serves
///
/// All values are derived once in [`ClientIdentity::new`] and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    api_url: String,
    slug: String,
    full_id: String,
    version: String,
}

impl ClientIdentity {
    /// Derives the identity from the API URL and the plugin's main file
    ///
    /// * slug: file name without extension (`my-plugin/my-plugin.php` -> `my-plugin`)
    /// * full id: containing folder and file name (`my-plugin/my-plugin.php`)
    pub fn new(api_url: &str, plugin_file: &Path, version: &str) -> Self {
        let slug = plugin_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            api_url: trailing_slash(api_url),
            slug,
            full_id: plugin_basename(plugin_file),
            version: version.to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Key used for this plugin in bulk-check payloads and pending updates
    pub fn full_id(&self) -> &str {
        &self.full_id
    }

    /// Installed version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Folder portion of the full id, used to recognise this plugin in
    /// bulk-check payloads regardless of its main file name
    pub fn folder(&self) -> &str {
        folder_of(&self.full_id)
    }
}

fn trailing_slash(url: &str) -> String {
    format!("{}/", url.trim_end_matches(['/', '\\']))
}

/// `<folder>/<file>` for a plugin living in its own folder, `<file>` otherwise
fn plugin_basename(plugin_file: &Path) -> String {
    let file_name = plugin_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let folder = plugin_file
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned());

    match folder {
        Some(folder) if !folder.is_empty() => format!("{}/{}", folder, file_name),
        _ => file_name,
    }
}

/// Credentials and extra parameters merged into every remote request
///
/// Values are URL-escaped when the credentials are built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteCredentials {
    params: IndexMap<String, String>,
}

impl RemoteCredentials {
    pub fn new(api_data: Option<&ApiData>) -> Self {
        let Some(api_data) = api_data else {
            return Self::default();
        };

        let mut params = IndexMap::new();
        params.insert("key".to_string(), escape(&api_data.key));
        params.insert("product".to_string(), escape(&api_data.product));
        params.insert("version".to_string(), escape(&api_data.version));
        for (name, value) in &api_data.extra {
            params.insert(name.clone(), escape(value));
        }

        Self { params }
    }

    pub fn product_id(&self) -> &str {
        self.get("product")
    }

    pub fn access_key(&self) -> &str {
        self.get("key")
    }

    fn get(&self, name: &str) -> &str {
        self.params.get(name).map(String::as_str).unwrap_or_default()
    }

    /// Credentials overlaid with request parameters; request parameters win
    pub fn merged_with(&self, extra: &IndexMap<String, String>) -> IndexMap<String, String> {
        let mut merged = self.params.clone();
        for (name, value) in extra {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }
}

/// Form-style escaping: space becomes `+` and `~` is escaped
fn escape(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%20", "+")
        .replace('~', "%7E")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/srv/plugins/my-plugin/my-plugin.php", "my-plugin", "my-plugin/my-plugin.php")]
    #[case("my-plugin/loader.php", "loader", "my-plugin/loader.php")]
    #[case("hello.php", "hello", "hello.php")]
    fn new_derives_slug_and_full_id(
        #[case] plugin_file: &str,
        #[case] slug: &str,
        #[case] full_id: &str,
    ) {
        let identity = ClientIdentity::new("https://u.example.com", Path::new(plugin_file), "1.0");

        assert_eq!(identity.slug(), slug);
        assert_eq!(identity.full_id(), full_id);
    }

    #[rstest]
    #[case("https://u.example.com", "https://u.example.com/")]
    #[case("https://u.example.com/api/", "https://u.example.com/api/")]
    #[case("https://u.example.com//", "https://u.example.com/")]
    fn new_normalizes_trailing_slash(#[case] api_url: &str, #[case] expected: &str) {
        let identity = ClientIdentity::new(api_url, Path::new("a/a.php"), "1.0");
        assert_eq!(identity.api_url(), expected);
    }

    #[test]
    fn folder_is_directory_of_full_id() {
        let identity = ClientIdentity::new("https://u", Path::new("/p/my-slug/my-slug.php"), "1");
        assert_eq!(identity.folder(), "my-slug");
    }

    #[test]
    fn credentials_are_url_escaped() {
        let api_data = ApiData {
            key: "abc 123~".to_string(),
            product: "Pro & Co".to_string(),
            version: "1.0.0".to_string(),
            extra: IndexMap::from([("site".to_string(), "a/b".to_string())]),
        };

        let credentials = RemoteCredentials::new(Some(&api_data));

        assert_eq!(credentials.access_key(), "abc+123%7E");
        assert_eq!(credentials.product_id(), "Pro+%26+Co");
        let merged = credentials.merged_with(&IndexMap::new());
        assert_eq!(merged.get("site").map(String::as_str), Some("a%2Fb"));
    }

    #[test]
    fn merged_with_lets_request_parameters_win() {
        let api_data = ApiData {
            key: "k".to_string(),
            extra: IndexMap::from([("slug".to_string(), "other".to_string())]),
            ..Default::default()
        };
        let credentials = RemoteCredentials::new(Some(&api_data));

        let merged =
            credentials.merged_with(&IndexMap::from([("slug".to_string(), "mine".to_string())]));

        assert_eq!(merged.get("slug").map(String::as_str), Some("mine"));
        assert_eq!(merged.get("key").map(String::as_str), Some("k"));
    }

    #[test]
    fn missing_api_data_yields_empty_credentials() {
        let credentials = RemoteCredentials::new(None);
        assert_eq!(credentials.access_key(), "");
        assert!(credentials.merged_with(&IndexMap::new()).is_empty());
    }
}
