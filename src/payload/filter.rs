//! Removal of this plugin's entry from a bulk-check plugin map

use serde_json::{Map, Value};

/// Folder portion of a plugin id, with `dirname` semantics
///
/// `"a/a.php"` -> `"a"`, `"hello.php"` -> `"."`, `"/a.php"` -> `"/"`
pub fn folder_of(id: &str) -> &str {
    match id.rfind('/') {
        Some(0) => "/",
        Some(index) => &id[..index],
        None => ".",
    }
}

/// Removes the entry whose folder equals `folder` and returns its key
///
/// Plugins are matched by folder because the main file name is not stable.
/// When several keys share the folder only the last one seen is removed.
/// The order of the remaining entries is preserved.
pub fn remove_component(plugins: &mut Map<String, Value>, folder: &str) -> Option<String> {
    let mut to_remove = None;
    for key in plugins.keys() {
        if folder_of(key) == folder {
            to_remove = Some(key.clone());
        }
    }

    let key = to_remove?;
    plugins.shift_remove(&key);
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn plugins(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[rstest]
    #[case("a/a.php", "a")]
    #[case("nested/dir/main.php", "nested/dir")]
    #[case("hello.php", ".")]
    #[case("/a.php", "/")]
    fn test_folder_of(#[case] id: &str, #[case] expected: &str) {
        assert_eq!(folder_of(id), expected);
    }

    #[test]
    fn remove_component_removes_matching_folder_only() {
        let mut map = plugins(json!({
            "a/a.php": {},
            "my-slug/my-slug.php": {"Version": "1.0"},
            "z/z.php": {}
        }));

        let removed = remove_component(&mut map, "my-slug");

        assert_eq!(removed.as_deref(), Some("my-slug/my-slug.php"));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a/a.php", "z/z.php"]);
    }

    #[test]
    fn remove_component_matches_any_main_file_in_folder() {
        let mut map = plugins(json!({"my-slug/loader.php": {}, "a/a.php": {}}));

        let removed = remove_component(&mut map, "my-slug");

        assert_eq!(removed.as_deref(), Some("my-slug/loader.php"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn remove_component_removes_only_last_of_several_matches() {
        let mut map = plugins(json!({
            "my-slug/first.php": {},
            "my-slug/second.php": {},
            "a/a.php": {}
        }));

        let removed = remove_component(&mut map, "my-slug");

        assert_eq!(removed.as_deref(), Some("my-slug/second.php"));
        assert_eq!(
            map.keys().collect::<Vec<_>>(),
            vec!["my-slug/first.php", "a/a.php"]
        );
    }

    #[test]
    fn remove_component_without_match_leaves_map_untouched() {
        let mut map = plugins(json!({"a/a.php": {}, "b/b.php": {}}));
        let before = map.clone();

        assert_eq!(remove_component(&mut map, "my-slug"), None);
        assert_eq!(map, before);
    }
}
