use crate::actor::fs::WatchRoot;
use crate::config::WatchConfig;

/// Watch set for `config`: the base path recursively, plus the config
/// file's directory when the config lives outside the base path.
pub(crate) fn collect_watch_roots(config: &WatchConfig) -> Vec<WatchRoot> {
    let root = config.get_root();
    let mut roots = vec![WatchRoot::recursive(root)];

    if !config.config_path.starts_with(root)
        && let Some(dir) = config.config_path.parent()
    {
        roots.push(WatchRoot::flat(dir));
    }

    roots
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_config_inside_base_path() {
        let config = test_parse_config("");
        let roots = collect_watch_roots(&config);
        assert_eq!(roots, vec![WatchRoot::recursive("/project")]);
    }

    #[test]
    fn test_config_outside_base_path() {
        let mut config = test_parse_config("");
        config.root = PathBuf::from("/project/site");
        config.config_path = PathBuf::from("/etc/watchreload/watchreload.toml");

        let roots = collect_watch_roots(&config);
        assert_eq!(
            roots,
            vec![
                WatchRoot::recursive("/project/site"),
                WatchRoot::flat("/etc/watchreload"),
            ]
        );
    }
}
