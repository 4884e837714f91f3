//! Request path resolution module
//!
//! Maps a decoded URL path onto the configured root directory, enforcing
//! the router prefix, the index-file default, and root containment.

use crate::config::StaticOptions;
use std::path::{Component, Path, PathBuf};

/// Router-prefix miss: the request belongs to the next handler, not us
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutsideRouter;

/// Resolve a decoded request path to a candidate filesystem path.
///
/// The router prefix is stripped, a trailing separator pulls in the index
/// file, and the remainder is joined onto the root. Traversal segments are
/// neutralized before the join, so the result cannot escape the root.
pub fn resolve(decoded_path: &str, opts: &StaticOptions) -> Result<PathBuf, OutsideRouter> {
    let Some(rest) = decoded_path.strip_prefix(opts.router.as_str()) else {
        return Err(OutsideRouter);
    };

    let mut rest = rest.to_string();
    if rest.ends_with('/') {
        rest.push_str(&opts.index);
    }

    Ok(opts.root.join(sanitize(&rest)))
}

/// Reduce a request-relative path to plain components.
///
/// `..` pops within the relative part only and `.` disappears, which keeps
/// every resolvable path inside the root it is later joined onto.
fn sanitize(path: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in Path::new(path).components() {
        match comp {
            Component::Normal(c) => {
                out.push(c);
            }
            Component::ParentDir => {
                out.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheOption, ZipPolicy};

    fn options(router: &str) -> StaticOptions {
        StaticOptions {
            router: router.to_string(),
            root: PathBuf::from("/var/www"),
            index: "index.html".to_string(),
            methods: vec!["GET".to_string(), "HEAD".to_string()],
            zip: ZipPolicy::default(),
            cache: CacheOption::default(),
            etag: false,
        }
    }

    #[test]
    fn test_plain_file() {
        let opts = options("");
        assert_eq!(
            resolve("/site/app.js", &opts).unwrap(),
            PathBuf::from("/var/www/site/app.js")
        );
    }

    #[test]
    fn test_trailing_slash_appends_index() {
        let opts = options("");
        assert_eq!(
            resolve("/docs/", &opts).unwrap(),
            PathBuf::from("/var/www/docs/index.html")
        );
        assert_eq!(
            resolve("/", &opts).unwrap(),
            PathBuf::from("/var/www/index.html")
        );
    }

    #[test]
    fn test_router_prefix_stripped() {
        let opts = options("/assets");
        assert_eq!(
            resolve("/assets/logo.png", &opts).unwrap(),
            PathBuf::from("/var/www/logo.png")
        );
    }

    #[test]
    fn test_outside_router_is_a_miss() {
        let opts = options("/assets");
        assert_eq!(resolve("/other/logo.png", &opts), Err(OutsideRouter));
    }

    #[test]
    fn test_bare_prefix_resolves_to_root() {
        let opts = options("/assets");
        assert_eq!(resolve("/assets", &opts).unwrap(), PathBuf::from("/var/www"));
    }

    #[test]
    fn test_traversal_cannot_escape_root() {
        let opts = options("");
        assert_eq!(
            resolve("/../../etc/passwd", &opts).unwrap(),
            PathBuf::from("/var/www/etc/passwd")
        );
        assert_eq!(
            resolve("/a/../../b.txt", &opts).unwrap(),
            PathBuf::from("/var/www/b.txt")
        );
    }

    #[test]
    fn test_dot_segments_collapse() {
        let opts = options("");
        assert_eq!(
            resolve("/a/./b/../c.txt", &opts).unwrap(),
            PathBuf::from("/var/www/a/c.txt")
        );
    }
}
