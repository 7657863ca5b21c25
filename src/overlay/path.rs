use crate::ast::Query;

/// A segment in a navigable path used to address a diff location.
///
/// Paths are built while walking two documents side by side and turned into
/// action targets with [`to_query`].
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Mapping member by key
    ///
    /// # Examples
    /// - `Field("info")` → `.info`
    /// - `Field("x-owner")` → `['x-owner']`
    Field(String),

    /// Sequence element by position
    ///
    /// # Examples
    /// - `Index(0)` → `[0]`
    Index(usize),
}

/// A sequence of path segments from the document root.
///
/// # Examples
///
/// For the target `$.paths['/users'].get`, the path would be:
/// - `PathSegment::Field("paths")`
/// - `PathSegment::Field("/users")`
/// - `PathSegment::Field("get")`
pub type Path = Vec<PathSegment>;

/// Returns `path` extended by one segment.
pub fn join(path: &[PathSegment], segment: PathSegment) -> Path {
    let mut joined = path.to_vec();
    joined.push(segment);
    joined
}

/// Build the absolute singular query that selects `path`
pub fn to_query(path: &[PathSegment]) -> Query {
    path.iter().fold(Query::root(), |query, segment| match segment {
        PathSegment::Field(name) => query.child(name),
        PathSegment::Index(i) => query.index(*i as i64),
    })
}

/// Target string for `path`
pub fn to_target(path: &[PathSegment]) -> String {
    to_query(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthand_and_bracket_names() {
        let path = vec![
            PathSegment::Field("paths".to_string()),
            PathSegment::Field("/users".to_string()),
            PathSegment::Index(2),
            PathSegment::Field("it's".to_string()),
        ];
        assert_eq!(to_target(&path), r"$.paths['/users'][2]['it\'s']");
    }

    #[test]
    fn test_empty_path_is_root() {
        assert_eq!(to_target(&[]), "$");
    }

    #[test]
    fn test_targets_reparse() {
        let path = vec![
            PathSegment::Field("a b".to_string()),
            PathSegment::Field("true".to_string()),
        ];
        let target = to_target(&path);
        assert_eq!(crate::parse(&target).unwrap(), to_query(&path));
    }
}
