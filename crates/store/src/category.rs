use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Record category.
///
/// The recognized categories change how a record is checked or listed. Any
/// other value is carried through as [`Other`](Self::Other): it is stored and
/// written back verbatim, but triggers no special behavior.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// A redirect response is acceptable regardless of its status code.
    RedirectOk,
    /// The live content type is not compared with the recorded one.
    ContentTypeChangeOk,
    /// The record is excluded from every listing.
    Deprecated,
    /// Unrecognized category, preserved opaquely.
    Other(String),
}
impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Self::RedirectOk => "redirect-ok",
            Self::ContentTypeChangeOk => "content-type-change-ok",
            Self::Deprecated => "deprecated",
            Self::Other(s) => s,
        }
    }

    /// Returns `true` for categories that carry no behavior.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Other(_))
    }
}
impl FromStr for Category {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "redirect-ok" => Self::RedirectOk,
            "content-type-change-ok" => Self::ContentTypeChangeOk,
            "deprecated" => Self::Deprecated,
            other => Self::Other(other.to_string()),
        })
    }
}
impl From<&str> for Category {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(category) => category,
            Err(never) => match never {},
        }
    }
}
impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
// Sets of categories are written to disk in sorted order, so order by the
// stored string rather than by variant.
impl Ord for Category {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}
impl PartialOrd for Category {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::BTreeSet;

    #[rstest]
    #[case("redirect-ok", Category::RedirectOk)]
    #[case("content-type-change-ok", Category::ContentTypeChangeOk)]
    #[case("deprecated", Category::Deprecated)]
    #[case("redirect_ok", Category::Other("redirect_ok".to_string()))]
    #[case("Deprecated", Category::Other("Deprecated".to_string()))]
    fn test_parse(#[case] input: &str, #[case] expected: Category) {
        assert_eq!(Category::from(input), expected);
        assert_eq!(Category::from(input).as_str(), input);
    }

    #[test]
    fn test_sorted_by_string() {
        let set: BTreeSet<Category> = ["redirect-ok", "zz-custom", "deprecated", "api"]
            .into_iter()
            .map(Category::from)
            .collect();
        let names: Vec<_> = set.iter().map(Category::as_str).collect();
        assert_eq!(names, ["api", "deprecated", "redirect-ok", "zz-custom"]);
    }
}
