use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The fixed set of genres a recommendation can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Fiction,
    #[serde(rename = "Non-fiction")]
    NonFiction,
    #[serde(rename = "Sci-Fi")]
    SciFi,
    Romance,
    Thriller,
    Mystery,
}

impl Genre {
    pub const ALL: [Genre; 6] = [
        Genre::Fiction,
        Genre::NonFiction,
        Genre::SciFi,
        Genre::Romance,
        Genre::Thriller,
        Genre::Mystery,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Genre::Fiction => "Fiction",
            Genre::NonFiction => "Non-fiction",
            Genre::SciFi => "Sci-Fi",
            Genre::Romance => "Romance",
            Genre::Thriller => "Thriller",
            Genre::Mystery => "Mystery",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown genre '{0}'")]
pub struct UnknownGenre(pub String);

impl FromStr for Genre {
    type Err = UnknownGenre;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|genre| genre.as_str() == s)
            .ok_or_else(|| UnknownGenre(s.to_string()))
    }
}

/// Genre filter of the list view; `All` disables filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GenreFilter {
    #[default]
    All,
    Only(Genre),
}

impl GenreFilter {
    pub const ALL_LABEL: &'static str = "All";

    pub fn matches(self, genre: Genre) -> bool {
        match self {
            GenreFilter::All => true,
            GenreFilter::Only(wanted) => wanted == genre,
        }
    }

    /// Every choice offered by the filter control, `All` first.
    pub fn options() -> Vec<GenreFilter> {
        std::iter::once(GenreFilter::All)
            .chain(Genre::ALL.into_iter().map(GenreFilter::Only))
            .collect()
    }
}

impl FromStr for GenreFilter {
    type Err = UnknownGenre;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::ALL_LABEL {
            return Ok(GenreFilter::All);
        }
        s.parse().map(GenreFilter::Only)
    }
}

impl TryFrom<String> for GenreFilter {
    type Error = UnknownGenre;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GenreFilter> for String {
    fn from(filter: GenreFilter) -> Self {
        filter.to_string()
    }
}

impl fmt::Display for GenreFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenreFilter::All => f.write_str(Self::ALL_LABEL),
            GenreFilter::Only(genre) => fmt::Display::fmt(genre, f),
        }
    }
}

/// Ordering of the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Newest first
    #[default]
    Latest,
    Oldest,
    MostLiked,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort '{0}'; expected latest, oldest or most-liked")]
pub struct UnknownSort(pub String);

impl FromStr for SortKey {
    type Err = UnknownSort;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(SortKey::Latest),
            "oldest" => Ok(SortKey::Oldest),
            "most-liked" => Ok(SortKey::MostLiked),
            other => Err(UnknownSort(other.to_string())),
        }
    }
}

/// Search, genre and sort state of the list view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewQuery {
    pub search: String,
    pub genre: GenreFilter,
    pub sort: SortKey,
}

/// A stored recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: Genre,
    /// 1 to 5 stars
    pub rating: u8,
    pub description: String,
    /// Denormalized count of like relationships
    pub likes: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Submitting user
    pub user_id: String,
}

/// Submission form payload. Fields stay loosely typed so every problem can
/// be reported at once instead of failing on the first bad field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub rating: i64,
    pub description: String,
}

/// One user having liked one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeRelation {
    pub book_id: String,
    pub user_id: String,
}

impl LikeRelation {
    pub fn new(book_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            book_id: book_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Result of a like toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikeOutcome {
    pub book_id: String,
    /// Whether the caller likes the book after the toggle
    pub liked: bool,
    pub likes: u32,
}

/// A book as rendered in the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookCard {
    #[serde(flatten)]
    pub book: Book,
    /// Added within the last few days
    pub is_new: bool,
    pub excerpt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genre_wire_names_round_trip_through_from_str() {
        for genre in Genre::ALL {
            assert_eq!(genre.as_str().parse::<Genre>().unwrap(), genre);
            assert_eq!(
                serde_json::to_value(genre).unwrap(),
                serde_json::json!(genre.as_str())
            );
        }
        assert!("sci-fi".parse::<Genre>().is_err());
    }

    #[test]
    fn genre_filter_all_is_a_sentinel() {
        assert_eq!("All".parse::<GenreFilter>().unwrap(), GenreFilter::All);
        assert_eq!(
            "Non-fiction".parse::<GenreFilter>().unwrap(),
            GenreFilter::Only(Genre::NonFiction)
        );
        assert!(GenreFilter::All.matches(Genre::Mystery));
        assert!(!GenreFilter::Only(Genre::Fiction).matches(Genre::Mystery));
        assert_eq!(GenreFilter::options().len(), 7);
        assert_eq!(GenreFilter::options()[0].to_string(), "All");
    }

    #[test]
    fn sort_key_uses_literal_modes() {
        assert_eq!("most-liked".parse::<SortKey>().unwrap(), SortKey::MostLiked);
        assert_eq!(
            serde_json::to_value(SortKey::MostLiked).unwrap(),
            serde_json::json!("most-liked")
        );
        assert!("popular".parse::<SortKey>().is_err());
        assert_eq!(SortKey::default(), SortKey::Latest);
    }

    #[test]
    fn view_query_defaults_when_fields_missing() {
        let query: ViewQuery = serde_json::from_value(serde_json::json!({"search": "dune"})).unwrap();
        assert_eq!(query.search, "dune");
        assert_eq!(query.genre, GenreFilter::All);
        assert_eq!(query.sort, SortKey::Latest);

        let bad = serde_json::from_value::<ViewQuery>(serde_json::json!({"genre": "Poetry"}));
        assert!(bad.is_err());
    }
}
