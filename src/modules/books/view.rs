//! List view derivation: search, genre filter and sort over the full book
//! set, plus the random pick and card presentation.

use rand::{seq::SliceRandom, Rng};
use time::OffsetDateTime;

use super::models::{Book, BookCard, SortKey, ViewQuery};
use crate::utils;

/// Cards newer than this many whole days get the "new" badge.
pub const NEW_BADGE_DAYS: i64 = 3;
/// Characters of description shown on a card.
pub const EXCERPT_CHARS: usize = 150;

/// Filter then sort `books` for display.
///
/// Search is a case-insensitive substring match on title or author (an
/// empty search matches everything); the genre filter is exact. Sorting is
/// stable, so books that tie keep their relative input order.
pub fn derive_view(books: &[Book], query: &ViewQuery) -> Vec<Book> {
    let needle = query.search.to_lowercase();

    let mut view: Vec<Book> = books
        .iter()
        .filter(|book| matches_search(book, &needle))
        .filter(|book| query.genre.matches(book.genre))
        .cloned()
        .collect();

    match query.sort {
        SortKey::Latest => view.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Oldest => view.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortKey::MostLiked => view.sort_by(|a, b| b.likes.cmp(&a.likes)),
    }

    view
}

fn matches_search(book: &Book, needle: &str) -> bool {
    needle.is_empty()
        || book.title.to_lowercase().contains(needle)
        || book.author.to_lowercase().contains(needle)
}

/// Uniform pick over the whole list, ignoring the active filters.
pub fn random_pick<'a, R: Rng + ?Sized>(books: &'a [Book], rng: &mut R) -> Option<&'a Book> {
    books.choose(rng)
}

pub fn to_card(book: Book, now: OffsetDateTime) -> BookCard {
    BookCard {
        is_new: utils::days_since(book.created_at, now) <= NEW_BADGE_DAYS,
        excerpt: utils::truncate_text(&book.description, EXCERPT_CHARS),
        book,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::{Genre, GenreFilter};
    use rand::{rngs::StdRng, SeedableRng};
    use time::macros::datetime;

    fn book(id: &str, genre: Genre, title: &str, author: &str, likes: u32, day: u8) -> Book {
        Book {
            id: id.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            genre,
            rating: 4,
            description: format!("About {title}"),
            likes,
            created_at: datetime!(2024-01-01 00:00 UTC) + time::Duration::days(day.into()),
            user_id: "curator".to_string(),
        }
    }

    fn dune_and_foundation() -> Vec<Book> {
        vec![
            book("1", Genre::Fiction, "Dune", "Herbert", 2, 1),
            book("2", Genre::SciFi, "Foundation", "Asimov", 5, 2),
        ]
    }

    fn shelf() -> Vec<Book> {
        vec![
            book("1", Genre::Fiction, "Dune", "Frank Herbert", 2, 1),
            book("2", Genre::SciFi, "Foundation", "Isaac Asimov", 5, 2),
            book("3", Genre::SciFi, "I, Robot", "Isaac Asimov", 5, 3),
            book("4", Genre::Mystery, "The Hound of the Baskervilles", "Arthur Conan Doyle", 0, 4),
            book("5", Genre::Romance, "Persuasion", "Jane Austen", 7, 0),
            book("6", Genre::SciFi, "Hyperion", "Dan Simmons", 2, 5),
        ]
    }

    fn ids(books: &[Book]) -> Vec<&str> {
        books.iter().map(|book| book.id.as_str()).collect()
    }

    fn query(search: &str, genre: GenreFilter, sort: SortKey) -> ViewQuery {
        ViewQuery {
            search: search.to_string(),
            genre,
            sort,
        }
    }

    #[test]
    fn most_liked_orders_foundation_before_dune() {
        let view = derive_view(
            &dune_and_foundation(),
            &query("", GenreFilter::All, SortKey::MostLiked),
        );
        assert_eq!(ids(&view), vec!["2", "1"]);
    }

    #[test]
    fn search_is_case_insensitive_on_title() {
        let view = derive_view(
            &dune_and_foundation(),
            &query("dune", GenreFilter::All, SortKey::Latest),
        );
        assert_eq!(ids(&view), vec!["1"]);
    }

    #[test]
    fn empty_search_and_all_genre_only_sorts() {
        let books = shelf();
        for sort in [SortKey::Latest, SortKey::Oldest, SortKey::MostLiked] {
            let view = derive_view(&books, &query("", GenreFilter::All, sort));
            assert_eq!(view.len(), books.len());
        }
        let latest = derive_view(&books, &query("", GenreFilter::All, SortKey::Latest));
        assert_eq!(ids(&latest), vec!["6", "4", "3", "2", "1", "5"]);
    }

    #[test]
    fn search_matches_author_and_keeps_all_hits() {
        let books = shelf();
        let view = derive_view(&books, &query("ASIMOV", GenreFilter::All, SortKey::Oldest));
        assert_eq!(ids(&view), vec!["2", "3"]);

        for book in &view {
            let hay = format!("{} {}", book.title, book.author).to_lowercase();
            assert!(hay.contains("asimov"));
        }
    }

    #[test]
    fn genre_filter_is_exact_and_conjunctive_with_search() {
        let books = shelf();
        let sci_fi = derive_view(
            &books,
            &query("", GenreFilter::Only(Genre::SciFi), SortKey::Latest),
        );
        assert!(sci_fi.iter().all(|book| book.genre == Genre::SciFi));
        assert_eq!(sci_fi.len(), 3);

        let both = derive_view(
            &books,
            &query("simmons", GenreFilter::Only(Genre::SciFi), SortKey::Latest),
        );
        assert_eq!(ids(&both), vec!["6"]);

        let none = derive_view(
            &books,
            &query("simmons", GenreFilter::Only(Genre::Fiction), SortKey::Latest),
        );
        assert!(none.is_empty());
    }

    #[test]
    fn sort_orders_are_monotonic() {
        let books = shelf();

        let latest = derive_view(&books, &query("", GenreFilter::All, SortKey::Latest));
        assert!(latest.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        let oldest = derive_view(&books, &query("", GenreFilter::All, SortKey::Oldest));
        assert!(oldest.windows(2).all(|w| w[0].created_at <= w[1].created_at));

        let liked = derive_view(&books, &query("", GenreFilter::All, SortKey::MostLiked));
        assert!(liked.windows(2).all(|w| w[0].likes >= w[1].likes));
    }

    #[test]
    fn ties_keep_input_order() {
        let books = shelf();
        let liked = derive_view(&books, &query("", GenreFilter::All, SortKey::MostLiked));
        // 2 and 3 tie at five likes, 1 and 6 at two.
        assert_eq!(ids(&liked), vec!["5", "2", "3", "1", "6", "4"]);

        let mut reversed = books.clone();
        reversed.reverse();
        let liked = derive_view(&reversed, &query("", GenreFilter::All, SortKey::MostLiked));
        assert_eq!(ids(&liked), vec!["5", "3", "2", "6", "1", "4"]);
    }

    #[test]
    fn derive_view_is_idempotent() {
        let books = shelf();
        let q = query("a", GenreFilter::Only(Genre::SciFi), SortKey::MostLiked);
        assert_eq!(derive_view(&books, &q), derive_view(&books, &q));
    }

    #[test]
    fn random_pick_comes_from_the_list() {
        let books = shelf();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let pick = random_pick(&books, &mut rng).unwrap();
            assert!(books.contains(pick));
        }
        assert!(random_pick(&[], &mut rng).is_none());
    }

    #[test]
    fn cards_flag_recent_books_and_trim_descriptions() {
        let mut recent = book("1", Genre::Fiction, "Dune", "Herbert", 0, 0);
        recent.description = "x".repeat(200);
        let now = recent.created_at + time::Duration::days(3);

        let card = to_card(recent.clone(), now);
        assert!(card.is_new);
        assert_eq!(card.excerpt.chars().count(), EXCERPT_CHARS + 3);

        let card = to_card(recent, now + time::Duration::days(1));
        assert!(!card.is_new);
    }
}
