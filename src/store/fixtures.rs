//! Bundled sample shelf, used to seed a local in-memory store and as test
//! data.

use time::macros::datetime;

use crate::modules::books::models::{Book, Genre};

pub const SAMPLE_CURATOR: &str = "sample-curator";

pub fn sample_books() -> Vec<Book> {
    let entries = [
        (
            "sample-1",
            "The Midnight Library",
            "Matt Haig",
            Genre::Fiction,
            5,
            "Between life and death there is a library, and within that library the shelves go on forever.",
            12,
            datetime!(2024-05-02 09:15 UTC),
        ),
        (
            "sample-2",
            "Project Hail Mary",
            "Andy Weir",
            Genre::SciFi,
            5,
            "A lone astronaut wakes up with no memory and the fate of humanity on his shoulders.",
            18,
            datetime!(2024-05-06 18:40 UTC),
        ),
        (
            "sample-3",
            "Atomic Habits",
            "James Clear",
            Genre::NonFiction,
            4,
            "Tiny changes, remarkable results: a practical guide to building good habits.",
            9,
            datetime!(2024-04-21 07:05 UTC),
        ),
        (
            "sample-4",
            "The Silent Patient",
            "Alex Michaelides",
            Genre::Thriller,
            4,
            "A painter shoots her husband and then never speaks another word.",
            7,
            datetime!(2024-05-10 21:30 UTC),
        ),
        (
            "sample-5",
            "Pride and Prejudice",
            "Jane Austen",
            Genre::Romance,
            5,
            "Elizabeth Bennet and Mr. Darcy, and the misunderstandings between them.",
            15,
            datetime!(2024-03-30 12:00 UTC),
        ),
        (
            "sample-6",
            "The Thursday Murder Club",
            "Richard Osman",
            Genre::Mystery,
            4,
            "Four retirees meet weekly to investigate unsolved murders, until one lands on their doorstep.",
            6,
            datetime!(2024-05-12 15:45 UTC),
        ),
    ];

    entries
        .into_iter()
        .map(
            |(id, title, author, genre, rating, description, likes, created_at)| Book {
                id: id.to_string(),
                title: title.to_string(),
                author: author.to_string(),
                genre,
                rating,
                description: description.to_string(),
                likes,
                created_at,
                user_id: SAMPLE_CURATOR.to_string(),
            },
        )
        .collect()
}
