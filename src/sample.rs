//! The "music" sample dataset the CLI operates on by default.
//!
//! Tables are keyed by `Artist` (hash) and `SongTitle` (range).

use aws_sdk_dynamodb::types::{AttributeValue, ProjectionType};

use crate::Item;
use crate::expression::Condition;
use crate::table_operations::{
    IndexDefinition, KeyAttribute, TableDefinition, Throughput, default_index_name,
};
use crate::transaction_operations::{TransactionBatch, WriteOperation, build_batch};

/// Table used by most item commands.
pub const TEST_TABLE: &str = "music-test";

/// Table holding the pre-loaded catalogue and its indexes.
pub const DEFAULT_TABLE: &str = "music-default";

pub const ARTIST: &str = "Artist";
pub const SONG_TITLE: &str = "SongTitle";
pub const ALBUM_TITLE: &str = "AlbumTitle";
pub const LENGTH: &str = "Length";
pub const AWARDS: &str = "Awards";

/// Index on `music-default` ordered by song length within an album.
pub const ALBUM_LENGTH_INDEX: &str = "AlbumTitle-Length-index";

fn s(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}

fn n(value: impl ToString) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

fn suffixed(base: &str, idx: Option<u32>) -> String {
    match idx {
        Some(i) => format!("{}-{}", base, i),
        None => base.to_string(),
    }
}

/// The music table: `Artist`/`SongTitle` strings, 10 RCU / 5 WCU.
pub fn music_table(table: &str) -> TableDefinition {
    TableDefinition {
        table: table.to_string(),
        hash_key: KeyAttribute::string(ARTIST),
        range_key: Some(KeyAttribute::string(SONG_TITLE)),
        throughput: Some(Throughput { read: 10, write: 5 }),
    }
}

/// Global secondary index hashed on `Length`, projecting all attributes.
pub fn length_index(table: &str, index_name: Option<String>) -> IndexDefinition {
    IndexDefinition {
        table: table.to_string(),
        index_name: index_name.unwrap_or_else(|| default_index_name(table, LENGTH)),
        hash_key: KeyAttribute::number(LENGTH),
        range_key: None,
        projection: ProjectionType::All,
        throughput: Some(Throughput { read: 1, write: 1 }),
    }
}

/// Key of the sample song, optionally numbered.
pub fn song_key(idx: Option<u32>) -> Item {
    Item::from([
        (ARTIST.to_string(), s(suffixed("No One You Know", idx))),
        (SONG_TITLE.to_string(), s(suffixed("Call Me Today", idx))),
    ])
}

/// The full sample song item.
pub fn song_item(idx: Option<u32>, length: u32, awards: u32) -> Item {
    let mut item = song_key(idx);
    item.insert(ALBUM_TITLE.to_string(), s(suffixed("Greatest Hits", idx)));
    item.insert(LENGTH.to_string(), n(length));
    item.insert(AWARDS.to_string(), n(awards));
    item
}

pub fn random_length() -> u32 {
    rand::random_range(0..100)
}

pub fn random_awards() -> u32 {
    rand::random_range(0..2)
}

/// `amount` numbered songs (1-based) with random length and awards.
pub fn song_items(amount: u32) -> Vec<Item> {
    (1..=amount)
        .map(|i| song_item(Some(i), random_length(), random_awards()))
        .collect()
}

/// Key condition for the first numbered artist's songs.
pub fn first_artist_songs() -> Condition {
    Condition::eq(ARTIST, s("No One You Know-1"))
        .and(Condition::begins_with(SONG_TITLE, s("Call Me Today")))
}

/// Scan filter for short award-winning songs.
pub fn length_and_awards_filter(length: u32, awards: u32) -> Condition {
    Condition::eq(LENGTH, n(length)).and(Condition::eq(AWARDS, n(awards)))
}

/// Key condition for albums in the album/length index.
pub fn album_condition(album: &str) -> Condition {
    Condition::eq(ALBUM_TITLE, s(album))
}

/// Key condition on the length index.
pub fn length_condition(length: u32) -> Condition {
    Condition::eq(LENGTH, n(length))
}

fn user_key(artist: &str, song_title: &str) -> Item {
    Item::from([
        (ARTIST.to_string(), s(format!("USER#{}", artist))),
        (SONG_TITLE.to_string(), s(format!("SONG#{}", song_title))),
    ])
}

fn length_payload(length: u32) -> Item {
    Item::from([(LENGTH.to_string(), n(length))])
}

/// Register a user in both music tables; fails if either entry exists.
pub fn create_new_user_batch(artist: &str, song_title: &str, length: u32) -> TransactionBatch {
    build_batch([
        WriteOperation::insert(DEFAULT_TABLE, user_key(artist, song_title), length_payload(length)),
        WriteOperation::insert(TEST_TABLE, user_key(artist, song_title), Item::new()),
    ])
}

/// Same writes as [`create_new_user_batch`], overwriting existing entries.
pub fn update_new_user_batch(artist: &str, song_title: &str, length: u32) -> TransactionBatch {
    build_batch([
        WriteOperation::put(DEFAULT_TABLE, user_key(artist, song_title), length_payload(length)),
        WriteOperation::put(TEST_TABLE, user_key(artist, song_title), Item::new()),
    ])
}

/// Require the user to exist, then record a second song for them.
///
/// The check and the put target different items; a transaction may not
/// touch one item twice.
pub fn update_user_batch(artist: &str, song_title: &str, length: u32) -> TransactionBatch {
    let existing = user_key(artist, song_title);
    let check = Condition::attribute_exists(ARTIST).build("c");
    build_batch([
        WriteOperation::condition_check(TEST_TABLE, existing, check),
        WriteOperation::put(
            TEST_TABLE,
            user_key(&format!("{}2", artist), &format!("{}2", song_title)),
            length_payload(length),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_song_key() {
        let key = song_key(Some(3));
        assert_eq!(key[ARTIST], s("No One You Know-3"));
        assert_eq!(key[SONG_TITLE], s("Call Me Today-3"));
        assert_eq!(song_key(None)[ARTIST], s("No One You Know"));
    }

    #[test]
    fn generated_songs_are_in_range() {
        let items = song_items(20);
        assert_eq!(items.len(), 20);
        for item in &items {
            let AttributeValue::N(length) = &item[LENGTH] else {
                panic!("Length is not a number");
            };
            assert!(length.parse::<u32>().unwrap() < 100);
        }
        assert_eq!(items[19][ALBUM_TITLE], s("Greatest Hits-20"));
    }

    #[test]
    fn new_user_batch_inserts_into_both_tables() {
        let batch = create_new_user_batch("default", "default", 7);
        let ops = batch.operations();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].table(), DEFAULT_TABLE);
        assert_eq!(ops[1].table(), TEST_TABLE);
        assert!(ops.iter().all(|op| op.kind() == "insert"));
    }

    #[test]
    fn update_user_batch_checks_then_puts() {
        let batch = update_user_batch("default", "default", 7);
        let ops = batch.operations();
        assert_eq!(ops[0].kind(), "condition_check");
        assert_eq!(ops[1].key()[ARTIST], s("USER#default2"));
    }
}
