//! Delimited record format
//!
//! One record per line:
//! - entity: `id<d>attr1<d>attr2<d>title`
//! - list: `id<d>name<d>owner`
//! - membership: `listId<d>entityId`
//!
//! Titles and list names may contain the delimiter: the title is the
//! last entity field, and a list name is everything between the first
//! and last delimiter. Numeric fields tolerate surrounding whitespace;
//! text fields are stored verbatim.

use crate::models::{ListRecord, MediaEntity};
use crate::storage::error::{StoreError, StoreResult};

/// Default field delimiter
pub const DEFAULT_DELIMITER: char = ',';

/// Encoder/decoder for one delimiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFormat {
    delimiter: char,
}

impl Default for RecordFormat {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl RecordFormat {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Parse the leading id field, if it is numeric
    ///
    /// Used to match a line to a key without requiring the rest of the
    /// line to be well formed.
    pub fn leading_id(&self, line: &str) -> Option<i64> {
        line.split(self.delimiter).next()?.trim().parse().ok()
    }

    // ==================== Entities ====================

    pub fn encode_entity<E: MediaEntity>(&self, entity: &E) -> StoreResult<String> {
        check_single_line("title", entity.title())?;
        let (first, second) = entity.attributes();
        let d = self.delimiter;
        Ok(format!(
            "{}{d}{}{d}{}{d}{}",
            entity.id(),
            first,
            second,
            entity.title()
        ))
    }

    pub fn decode_entity<E: MediaEntity>(&self, line: &str) -> Result<E, String> {
        let mut fields = line.splitn(4, self.delimiter);
        let id = parse_number(fields.next(), "id")?;
        let first = parse_number(fields.next(), "first attribute")?;
        let second = parse_number(fields.next(), "second attribute")?;
        let title = fields
            .next()
            .ok_or_else(|| "too few fields, expected 4".to_string())?;
        Ok(E::from_parts(id, first, second, title.to_string()))
    }

    // ==================== Lists ====================

    pub fn encode_list(&self, list: &ListRecord) -> StoreResult<String> {
        check_single_line("name", &list.name)?;
        check_single_line("owner", &list.owner)?;
        if list.owner.trim().is_empty() {
            return Err(StoreError::InvalidField {
                field: "owner",
                details: "must not be empty".to_string(),
            });
        }
        if list.owner.contains(self.delimiter) {
            return Err(StoreError::InvalidField {
                field: "owner",
                details: format!("must not contain '{}'", self.delimiter),
            });
        }
        let d = self.delimiter;
        Ok(format!("{}{d}{}{d}{}", list.id, list.name, list.owner))
    }

    pub fn decode_list(&self, line: &str) -> Result<ListRecord, String> {
        let (id_field, rest) = line
            .split_once(self.delimiter)
            .ok_or_else(|| "too few fields, expected 3".to_string())?;
        let (name, owner) = rest
            .rsplit_once(self.delimiter)
            .ok_or_else(|| "too few fields, expected 3".to_string())?;
        let id = parse_number(Some(id_field), "id")?;
        if owner.trim().is_empty() {
            return Err("empty owner".to_string());
        }
        Ok(ListRecord {
            id,
            name: name.to_string(),
            owner: owner.to_string(),
        })
    }

    // ==================== Memberships ====================

    pub fn encode_membership(&self, list_id: i64, entity_id: i64) -> String {
        format!("{}{}{}", list_id, self.delimiter, entity_id)
    }

    pub fn decode_membership(&self, line: &str) -> Result<(i64, i64), String> {
        let mut fields = line.split(self.delimiter);
        let list_id = parse_number(fields.next(), "list id")?;
        let entity_id = parse_number(fields.next(), "entity id")?;
        if fields.next().is_some() {
            return Err("too many fields, expected 2".to_string());
        }
        Ok((list_id, entity_id))
    }
}

fn parse_number(field: Option<&str>, name: &str) -> Result<i64, String> {
    let raw = field.ok_or_else(|| format!("missing {}", name))?;
    raw.trim()
        .parse()
        .map_err(|_| format!("non-numeric {} '{}'", name, raw.trim()))
}

fn check_single_line(field: &'static str, value: &str) -> StoreResult<()> {
    if value.contains('\n') || value.contains('\r') {
        return Err(StoreError::InvalidField {
            field,
            details: "must not contain line breaks".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Anime, Movie};

    #[test]
    fn test_entity_line_layout() {
        let format = RecordFormat::default();
        let movie = Movie::new(42, "Film A", 120).with_release_year(2001);

        let line = format.encode_entity(&movie).unwrap();
        assert_eq!(line, "42,120,2001,Film A");
        assert_eq!(format.decode_entity::<Movie>(&line).unwrap(), movie);
    }

    #[test]
    fn test_title_may_contain_delimiter() {
        let format = RecordFormat::default();
        let anime = Anime::new(5, "Yes, Prime Minister, Again", 12);

        let line = format.encode_entity(&anime).unwrap();
        assert_eq!(format.decode_entity::<Anime>(&line).unwrap(), anime);
    }

    #[test]
    fn test_entity_decode_errors() {
        let format = RecordFormat::default();
        assert!(format.decode_entity::<Movie>("42,120,2001").is_err());
        assert!(format.decode_entity::<Movie>("x,120,2001,T").is_err());
        assert!(format.decode_entity::<Movie>("42,long,2001,T").is_err());
    }

    #[test]
    fn test_entity_rejects_newline_in_title() {
        let format = RecordFormat::default();
        let err = format
            .encode_entity(&Movie::new(1, "two\nlines", 90))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidField { field: "title", .. }));
    }

    #[test]
    fn test_list_name_may_contain_delimiter() {
        let format = RecordFormat::default();
        let list = ListRecord::new(1, "Sci-fi, horror, misc", "alice");

        let line = format.encode_list(&list).unwrap();
        assert_eq!(line, "1,Sci-fi, horror, misc,alice");
        assert_eq!(format.decode_list(&line).unwrap(), list);
    }

    #[test]
    fn test_list_owner_validation() {
        let format = RecordFormat::default();
        assert!(format.encode_list(&ListRecord::new(1, "A", "")).is_err());
        assert!(format.encode_list(&ListRecord::new(1, "A", "a,b")).is_err());
        assert!(format.decode_list("1,A").is_err());
        assert!(format.decode_list("one,A,alice").is_err());
    }

    #[test]
    fn test_membership_lines() {
        let format = RecordFormat::new(';');
        assert_eq!(format.encode_membership(1, 42), "1;42");
        assert_eq!(format.decode_membership(" 1 ; 42 ").unwrap(), (1, 42));
        assert!(format.decode_membership("1").is_err());
        assert!(format.decode_membership("1;2;3").is_err());
    }

    #[test]
    fn test_leading_id() {
        let format = RecordFormat::default();
        assert_eq!(format.leading_id("42,garbage"), Some(42));
        assert_eq!(format.leading_id("nope,1"), None);
    }
}
